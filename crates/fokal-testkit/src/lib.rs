//! Fokal Testing Infrastructure
//!
//! Store wrappers that inject faults or count calls, seeded fixtures over the
//! in-memory handlers, and proptest strategies.
//!
//! ```toml
//! [dev-dependencies]
//! fokal-testkit = { path = "../fokal-testkit" }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod counting;
pub mod faults;
pub mod fixtures;
pub mod strategies;

pub use counting::{CountingAssociationStore, CountingRecordStore};
pub use faults::{FaultyAssociationStore, FaultyRecordStore, Primitive};
pub use fixtures::{actor, link_set, Fixture};
