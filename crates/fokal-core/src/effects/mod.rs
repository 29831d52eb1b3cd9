//! Store effect traits
//!
//! The core never holds a global store handle. Both stores are injected as
//! trait objects so production backends and in-memory handlers are
//! interchangeable. The two stores share no transaction boundary.

pub mod association;
pub mod record;

pub use association::AssociationStore;
pub use record::{Record, RecordStore, SetUpdate};
