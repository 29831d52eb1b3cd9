//! # Fokal Core - Foundation
//!
//! Types shared by every layer of the mutation core:
//!
//! - **References**: typed `(CollectionType, id)` identifiers with pure validation
//! - **Capabilities**: `CanView` / `CanEdit` / `CanDelete`
//! - **Outcomes**: the five rejection kinds and their status classes
//! - **Effects**: async traits for the fast association store and the
//!   authoritative record store
//! - **Config**: deadlines, link ordering and body limits
//!
//! ## What's NOT in this crate
//!
//! - Permission and existence resolution (`fokal-authorization`)
//! - Link and tag mutation (`fokal-store`)
//! - Store handlers (`fokal-effects`)
//! - The gated pipeline (`fokal-guards`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capability;
pub mod config;
pub mod context;
pub mod effects;
pub mod errors;
pub mod keys;
pub mod outcome;
pub mod reference;

pub use capability::Capability;
pub use config::{ConfigMerge, ConfigValidation, FokalConfig, LinkOrder};
pub use context::{Deadline, RequestContext};
pub use effects::{AssociationStore, Record, RecordStore, SetUpdate};
pub use errors::{BodyError, FokalError, ReferenceError, StoreError};
pub use outcome::{Outcome, OutcomeStatus, Rejection, StatusClass};
pub use reference::{Actor, CollectionType, Ref};
