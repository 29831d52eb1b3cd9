//! # Fokal Authorization
//!
//! Permission and existence oracles. Each comes in two flavours, one per
//! backing store, so a call site can check against the same store its
//! mutation will write to.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod existence;
pub mod permission;

pub use existence::{AssociationExistence, ExistenceOracle, RecordExistence};
pub use permission::{
    AccessDecision, AssociationPermissions, GrantBasis, PermissionOracle, RecordPermissions,
};
