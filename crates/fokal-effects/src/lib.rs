//! # Fokal Effects - Store Handlers
//!
//! Implementations of the `fokal-core` store effect traits. The in-memory
//! handlers back the operator CLI and every test suite; production backends
//! implement the same traits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Store handlers
pub mod storage;

pub use storage::{MemoryAssociationStore, MemoryRecordStore};
