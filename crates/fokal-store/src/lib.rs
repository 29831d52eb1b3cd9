//! # Fokal Store - Set Mutators
//!
//! - `links`: collection ↔ member associations in the fast store, applied as
//!   independent atomic upserts and deletes
//! - `tags`: free-text tag sets on authoritative records, applied as one
//!   atomic set update per call
//!
//! Neither mutator checks permission or existence. That is the pipeline's job.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod links;
pub mod tags;

pub use links::{LinkError, LinkGraph, LinkOp, LinkReport};
pub use tags::{TagOp, TagSet};
