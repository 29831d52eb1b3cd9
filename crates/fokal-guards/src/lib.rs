#![deny(clippy::await_holding_lock)]
//! # Fokal Guards - Mutation Pipeline
//!
//! Gate chain orchestration: reference and body validation, authorization,
//! existence, then the mutation. Provides the operations boundary
//! collaborators call.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chain;
pub mod pipeline;
pub mod request;

pub use chain::{GateStage, GuardChain};
pub use pipeline::MutationPipeline;
pub use request::{LinkChanges, LinkChangesBody, RequestError, TagsBody};
