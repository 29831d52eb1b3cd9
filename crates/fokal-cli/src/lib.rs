//! Operator tooling for the Fokal mutation core
//!
//! Scenario replay against in-memory stores and configuration loading for the
//! `fokal` binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod scenario;

pub use config::load_config;
pub use scenario::{replay, ReplayLine, Scenario, ScenarioRequest, SeedRecord};
