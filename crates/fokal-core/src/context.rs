//! Per-request context: the authenticated actor and the store-call deadline

use crate::config::FokalConfig;
use crate::errors::StoreError;
use crate::reference::Actor;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Absolute deadline shared by every store call made for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    /// Deadline `budget` from now
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    /// Deadline at an explicit instant
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// The underlying instant
    pub fn instant(&self) -> Instant {
        self.0
    }

    /// Run one store primitive under this deadline
    ///
    /// An elapsed deadline becomes [`StoreError::Timeout`] naming `operation`.
    /// The primitive is dropped, never retried.
    pub async fn bound<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout_at(self.0, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::timeout(operation)),
        }
    }
}

/// Authenticated actor plus deadline for one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Who is asking
    pub actor: Actor,
    /// When store calls must give up
    pub deadline: Deadline,
}

impl RequestContext {
    /// Context with an explicit deadline
    pub fn new(actor: Actor, deadline: Deadline) -> Self {
        Self { actor, deadline }
    }

    /// Context whose deadline is the configured budget from now
    pub fn from_config(actor: Actor, config: &FokalConfig) -> Self {
        Self::new(actor, Deadline::after(config.store_deadline()))
    }
}
