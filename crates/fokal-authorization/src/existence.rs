//! Existence oracle
//!
//! Confirms that a reference currently denotes a live resource. Each
//! implementation reads the same store the corresponding mutation writes to.
//! The pipeline only consults it after permission has been granted.

use async_trait::async_trait;
use fokal_core::effects::{AssociationStore, RecordStore};
use fokal_core::{keys, Deadline, Ref, StoreError};
use std::sync::Arc;

/// Confirms a reference denotes a live resource
#[async_trait]
pub trait ExistenceOracle: Send + Sync {
    /// Whether `target` currently exists
    async fn exists(&self, target: &Ref, deadline: Deadline) -> Result<bool, StoreError>;
}

/// Existence by marker key in the fast store
#[derive(Clone)]
pub struct AssociationExistence {
    store: Arc<dyn AssociationStore>,
}

impl AssociationExistence {
    /// Create an oracle over `store`
    pub fn new(store: Arc<dyn AssociationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ExistenceOracle for AssociationExistence {
    async fn exists(&self, target: &Ref, deadline: Deadline) -> Result<bool, StoreError> {
        deadline
            .bound("exists", self.store.exists(&keys::marker(target)))
            .await
    }
}

/// Existence by record in the authoritative store
#[derive(Clone)]
pub struct RecordExistence {
    store: Arc<dyn RecordStore>,
}

impl RecordExistence {
    /// Create an oracle over `store`
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ExistenceOracle for RecordExistence {
    async fn exists(&self, target: &Ref, deadline: Deadline) -> Result<bool, StoreError> {
        deadline.bound("exists", self.store.exists(target)).await
    }
}
