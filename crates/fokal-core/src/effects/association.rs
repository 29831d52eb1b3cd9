//! Fast key/association store effects
//!
//! Backs existence markers, ownership and ACL sets, and collection link sets.
//! Every method is a single primitive: implementations must apply each one
//! atomically so concurrent callers on the same key never lose an update.

use crate::errors::StoreError;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Key/value and key/set primitives of the fast store
#[async_trait]
pub trait AssociationStore: Send + Sync {
    /// Read a scalar value
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a scalar value, replacing any previous one
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove a key of any kind; returns whether it was present
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Whether a key of any kind is present
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Insert `member` into the set at `key`; returns whether it was newly added
    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Remove `member` from the set at `key`; returns whether it was present
    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Whether `member` belongs to the set at `key`
    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// All members of the set at `key`; empty when the key is absent
    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>, StoreError>;
}
