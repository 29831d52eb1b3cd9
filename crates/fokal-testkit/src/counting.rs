//! Call-counting store wrappers
//!
//! Used to assert how many store primitives an operation issued, including
//! that a rejected request issued none.

use async_trait::async_trait;
use fokal_core::effects::{AssociationStore, Record, RecordStore, SetUpdate};
use fokal_core::{Ref, StoreError};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fast store wrapper that counts every call
#[derive(Debug, Clone)]
pub struct CountingAssociationStore<S> {
    inner: S,
    calls: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl<S> CountingAssociationStore<S> {
    /// Wrap `inner` with zeroed counters
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Arc::default(),
            writes: Arc::default(),
        }
    }

    /// The wrapped store, for seeding without counting
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Calls of any primitive
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls of mutating primitives
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn read(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: AssociationStore> AssociationStore for CountingAssociationStore<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.read();
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.write();
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.write();
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.read();
        self.inner.exists(key).await
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.write();
        self.inner.set_add(key, member).await
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.write();
        self.inner.set_remove(key, member).await
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.read();
        self.inner.set_contains(key, member).await
    }

    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>, StoreError> {
        self.read();
        self.inner.set_members(key).await
    }
}

/// Record store wrapper that counts every call
#[derive(Debug, Clone)]
pub struct CountingRecordStore<S> {
    inner: S,
    calls: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl<S> CountingRecordStore<S> {
    /// Wrap `inner` with zeroed counters
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Arc::default(),
            writes: Arc::default(),
        }
    }

    /// The wrapped store, for seeding without counting
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Calls of any primitive
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls of mutating primitives
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn read(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn write(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for CountingRecordStore<S> {
    async fn get(&self, reference: &Ref) -> Result<Option<Record>, StoreError> {
        self.read();
        self.inner.get(reference).await
    }

    async fn put(&self, record: Record) -> Result<(), StoreError> {
        self.write();
        self.inner.put(record).await
    }

    async fn delete(&self, reference: &Ref) -> Result<bool, StoreError> {
        self.write();
        self.inner.delete(reference).await
    }

    async fn exists(&self, reference: &Ref) -> Result<bool, StoreError> {
        self.read();
        self.inner.exists(reference).await
    }

    async fn update_tags(&self, reference: &Ref, update: SetUpdate) -> Result<bool, StoreError> {
        self.write();
        self.inner.update_tags(reference, update).await
    }
}
