//! Fault-injecting store wrappers
//!
//! Wrap an in-memory handler and make chosen primitives fail or stall. A
//! failing primitive never reaches the inner store, so state is unchanged by
//! the failed call.

use async_trait::async_trait;
use fokal_core::effects::{AssociationStore, Record, RecordStore, SetUpdate};
use fokal_core::{Ref, StoreError};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Store primitive selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Scalar or record read
    Get,
    /// Scalar write
    Set,
    /// Record write
    Put,
    /// Key or record delete
    Delete,
    /// Existence check
    Exists,
    /// Set insert
    SetAdd,
    /// Set delete
    SetRemove,
    /// Set membership
    SetContains,
    /// Set listing
    SetMembers,
    /// Record tag update
    UpdateTags,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    FailAfter(usize),
    Delay(Duration),
}

#[derive(Debug, Default)]
struct FaultPlan {
    faults: HashMap<Primitive, Fault>,
    seen: HashMap<Primitive, usize>,
}

impl FaultPlan {
    /// Returns the delay to apply, or the error to return instead of calling through
    fn check(&mut self, primitive: Primitive) -> Result<Option<Duration>, StoreError> {
        let seen = self.seen.entry(primitive).or_default();
        *seen += 1;
        match self.faults.get(&primitive) {
            Some(Fault::FailAfter(allowed)) if *seen > *allowed => Err(StoreError::Unavailable(
                format!("injected {primitive:?} failure"),
            )),
            Some(Fault::Delay(delay)) => Ok(Some(*delay)),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Faults(Arc<Mutex<FaultPlan>>);

impl Faults {
    fn set(&self, primitive: Primitive, fault: Fault) {
        self.0.lock().faults.insert(primitive, fault);
    }

    fn clear(&self) {
        self.0.lock().faults.clear();
    }

    async fn gate(&self, primitive: Primitive) -> Result<(), StoreError> {
        let delay = self.0.lock().check(primitive)?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

macro_rules! fault_builders {
    () => {
        /// Fail every call of `primitive`
        pub fn fail(self, primitive: Primitive) -> Self {
            self.fail_after(primitive, 0)
        }

        /// Let `allowed` calls of `primitive` through, then fail the rest
        pub fn fail_after(self, primitive: Primitive, allowed: usize) -> Self {
            self.faults.set(primitive, Fault::FailAfter(allowed));
            self
        }

        /// Stall every call of `primitive` by `delay` before calling through
        pub fn delay(self, primitive: Primitive, delay: Duration) -> Self {
            self.faults.set(primitive, Fault::Delay(delay));
            self
        }

        /// Remove every injected fault
        pub fn heal(&self) {
            self.faults.clear();
        }
    };
}

/// Fast store wrapper with injectable faults
#[derive(Debug, Clone)]
pub struct FaultyAssociationStore<S> {
    inner: S,
    faults: Faults,
}

impl<S: AssociationStore> FaultyAssociationStore<S> {
    /// Wrap `inner` with no faults
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Faults::default(),
        }
    }

    fault_builders!();
}

#[async_trait]
impl<S: AssociationStore> AssociationStore for FaultyAssociationStore<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.faults.gate(Primitive::Get).await?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.faults.gate(Primitive::Set).await?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.faults.gate(Primitive::Delete).await?;
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.faults.gate(Primitive::Exists).await?;
        self.inner.exists(key).await
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.faults.gate(Primitive::SetAdd).await?;
        self.inner.set_add(key, member).await
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.faults.gate(Primitive::SetRemove).await?;
        self.inner.set_remove(key, member).await
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.faults.gate(Primitive::SetContains).await?;
        self.inner.set_contains(key, member).await
    }

    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>, StoreError> {
        self.faults.gate(Primitive::SetMembers).await?;
        self.inner.set_members(key).await
    }
}

/// Record store wrapper with injectable faults
#[derive(Debug, Clone)]
pub struct FaultyRecordStore<S> {
    inner: S,
    faults: Faults,
}

impl<S: RecordStore> FaultyRecordStore<S> {
    /// Wrap `inner` with no faults
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Faults::default(),
        }
    }

    fault_builders!();
}

#[async_trait]
impl<S: RecordStore> RecordStore for FaultyRecordStore<S> {
    async fn get(&self, reference: &Ref) -> Result<Option<Record>, StoreError> {
        self.faults.gate(Primitive::Get).await?;
        self.inner.get(reference).await
    }

    async fn put(&self, record: Record) -> Result<(), StoreError> {
        self.faults.gate(Primitive::Put).await?;
        self.inner.put(record).await
    }

    async fn delete(&self, reference: &Ref) -> Result<bool, StoreError> {
        self.faults.gate(Primitive::Delete).await?;
        self.inner.delete(reference).await
    }

    async fn exists(&self, reference: &Ref) -> Result<bool, StoreError> {
        self.faults.gate(Primitive::Exists).await?;
        self.inner.exists(reference).await
    }

    async fn update_tags(&self, reference: &Ref, update: SetUpdate) -> Result<bool, StoreError> {
        self.faults.gate(Primitive::UpdateTags).await?;
        self.inner.update_tags(reference, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fokal_effects::{MemoryAssociationStore, MemoryRecordStore};

    #[tokio::test]
    async fn fail_after_lets_calls_through_then_fails() {
        let store = FaultyAssociationStore::new(MemoryAssociationStore::new())
            .fail_after(Primitive::SetAdd, 2);
        assert!(store.set_add("k", "a").await.is_ok());
        assert!(store.set_add("k", "b").await.is_ok());
        assert!(store.set_add("k", "c").await.is_err());
        assert_eq!(store.set_members("k").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_delete_leaves_record() {
        let store = FaultyRecordStore::new(MemoryRecordStore::new()).fail(Primitive::Delete);
        let image = Ref::image("abcdefghijkl");
        store.put(Record::new(image.clone())).await.unwrap();
        assert!(store.delete(&image).await.is_err());
        assert!(store.exists(&image).await.unwrap());

        store.heal();
        assert!(store.delete(&image).await.unwrap());
    }
}
