//! In-memory store handlers
//!
//! Each primitive takes the write lock exactly once, so a set-add or a record
//! set-update is indivisible with respect to every other caller.

use async_trait::async_trait;
use fokal_core::effects::{AssociationStore, Record, RecordStore, SetUpdate};
use fokal_core::{Ref, StoreError};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct AssociationData {
    scalars: HashMap<String, String>,
    sets: HashMap<String, BTreeSet<String>>,
}

/// In-memory fast store
#[derive(Debug, Clone, Default)]
pub struct MemoryAssociationStore {
    data: Arc<RwLock<AssociationData>>,
}

impl MemoryAssociationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys of either kind
    pub async fn key_count(&self) -> usize {
        let data = self.data.read().await;
        data.scalars.len() + data.sets.len()
    }
}

fn check_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            reason: "Key cannot be empty".to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl AssociationStore for MemoryAssociationStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        check_key(key)?;
        let data = self.data.read().await;
        Ok(data.scalars.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        check_key(key)?;
        let mut data = self.data.write().await;
        data.scalars.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        check_key(key)?;
        let mut data = self.data.write().await;
        let scalar = data.scalars.remove(key).is_some();
        let set = data.sets.remove(key).is_some();
        Ok(scalar || set)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        check_key(key)?;
        let data = self.data.read().await;
        Ok(data.scalars.contains_key(key) || data.sets.contains_key(key))
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        check_key(key)?;
        let mut data = self.data.write().await;
        Ok(data
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        check_key(key)?;
        let mut data = self.data.write().await;
        let Some(set) = data.sets.get_mut(key) else {
            return Ok(false);
        };
        let removed = set.remove(member);
        if set.is_empty() {
            data.sets.remove(key);
        }
        Ok(removed)
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        check_key(key)?;
        let data = self.data.read().await;
        Ok(data.sets.get(key).is_some_and(|set| set.contains(member)))
    }

    async fn set_members(&self, key: &str) -> Result<BTreeSet<String>, StoreError> {
        check_key(key)?;
        let data = self.data.read().await;
        Ok(data.sets.get(key).cloned().unwrap_or_default())
    }
}

/// In-memory authoritative record store
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<RwLock<HashMap<Ref, Record>>>,
}

impl MemoryRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, reference: &Ref) -> Result<Option<Record>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(reference).cloned())
    }

    async fn put(&self, record: Record) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(record.reference.clone(), record);
        Ok(())
    }

    async fn delete(&self, reference: &Ref) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        Ok(records.remove(reference).is_some())
    }

    async fn exists(&self, reference: &Ref) -> Result<bool, StoreError> {
        let records = self.records.read().await;
        Ok(records.contains_key(reference))
    }

    async fn update_tags(&self, reference: &Ref, update: SetUpdate) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(reference) else {
            return Ok(false);
        };
        update.apply_to(&mut record.tags);
        tracing::trace!(%reference, tags = record.tags.len(), "tag set updated");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;

    #[tokio::test]
    async fn set_add_is_idempotent() {
        let store = MemoryAssociationStore::new();
        assert!(store.set_add("k", "a").await.unwrap());
        assert!(!store.set_add("k", "a").await.unwrap());
        assert_eq!(store.set_members("k").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn set_remove_absent_is_noop() {
        let store = MemoryAssociationStore::new();
        assert!(!store.set_remove("k", "a").await.unwrap());
        store.set_add("k", "a").await.unwrap();
        assert!(store.set_remove("k", "a").await.unwrap());
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn scalars_and_sets_share_existence() {
        let store = MemoryAssociationStore::new();
        store.set("marker:images/abcdefghijkl", "users/ana".into()).await.unwrap();
        store.set_add("links:collections/1", "images/abcdefghijkl").await.unwrap();
        assert_eq!(store.key_count().await, 2);
        assert!(store.exists("marker:images/abcdefghijkl").await.unwrap());
        assert_eq!(
            store.get("marker:images/abcdefghijkl").await.unwrap().as_deref(),
            Some("users/ana")
        );
        assert!(store.delete("marker:images/abcdefghijkl").await.unwrap());
        assert!(!store.delete("marker:images/abcdefghijkl").await.unwrap());
        assert!(store.delete("links:collections/1").await.unwrap());
        assert_eq!(store.key_count().await, 0);
    }

    #[tokio::test]
    async fn empty_key_is_rejected() {
        let store = MemoryAssociationStore::new();
        assert!(matches!(
            store.set_add("", "a").await,
            Err(StoreError::InvalidKey { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_adds_do_not_lose_updates() {
        let store = MemoryAssociationStore::new();
        let adds = (0..64).map(|i| {
            let store = store.clone();
            async move { store.set_add("links:collections/1", &format!("m{i}")).await }
        });
        for result in join_all(adds).await {
            result.unwrap();
        }
        assert_eq!(
            store.set_members("links:collections/1").await.unwrap().len(),
            64
        );
    }

    #[tokio::test]
    async fn update_tags_on_missing_record_writes_nothing() {
        let store = MemoryRecordStore::new();
        let update = SetUpdate {
            add: ["x".to_string()].into(),
            remove: BTreeSet::new(),
        };
        assert!(!store
            .update_tags(&Ref::image("abcdefghijkl"), update)
            .await
            .unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_tag_updates_compose() {
        let store = MemoryRecordStore::new();
        let image = Ref::image("abcdefghijkl");
        store.put(Record::new(image.clone())).await.unwrap();

        let updates = (0..32).map(|i| {
            let store = store.clone();
            let image = image.clone();
            async move {
                let update = SetUpdate {
                    add: [format!("t{i}")].into(),
                    remove: BTreeSet::new(),
                };
                store.update_tags(&image, update).await
            }
        });
        for result in join_all(updates).await {
            assert!(result.unwrap());
        }
        let record = store.get(&image).await.unwrap().unwrap();
        assert_eq!(record.tags.len(), 32);
    }
}
