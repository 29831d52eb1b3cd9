//! Tag set mutator
//!
//! Tags live on the authoritative record. Additions and removals for one call
//! travel in a single `update_tags` request, so the record-level update is
//! atomic even though link batches are not.

use fokal_core::effects::{RecordStore, SetUpdate};
use fokal_core::{Deadline, Ref, StoreError};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Direction of a tag update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOp {
    /// Union the tags into the set
    Add,
    /// Subtract the tags from the set
    Remove,
}

impl fmt::Display for TagOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagOp::Add => f.write_str("add"),
            TagOp::Remove => f.write_str("remove"),
        }
    }
}

/// Maintains the tag set on authoritative records
#[derive(Clone)]
pub struct TagSet {
    store: Arc<dyn RecordStore>,
}

impl TagSet {
    /// Create a mutator over `store`
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Union `additions` into and subtract `removals` from the target's tags
    ///
    /// Returns `false` when the record was absent and nothing was written.
    pub async fn apply(
        &self,
        target: &Ref,
        additions: BTreeSet<String>,
        removals: BTreeSet<String>,
        deadline: Deadline,
    ) -> Result<bool, StoreError> {
        let update = SetUpdate {
            add: additions,
            remove: removals,
        };
        let (adding, removing) = (update.add.len(), update.remove.len());
        let found = deadline
            .bound("update_tags", self.store.update_tags(target, update))
            .await?;
        debug!(%target, adding, removing, found, "tag update sent");
        Ok(found)
    }

    /// Apply `tags` in one direction
    pub async fn update(
        &self,
        target: &Ref,
        op: TagOp,
        tags: BTreeSet<String>,
        deadline: Deadline,
    ) -> Result<bool, StoreError> {
        match op {
            TagOp::Add => self.apply(target, tags, BTreeSet::new(), deadline).await,
            TagOp::Remove => self.apply(target, BTreeSet::new(), tags, deadline).await,
        }
    }

    /// Current tags of the target, or `None` when it has no record
    pub async fn tags(
        &self,
        target: &Ref,
        deadline: Deadline,
    ) -> Result<Option<BTreeSet<String>>, StoreError> {
        let record = deadline.bound("get", self.store.get(target)).await?;
        Ok(record.map(|record| record.tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fokal_core::effects::Record;
    use fokal_effects::MemoryRecordStore;
    use fokal_testkit::CountingRecordStore;
    use std::time::Duration;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(5))
    }

    fn tags(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn duplicate_additions_collapse() {
        let store = MemoryRecordStore::new();
        let image = Ref::image("abcdefghijkl");
        store
            .put(Record::new(image.clone()).with_tags(["ocean"]))
            .await
            .unwrap();
        let tag_set = TagSet::new(Arc::new(store));

        tag_set
            .apply(&image, tags(&["sunset", "sunset"]), BTreeSet::new(), deadline())
            .await
            .unwrap();
        tag_set
            .apply(&image, tags(&["sunset"]), BTreeSet::new(), deadline())
            .await
            .unwrap();

        assert_eq!(
            tag_set.tags(&image, deadline()).await.unwrap(),
            Some(tags(&["ocean", "sunset"]))
        );
    }

    #[tokio::test]
    async fn removing_absent_tag_is_noop() {
        let store = MemoryRecordStore::new();
        let image = Ref::image("abcdefghijkl");
        store
            .put(Record::new(image.clone()).with_tags(["ocean"]))
            .await
            .unwrap();
        let tag_set = TagSet::new(Arc::new(store));

        assert!(tag_set
            .apply(&image, BTreeSet::new(), tags(&["forest"]), deadline())
            .await
            .unwrap());
        assert_eq!(
            tag_set.tags(&image, deadline()).await.unwrap(),
            Some(tags(&["ocean"]))
        );
    }

    #[tokio::test]
    async fn one_store_request_per_call() {
        let store = CountingRecordStore::new(MemoryRecordStore::new());
        let image = Ref::image("abcdefghijkl");
        store.inner().put(Record::new(image.clone())).await.unwrap();
        let tag_set = TagSet::new(Arc::new(store.clone()));

        tag_set
            .apply(&image, tags(&["a", "b", "c"]), tags(&["d", "e"]), deadline())
            .await
            .unwrap();
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn update_follows_direction() {
        let store = MemoryRecordStore::new();
        let image = Ref::image("abcdefghijkl");
        store
            .put(Record::new(image.clone()).with_tags(["ocean"]))
            .await
            .unwrap();
        let tag_set = TagSet::new(Arc::new(store));

        assert!(tag_set
            .update(&image, TagOp::Add, tags(&["dusk"]), deadline())
            .await
            .unwrap());
        assert!(tag_set
            .update(&image, TagOp::Remove, tags(&["ocean"]), deadline())
            .await
            .unwrap());
        assert_eq!(
            tag_set.tags(&image, deadline()).await.unwrap(),
            Some(tags(&["dusk"]))
        );
        assert_eq!(TagOp::Remove.to_string(), "remove");
    }

    #[tokio::test]
    async fn missing_record_reports_false() {
        let tag_set = TagSet::new(Arc::new(MemoryRecordStore::new()));
        assert!(!tag_set
            .apply(&Ref::image("abcdefghijkl"), tags(&["x"]), BTreeSet::new(), deadline())
            .await
            .unwrap());
    }
}
