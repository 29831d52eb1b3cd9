//! Link graph mutator
//!
//! A collection's members are a set in the fast store: duplicates collapse
//! and order is irrelevant. Every link write is one atomic store primitive
//! (`set_add` / `set_remove`), never a read-modify-write, so concurrent
//! batches on the same collection interleave without losing updates.
//!
//! A batch is at-least-applied, not all-or-nothing. On the first failing
//! write the batch stops and reports the error; earlier writes stay.

use fokal_core::effects::AssociationStore;
use fokal_core::{keys, Deadline, LinkOrder, Ref, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Direction of a single link write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkOp {
    /// Upsert the member into the set
    Add,
    /// Delete the member from the set
    Remove,
}

impl fmt::Display for LinkOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkOp::Add => f.write_str("add"),
            LinkOp::Remove => f.write_str("remove"),
        }
    }
}

/// Counts for an applied batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReport {
    /// Members that were newly inserted
    pub added: usize,
    /// Members that were present and removed
    pub removed: usize,
    /// Writes that found the set already in the requested state
    pub unchanged: usize,
}

impl LinkReport {
    /// Total writes issued
    pub fn writes(&self) -> usize {
        self.added + self.removed + self.unchanged
    }

    fn record(&mut self, op: LinkOp, changed: bool) {
        match (op, changed) {
            (LinkOp::Add, true) => self.added += 1,
            (LinkOp::Remove, true) => self.removed += 1,
            (_, false) => self.unchanged += 1,
        }
    }
}

/// A batch stopped on a failing write
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("link {op} of {member} failed after {} writes: {source}", .applied.writes())]
pub struct LinkError {
    /// The write that failed
    pub op: LinkOp,
    /// Member of that write
    pub member: Ref,
    /// Writes that succeeded before the failure and remain applied
    pub applied: LinkReport,
    /// Underlying store error
    #[source]
    pub source: StoreError,
}

/// Maintains collection ↔ member associations in the fast store
#[derive(Clone)]
pub struct LinkGraph {
    store: Arc<dyn AssociationStore>,
    order: LinkOrder,
}

impl LinkGraph {
    /// Create a mutator over `store` applying batches in `order`
    pub fn new(store: Arc<dyn AssociationStore>, order: LinkOrder) -> Self {
        Self { store, order }
    }

    /// Apply one link write; returns whether the set changed
    pub async fn link(
        &self,
        collection: &Ref,
        member: &Ref,
        op: LinkOp,
        deadline: Deadline,
    ) -> Result<bool, StoreError> {
        let key = keys::links(collection);
        let member = member.to_string();
        match op {
            LinkOp::Add => deadline.bound("set_add", self.store.set_add(&key, &member)).await,
            LinkOp::Remove => {
                deadline
                    .bound("set_remove", self.store.set_remove(&key, &member))
                    .await
            }
        }
    }

    /// Apply a batch of additions and removals in the configured order
    ///
    /// Adding a present member and removing an absent one are no-ops. A
    /// member listed in both ends absent under `AddThenRemove` and present
    /// under `RemoveThenAdd`.
    pub async fn apply(
        &self,
        collection: &Ref,
        additions: &BTreeSet<Ref>,
        removals: &BTreeSet<Ref>,
        deadline: Deadline,
    ) -> Result<LinkReport, LinkError> {
        let passes = match self.order {
            LinkOrder::AddThenRemove => [(LinkOp::Add, additions), (LinkOp::Remove, removals)],
            LinkOrder::RemoveThenAdd => [(LinkOp::Remove, removals), (LinkOp::Add, additions)],
        };

        let mut report = LinkReport::default();
        for (op, members) in passes {
            for member in members {
                match self.link(collection, member, op, deadline).await {
                    Ok(changed) => report.record(op, changed),
                    Err(source) => {
                        warn!(
                            %collection,
                            %member,
                            %op,
                            applied = report.writes(),
                            error = %source,
                            "link batch stopped on store failure"
                        );
                        return Err(LinkError {
                            op,
                            member: member.clone(),
                            applied: report,
                            source,
                        });
                    }
                }
            }
        }

        debug!(
            %collection,
            added = report.added,
            removed = report.removed,
            unchanged = report.unchanged,
            "link batch applied"
        );
        Ok(report)
    }

    /// Current members of a collection
    ///
    /// Entries that no longer parse as references are skipped with a warning.
    pub async fn members(
        &self,
        collection: &Ref,
        deadline: Deadline,
    ) -> Result<BTreeSet<Ref>, StoreError> {
        let raw = deadline
            .bound("set_members", self.store.set_members(&keys::links(collection)))
            .await?;
        Ok(raw
            .iter()
            .filter_map(|entry| match Ref::parse(entry) {
                Ok(member) => Some(member),
                Err(error) => {
                    warn!(%collection, %entry, %error, "skipping unparseable link entry");
                    None
                }
            })
            .collect())
    }

    /// Drop a collection's whole link set; returns whether it existed
    pub async fn clear(&self, collection: &Ref, deadline: Deadline) -> Result<bool, StoreError> {
        deadline
            .bound("delete", self.store.delete(&keys::links(collection)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use fokal_effects::MemoryAssociationStore;
    use fokal_testkit::{FaultyAssociationStore, Primitive};
    use std::time::Duration;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(5))
    }

    fn img(id: &str) -> Ref {
        Ref::image(id)
    }

    fn set(refs: &[&str]) -> BTreeSet<Ref> {
        refs.iter().map(|id| img(id)).collect()
    }

    #[tokio::test]
    async fn add_twice_equals_add_once() {
        let graph = LinkGraph::new(Arc::new(MemoryAssociationStore::new()), LinkOrder::default());
        let album = Ref::collection("1");
        let members = set(&["aaaaaaaaaaaa"]);

        graph
            .apply(&album, &members, &BTreeSet::new(), deadline())
            .await
            .unwrap();
        let second = graph
            .apply(&album, &members, &BTreeSet::new(), deadline())
            .await
            .unwrap();

        assert_eq!(second.unchanged, 1);
        assert_eq!(graph.members(&album, deadline()).await.unwrap(), members);
    }

    #[tokio::test]
    async fn removing_absent_member_succeeds() {
        let graph = LinkGraph::new(Arc::new(MemoryAssociationStore::new()), LinkOrder::default());
        let report = graph
            .apply(
                &Ref::collection("1"),
                &BTreeSet::new(),
                &set(&["zzzzzzzzzzzz"]),
                deadline(),
            )
            .await
            .unwrap();
        assert_eq!(report.removed, 0);
        assert_eq!(report.unchanged, 1);
    }

    #[tokio::test]
    async fn member_in_both_lists_follows_order() {
        let both = set(&["bbbbbbbbbbbb"]);
        let album = Ref::collection("2");

        let graph = LinkGraph::new(Arc::new(MemoryAssociationStore::new()), LinkOrder::AddThenRemove);
        graph.apply(&album, &both, &both, deadline()).await.unwrap();
        assert!(graph.members(&album, deadline()).await.unwrap().is_empty());

        let graph = LinkGraph::new(Arc::new(MemoryAssociationStore::new()), LinkOrder::RemoveThenAdd);
        graph.apply(&album, &both, &both, deadline()).await.unwrap();
        assert_eq!(graph.members(&album, deadline()).await.unwrap(), both);
    }

    #[tokio::test]
    async fn failure_mid_batch_keeps_earlier_writes() {
        let inner = MemoryAssociationStore::new();
        let faulty = FaultyAssociationStore::new(inner.clone())
            .fail_after(Primitive::SetAdd, 1);
        let graph = LinkGraph::new(Arc::new(faulty), LinkOrder::default());
        let album = Ref::collection("3");

        let err = graph
            .apply(
                &album,
                &set(&["aaaaaaaaaaaa", "bbbbbbbbbbbb"]),
                &BTreeSet::new(),
                deadline(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.op, LinkOp::Add);
        assert_eq!(err.member, img("bbbbbbbbbbbb"));
        assert_eq!(err.applied.added, 1);
        assert_matches!(err.source, StoreError::Unavailable(_));
        let reader = LinkGraph::new(Arc::new(inner), LinkOrder::default());
        assert_eq!(
            reader.members(&album, deadline()).await.unwrap(),
            set(&["aaaaaaaaaaaa"])
        );
    }

    #[tokio::test]
    async fn clear_drops_the_set() {
        let graph = LinkGraph::new(Arc::new(MemoryAssociationStore::new()), LinkOrder::default());
        let album = Ref::collection("4");
        graph
            .apply(&album, &set(&["cccccccccccc"]), &BTreeSet::new(), deadline())
            .await
            .unwrap();
        assert!(graph.clear(&album, deadline()).await.unwrap());
        assert!(graph.members(&album, deadline()).await.unwrap().is_empty());
    }
}
