//! Seeded store fixtures
//!
//! Writes every resource to both stores the way the write paths expect to
//! find it: a marker (valued with the owner) and ACL sets in the fast store,
//! a full record in the authoritative store.

use fokal_core::effects::{AssociationStore, Record, RecordStore};
use fokal_core::{keys, Actor, Capability, Ref};
use fokal_effects::{MemoryAssociationStore, MemoryRecordStore};
use std::collections::BTreeSet;

/// Pair of in-memory stores with seeding helpers
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    /// Fast association store
    pub fast: MemoryAssociationStore,
    /// Authoritative record store
    pub records: MemoryRecordStore,
}

/// Authenticated actor for user `name`
pub fn actor(name: &str) -> Actor {
    Actor::new(Ref::user(name)).expect("fixture user names are valid")
}

impl Fixture {
    /// Empty stores
    pub fn new() -> Self {
        Self::default()
    }

    async fn seed(&self, record: Record) {
        let owner = record
            .owner
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        self.fast
            .set(&keys::marker(&record.reference), owner)
            .await
            .expect("seed marker");
        for (capability, holders) in &record.acl {
            for holder in holders {
                self.fast
                    .set_add(&keys::acl(&record.reference, *capability), &holder.to_string())
                    .await
                    .expect("seed acl");
            }
        }
        self.records.put(record).await.expect("seed record");
    }

    /// Seed a user account
    pub async fn user(&self, name: &str) -> Ref {
        let user = Ref::user(name);
        self.seed(Record::new(user.clone())).await;
        user
    }

    /// Seed an image owned by `owner` carrying `tags`
    pub async fn image(&self, id: &str, owner: &Ref, tags: &[&str]) -> Ref {
        let image = Ref::image(id);
        self.seed(
            Record::new(image.clone())
                .with_owner(owner.clone())
                .with_tags(tags.iter().copied()),
        )
        .await;
        image
    }

    /// Seed a collection owned by `owner` linking `members`
    pub async fn collection(&self, id: &str, owner: &Ref, members: &[Ref]) -> Ref {
        let collection = Ref::collection(id);
        self.seed(Record::new(collection.clone()).with_owner(owner.clone()))
            .await;
        for member in members {
            self.fast
                .set_add(&keys::links(&collection), &member.to_string())
                .await
                .expect("seed link");
        }
        collection
    }

    /// Seed a tag resource owned by `owner`
    pub async fn tag(&self, label: &str, owner: &Ref) -> Ref {
        let tag = Ref::tag(label);
        self.seed(Record::new(tag.clone()).with_owner(owner.clone()))
            .await;
        tag
    }

    /// Grant `capability` over `target` to `holder` in both stores
    pub async fn grant(&self, target: &Ref, capability: Capability, holder: &Ref) {
        self.fast
            .set_add(&keys::acl(target, capability), &holder.to_string())
            .await
            .expect("seed grant");
        if let Some(record) = self.records.get(target).await.expect("read record") {
            self.records
                .put(record.with_grant(capability, holder.clone()))
                .await
                .expect("seed grant record");
        }
    }

    /// Raw link set of a collection
    pub async fn links(&self, collection: &Ref) -> BTreeSet<String> {
        self.fast
            .set_members(&keys::links(collection))
            .await
            .expect("read links")
    }

    /// Tags of a record, `None` when absent
    pub async fn tags(&self, target: &Ref) -> Option<BTreeSet<String>> {
        self.records
            .get(target)
            .await
            .expect("read record")
            .map(|record| record.tags)
    }
}

/// Set of raw link entries from references
pub fn link_set(members: &[&Ref]) -> BTreeSet<String> {
    members.iter().map(ToString::to_string).collect()
}
