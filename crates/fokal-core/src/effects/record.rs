//! Authoritative record store effects

use crate::capability::Capability;
use crate::errors::StoreError;
use crate::reference::Ref;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Authoritative record for one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// The resource this record describes
    pub reference: Ref,
    /// Owning user, if any
    #[serde(default)]
    pub owner: Option<Ref>,
    /// Free-text labels; membership is case-sensitive exact match
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Explicit grants per capability
    #[serde(default)]
    pub acl: BTreeMap<Capability, BTreeSet<Ref>>,
}

impl Record {
    /// Empty record for `reference`
    pub fn new(reference: Ref) -> Self {
        Self {
            reference,
            owner: None,
            tags: BTreeSet::new(),
            acl: BTreeMap::new(),
        }
    }

    /// Set the owner
    pub fn with_owner(mut self, owner: Ref) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Add tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Grant `capability` to `actor`
    pub fn with_grant(mut self, capability: Capability, actor: Ref) -> Self {
        self.acl.entry(capability).or_default().insert(actor);
        self
    }

    /// Whether `actor` holds an explicit grant for any of `capabilities`
    pub fn grants(&self, actor: &Ref, capabilities: &[Capability]) -> bool {
        capabilities
            .iter()
            .filter_map(|cap| self.acl.get(cap))
            .any(|holders| holders.contains(actor))
    }
}

/// Set-union and set-difference applied to a record's tag set in one request
///
/// The union is applied first, then the difference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetUpdate {
    /// Members to add
    pub add: BTreeSet<String>,
    /// Members to remove
    pub remove: BTreeSet<String>,
}

impl SetUpdate {
    /// Whether the update changes nothing regardless of current state
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Apply to a set in place
    pub fn apply_to(&self, set: &mut BTreeSet<String>) {
        set.extend(self.add.iter().cloned());
        set.retain(|member| !self.remove.contains(member));
    }
}

/// Primitives of the authoritative record store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record
    async fn get(&self, reference: &Ref) -> Result<Option<Record>, StoreError>;

    /// Insert or replace a record
    async fn put(&self, record: Record) -> Result<(), StoreError>;

    /// Remove a record; returns whether it was present
    async fn delete(&self, reference: &Ref) -> Result<bool, StoreError>;

    /// Whether a record exists
    async fn exists(&self, reference: &Ref) -> Result<bool, StoreError>;

    /// Apply `update` to the record's tag set as one atomic operation
    ///
    /// Returns `false` without writing when the record is absent.
    async fn update_tags(&self, reference: &Ref, update: SetUpdate) -> Result<bool, StoreError>;
}
