//! Permission oracle
//!
//! Resolves whether an actor holds a capability over a target. Possession is
//! derived, never stored on the actor:
//!
//! 1. an actor always controls its own user reference,
//! 2. the recorded owner of a target holds every capability,
//! 3. otherwise the target's ACL must list the actor under the requested
//!    capability or one that implies it.
//!
//! A store failure is an `Err`, distinct from a denial. Callers must not
//! conflate the two.

use async_trait::async_trait;
use fokal_core::effects::{AssociationStore, RecordStore};
use fokal_core::{keys, Actor, Capability, Deadline, Ref, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// Why access was granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantBasis {
    /// The target is the actor's own user reference
    SelfReference,
    /// The actor owns the target
    Owner,
    /// The target's ACL lists the actor under this capability
    Acl(Capability),
}

/// Outcome of a permission check that reached its store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessDecision {
    /// Access granted
    Allow(GrantBasis),
    /// Access denied
    Deny,
}

impl AccessDecision {
    /// Whether access is allowed
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow(_))
    }
}

/// Resolves capability possession for an actor/target pair
#[async_trait]
pub trait PermissionOracle: Send + Sync {
    /// Decide whether `actor` holds `capability` over `target`
    ///
    /// `target` must already have passed reference validation.
    async fn resolve(
        &self,
        actor: &Actor,
        capability: Capability,
        target: &Ref,
        deadline: Deadline,
    ) -> Result<AccessDecision, StoreError>;
}

/// Permission oracle backed by the fast association store
#[derive(Clone)]
pub struct AssociationPermissions {
    store: Arc<dyn AssociationStore>,
}

impl AssociationPermissions {
    /// Create an oracle over `store`
    pub fn new(store: Arc<dyn AssociationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PermissionOracle for AssociationPermissions {
    async fn resolve(
        &self,
        actor: &Actor,
        capability: Capability,
        target: &Ref,
        deadline: Deadline,
    ) -> Result<AccessDecision, StoreError> {
        if actor.reference() == target {
            return Ok(AccessDecision::Allow(GrantBasis::SelfReference));
        }

        let marker = keys::marker(target);
        let owner = deadline.bound("get", self.store.get(&marker)).await?;
        if owner.as_deref() == Some(actor.reference().to_string().as_str()) {
            return Ok(AccessDecision::Allow(GrantBasis::Owner));
        }

        let member = actor.reference().to_string();
        for granting in capability.satisfied_by() {
            let key = keys::acl(target, *granting);
            if deadline
                .bound("set_contains", self.store.set_contains(&key, &member))
                .await?
            {
                return Ok(AccessDecision::Allow(GrantBasis::Acl(*granting)));
            }
        }

        trace!(%actor, %capability, %target, "no grant in association store");
        Ok(AccessDecision::Deny)
    }
}

/// Permission oracle backed by the authoritative record store
#[derive(Clone)]
pub struct RecordPermissions {
    store: Arc<dyn RecordStore>,
}

impl RecordPermissions {
    /// Create an oracle over `store`
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PermissionOracle for RecordPermissions {
    async fn resolve(
        &self,
        actor: &Actor,
        capability: Capability,
        target: &Ref,
        deadline: Deadline,
    ) -> Result<AccessDecision, StoreError> {
        if actor.reference() == target {
            return Ok(AccessDecision::Allow(GrantBasis::SelfReference));
        }

        let Some(record) = deadline.bound("get", self.store.get(target)).await? else {
            trace!(%actor, %capability, %target, "no record to grant from");
            return Ok(AccessDecision::Deny);
        };

        if record.owner.as_ref() == Some(actor.reference()) {
            return Ok(AccessDecision::Allow(GrantBasis::Owner));
        }

        Ok(capability
            .satisfied_by()
            .iter()
            .find(|granting| record.grants(actor.reference(), &[**granting]))
            .map_or(AccessDecision::Deny, |granting| {
                AccessDecision::Allow(GrantBasis::Acl(*granting))
            }))
    }
}
