//! Gate chain for one request
//!
//! `Parsed → ReferenceValid → Authorized → Existent → Applied`. A failing
//! gate returns a terminal rejection and nothing after it runs. No gate here
//! writes; the mutation itself runs only after the chain has passed.
//!
//! Authorization precedes the existence check so an actor without the
//! capability learns nothing about whether the target exists.

use fokal_authorization::{AccessDecision, ExistenceOracle, PermissionOracle};
use fokal_core::{Capability, CollectionType, Rejection, RequestContext, Ref};
use std::fmt;
use tracing::{debug, warn};

use crate::request::RequestError;

/// Position of a request in the gate sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GateStage {
    /// Body decoded by the transport collaborator
    Parsed,
    /// Reference and body passed shape validation
    ReferenceValid,
    /// Actor holds the required capability
    Authorized,
    /// Target confirmed live
    Existent,
    /// Mutation applied
    Applied,
}

/// Gate evaluator bound to one operation and request
pub struct GuardChain<'a> {
    operation: &'static str,
    ctx: &'a RequestContext,
    stage: GateStage,
}

impl<'a> GuardChain<'a> {
    /// Start a chain for `operation`
    pub fn new(operation: &'static str, ctx: &'a RequestContext) -> Self {
        debug!(operation, actor = %ctx.actor, "request received");
        Self {
            operation,
            ctx,
            stage: GateStage::Parsed,
        }
    }

    /// Stage reached so far
    pub fn stage(&self) -> GateStage {
        self.stage
    }

    /// Reference gate: pure, never touches a store
    ///
    /// With `expected` set, the reference must also be of that kind.
    pub fn check_reference(
        &mut self,
        target: &Ref,
        expected: Option<CollectionType>,
    ) -> Result<(), Rejection> {
        let checked = match expected {
            Some(kind) => target.expect_collection(kind),
            None => target.validate(),
        };
        if let Err(error) = checked {
            debug!(operation = self.operation, %target, %error, "rejected: malformed reference");
            return Err(Rejection::MalformedReference);
        }
        self.stage = GateStage::ReferenceValid;
        Ok(())
    }

    /// Body gate: the already-validated body outcome
    pub fn check_body<T>(&self, body: Result<T, RequestError>) -> Result<T, Rejection> {
        match body {
            Ok(parsed) => Ok(parsed),
            Err(error) => {
                let rejection = error.rejection();
                debug!(operation = self.operation, %error, ?rejection, "rejected: body");
                Err(rejection)
            }
        }
    }

    /// Authorization gate
    pub async fn authorize(
        &mut self,
        oracle: &dyn PermissionOracle,
        capability: Capability,
        target: &Ref,
    ) -> Result<(), Rejection> {
        debug_assert_eq!(self.stage, GateStage::ReferenceValid);
        let decision = oracle
            .resolve(&self.ctx.actor, capability, target, self.ctx.deadline)
            .await
            .map_err(|error| self.store_failure("authorize", &error))?;

        match decision {
            AccessDecision::Allow(basis) => {
                debug!(operation = self.operation, %target, %capability, ?basis, "authorized");
                self.stage = GateStage::Authorized;
                Ok(())
            }
            AccessDecision::Deny => {
                debug!(
                    operation = self.operation,
                    actor = %self.ctx.actor,
                    %target,
                    %capability,
                    "rejected: unauthorized"
                );
                Err(Rejection::Unauthorized)
            }
        }
    }

    /// Existence gate; only reachable once authorized
    pub async fn confirm_exists(
        &mut self,
        oracle: &dyn ExistenceOracle,
        target: &Ref,
    ) -> Result<(), Rejection> {
        debug_assert_eq!(self.stage, GateStage::Authorized);
        let exists = oracle
            .exists(target, self.ctx.deadline)
            .await
            .map_err(|error| self.store_failure("exists", &error))?;
        if !exists {
            debug!(operation = self.operation, %target, "rejected: not found");
            return Err(Rejection::NotFound);
        }
        self.stage = GateStage::Existent;
        Ok(())
    }

    /// Record a successful mutation
    pub fn applied(&mut self, target: &Ref) {
        self.stage = GateStage::Applied;
        debug!(operation = self.operation, %target, "applied");
    }

    /// Log store detail and collapse it into `StoreFailure`
    pub fn store_failure(&self, step: &'static str, error: &dyn fmt::Display) -> Rejection {
        warn!(
            operation = self.operation,
            step,
            stage = ?self.stage,
            error = %error,
            "store failure"
        );
        Rejection::StoreFailure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fokal_authorization::{AssociationExistence, AssociationPermissions};
    use fokal_core::Deadline;
    use fokal_testkit::{actor, Fixture};
    use std::sync::Arc;
    use std::time::Duration;

    fn ctx(name: &str) -> RequestContext {
        RequestContext::new(actor(name), Deadline::after(Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn stages_advance_in_order() {
        let fixture = Fixture::new();
        let ana = fixture.user("ana").await;
        let album = fixture.collection("1", &ana, &[]).await;
        let permissions = AssociationPermissions::new(Arc::new(fixture.fast.clone()));
        let existence = AssociationExistence::new(Arc::new(fixture.fast.clone()));
        let ctx = ctx("ana");

        let mut chain = GuardChain::new("modify_collection_links", &ctx);
        assert_eq!(chain.stage(), GateStage::Parsed);
        chain
            .check_reference(&album, Some(CollectionType::Collections))
            .unwrap();
        assert_eq!(chain.stage(), GateStage::ReferenceValid);
        chain
            .authorize(&permissions, Capability::CanEdit, &album)
            .await
            .unwrap();
        assert_eq!(chain.stage(), GateStage::Authorized);
        chain.confirm_exists(&existence, &album).await.unwrap();
        assert_eq!(chain.stage(), GateStage::Existent);
        chain.applied(&album);
        assert_eq!(chain.stage(), GateStage::Applied);
    }

    #[tokio::test]
    async fn rejection_stops_at_the_failing_gate() {
        let fixture = Fixture::new();
        let ana = fixture.user("ana").await;
        let album = fixture.collection("1", &ana, &[]).await;
        let permissions = AssociationPermissions::new(Arc::new(fixture.fast.clone()));
        let ctx = ctx("ben");

        let mut chain = GuardChain::new("modify_collection_links", &ctx);
        assert_eq!(
            chain.check_reference(&album, Some(CollectionType::Images)),
            Err(Rejection::MalformedReference)
        );
        assert_eq!(chain.stage(), GateStage::Parsed);

        let mut chain = GuardChain::new("modify_collection_links", &ctx);
        chain.check_reference(&album, None).unwrap();
        assert_eq!(
            chain
                .authorize(&permissions, Capability::CanEdit, &album)
                .await,
            Err(Rejection::Unauthorized)
        );
        assert_eq!(chain.stage(), GateStage::ReferenceValid);
        assert!(chain.stage() < GateStage::Authorized);
    }
}
