//! Gated operations exposed to boundary collaborators
//!
//! Each operation runs its request through a [`GuardChain`] and only then
//! touches the mutators. The store used for the permission and existence
//! gates is the one the mutation writes to: link operations use the fast
//! store throughout, tag and delete operations the authoritative one.

use fokal_authorization::{
    AssociationExistence, AssociationPermissions, ExistenceOracle, PermissionOracle,
    RecordExistence, RecordPermissions,
};
use fokal_core::effects::{AssociationStore, RecordStore};
use fokal_core::{
    keys, Capability, CollectionType, FokalConfig, Outcome, Ref, Rejection, RequestContext,
};
use fokal_store::{LinkGraph, TagOp, TagSet};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::chain::GuardChain;
use crate::request::{LinkChangesBody, TagsBody};

/// Composes validation, oracles and mutators into the boundary operations
#[derive(Clone)]
pub struct MutationPipeline {
    config: FokalConfig,
    fast: Arc<dyn AssociationStore>,
    records: Arc<dyn RecordStore>,
    fast_permissions: Arc<dyn PermissionOracle>,
    record_permissions: Arc<dyn PermissionOracle>,
    fast_existence: Arc<dyn ExistenceOracle>,
    record_existence: Arc<dyn ExistenceOracle>,
    links: LinkGraph,
    tags: TagSet,
}

impl MutationPipeline {
    /// Wire the default oracles and mutators over the two stores
    pub fn new(
        fast: Arc<dyn AssociationStore>,
        records: Arc<dyn RecordStore>,
        config: FokalConfig,
    ) -> Self {
        Self {
            fast_permissions: Arc::new(AssociationPermissions::new(fast.clone())),
            record_permissions: Arc::new(RecordPermissions::new(records.clone())),
            fast_existence: Arc::new(AssociationExistence::new(fast.clone())),
            record_existence: Arc::new(RecordExistence::new(records.clone())),
            links: LinkGraph::new(fast.clone(), config.link_order),
            tags: TagSet::new(records.clone()),
            fast,
            records,
            config,
        }
    }

    /// Replace the permission oracles used against the fast and record stores
    pub fn with_permission_oracles(
        mut self,
        fast: Arc<dyn PermissionOracle>,
        records: Arc<dyn PermissionOracle>,
    ) -> Self {
        self.fast_permissions = fast;
        self.record_permissions = records;
        self
    }

    /// Add and remove image links of a collection
    ///
    /// Both `add` and `remove` must be present. The batch is applied in the
    /// configured [`LinkOrder`](fokal_core::LinkOrder); a store failure part
    /// way leaves earlier writes in place.
    pub async fn modify_collection_links(
        &self,
        ctx: &RequestContext,
        collection: &Ref,
        body: &LinkChangesBody,
    ) -> Outcome {
        let mut chain = GuardChain::new("modify_collection_links", ctx);
        chain.check_reference(collection, Some(CollectionType::Collections))?;
        let changes = chain.check_body(body.validate(&self.config))?;
        chain
            .authorize(self.fast_permissions.as_ref(), Capability::CanEdit, collection)
            .await?;
        chain
            .confirm_exists(self.fast_existence.as_ref(), collection)
            .await?;

        let report = self
            .links
            .apply(collection, &changes.additions, &changes.removals, ctx.deadline)
            .await
            .map_err(|error| chain.store_failure("link", &error))?;

        info!(
            %collection,
            actor = %ctx.actor,
            added = report.added,
            removed = report.removed,
            unchanged = report.unchanged,
            "collection links modified"
        );
        chain.applied(collection);
        Ok(())
    }

    /// Union the body's tags into an image's tag set
    pub async fn add_image_tags(
        &self,
        ctx: &RequestContext,
        image: &Ref,
        body: &TagsBody,
    ) -> Outcome {
        self.update_tags(TagOp::Add, ctx, image, body).await
    }

    /// Subtract the body's tags from an image's tag set
    pub async fn remove_image_tags(
        &self,
        ctx: &RequestContext,
        image: &Ref,
        body: &TagsBody,
    ) -> Outcome {
        self.update_tags(TagOp::Remove, ctx, image, body).await
    }

    async fn update_tags(
        &self,
        op: TagOp,
        ctx: &RequestContext,
        image: &Ref,
        body: &TagsBody,
    ) -> Outcome {
        let operation = match op {
            TagOp::Add => "add_image_tags",
            TagOp::Remove => "remove_image_tags",
        };
        let mut chain = GuardChain::new(operation, ctx);
        chain.check_reference(image, Some(CollectionType::Images))?;
        let tags = chain.check_body(body.validate(&self.config))?;
        chain
            .authorize(self.record_permissions.as_ref(), Capability::CanEdit, image)
            .await?;
        chain
            .confirm_exists(self.record_existence.as_ref(), image)
            .await?;

        let count = tags.len();
        let found = self
            .tags
            .update(image, op, tags, ctx.deadline)
            .await
            .map_err(|error| chain.store_failure("update_tags", &error))?;
        if !found {
            // Deleted between the existence gate and the write
            warn!(operation, %image, "record vanished before tag update");
            return Err(Rejection::NotFound);
        }

        info!(operation, %op, %image, actor = %ctx.actor, count, "image tags updated");
        chain.applied(image);
        Ok(())
    }

    /// Delete any resource
    ///
    /// The authoritative record goes first. Fast-store cleanup follows; if it
    /// fails the outcome is `StoreFailure` but the record stays deleted.
    pub async fn delete_resource(&self, ctx: &RequestContext, target: &Ref) -> Outcome {
        let mut chain = GuardChain::new("delete_resource", ctx);
        chain.check_reference(target, None)?;
        chain
            .authorize(self.record_permissions.as_ref(), Capability::CanDelete, target)
            .await?;
        chain
            .confirm_exists(self.record_existence.as_ref(), target)
            .await?;

        let removed = ctx
            .deadline
            .bound("delete", self.records.delete(target))
            .await
            .map_err(|error| chain.store_failure("delete_record", &error))?;
        if !removed {
            warn!(%target, "record vanished before delete");
            return Err(Rejection::NotFound);
        }

        let mut cleared = 0usize;
        for key in keys::all_for(target) {
            let existed = ctx
                .deadline
                .bound("delete", self.fast.delete(&key))
                .await
                .map_err(|error| chain.store_failure("delete_fast_keys", &error))?;
            cleared += usize::from(existed);
        }

        info!(%target, actor = %ctx.actor, cleared, "resource deleted");
        chain.applied(target);
        Ok(())
    }

    /// Current members of a collection
    pub async fn list_collection_links(
        &self,
        ctx: &RequestContext,
        collection: &Ref,
    ) -> Outcome<BTreeSet<Ref>> {
        let mut chain = GuardChain::new("list_collection_links", ctx);
        chain.check_reference(collection, Some(CollectionType::Collections))?;
        chain
            .authorize(self.fast_permissions.as_ref(), Capability::CanView, collection)
            .await?;
        chain
            .confirm_exists(self.fast_existence.as_ref(), collection)
            .await?;

        self.links
            .members(collection, ctx.deadline)
            .await
            .map_err(|error| chain.store_failure("set_members", &error))
    }

    /// Current tags of an image
    pub async fn get_image_tags(
        &self,
        ctx: &RequestContext,
        image: &Ref,
    ) -> Outcome<BTreeSet<String>> {
        let mut chain = GuardChain::new("get_image_tags", ctx);
        chain.check_reference(image, Some(CollectionType::Images))?;
        chain
            .authorize(self.record_permissions.as_ref(), Capability::CanView, image)
            .await?;
        chain
            .confirm_exists(self.record_existence.as_ref(), image)
            .await?;

        match self.tags.tags(image, ctx.deadline).await {
            Ok(Some(tags)) => Ok(tags),
            Ok(None) => Err(Rejection::NotFound),
            Err(error) => Err(chain.store_failure("get", &error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fokal_authorization::AccessDecision;
    use fokal_core::{Actor, Deadline, StoreError};
    use fokal_testkit::{actor, Fixture};
    use std::time::Duration;

    struct Unreachable;

    #[async_trait::async_trait]
    impl PermissionOracle for Unreachable {
        async fn resolve(
            &self,
            _actor: &Actor,
            _capability: Capability,
            _target: &Ref,
            _deadline: Deadline,
        ) -> Result<AccessDecision, StoreError> {
            Err(StoreError::Unavailable("permission backend down".into()))
        }
    }

    fn pipeline(fixture: &Fixture) -> MutationPipeline {
        MutationPipeline::new(
            Arc::new(fixture.fast.clone()),
            Arc::new(fixture.records.clone()),
            FokalConfig::default(),
        )
    }

    fn ctx(name: &str) -> RequestContext {
        RequestContext::new(actor(name), Deadline::after(Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn oracle_failure_is_store_failure() {
        let fixture = Fixture::new();
        let ana = fixture.user("ana").await;
        let image = fixture.image("abcdefghijkl", &ana, &["ocean"]).await;
        let pipeline = pipeline(&fixture)
            .with_permission_oracles(Arc::new(Unreachable), Arc::new(Unreachable));

        let body = TagsBody {
            tags: Some(vec!["sunset".into()]),
        };
        assert_eq!(
            pipeline.add_image_tags(&ctx("ana"), &image, &body).await,
            Err(Rejection::StoreFailure)
        );
        assert_eq!(
            fixture.tags(&image).await,
            Some(["ocean".to_string()].into())
        );
    }

    #[tokio::test]
    async fn reads_require_view() {
        let fixture = Fixture::new();
        let ana = fixture.user("ana").await;
        let image = fixture.image("abcdefghijkl", &ana, &["ocean"]).await;
        let album = fixture.collection("3", &ana, &[image.clone()]).await;
        fixture
            .grant(&album, Capability::CanView, &Ref::user("ben"))
            .await;
        let pipeline = pipeline(&fixture);

        assert_eq!(
            pipeline.list_collection_links(&ctx("ben"), &album).await,
            Ok([image.clone()].into())
        );
        assert_eq!(
            pipeline.get_image_tags(&ctx("ben"), &image).await,
            Err(Rejection::Unauthorized)
        );
        assert_eq!(
            pipeline.get_image_tags(&ctx("ana"), &image).await,
            Ok(["ocean".to_string()].into())
        );
    }
}
