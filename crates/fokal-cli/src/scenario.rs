//! Request scenarios replayed against in-memory stores
//!
//! A scenario seeds resource records, then runs requests through the
//! pipeline in file order. References are written in their textual
//! `"<collection>/<id>"` form.
//!
//! ```json
//! {
//!   "records": [
//!     { "reference": "users/ana" },
//!     { "reference": "collections/1", "owner": "users/ana", "links": ["images/abcdefghijkl"] },
//!     { "reference": "images/abcdefghijkl", "owner": "users/ana", "tags": ["ocean"],
//!       "acl": { "CanEdit": ["users/ben"] } }
//!   ],
//!   "requests": [
//!     { "op": "add_tags", "actor": "users/ben", "target": "images/abcdefghijkl", "tags": ["dusk"] }
//!   ]
//! }
//! ```

use anyhow::{bail, Context, Result};
use fokal_core::effects::{AssociationStore, Record, RecordStore};
use fokal_core::{
    keys, Actor, Capability, FokalConfig, Outcome, OutcomeStatus, Ref, Rejection,
    RequestContext, StatusClass,
};
use fokal_effects::{MemoryAssociationStore, MemoryRecordStore};
use fokal_guards::{LinkChangesBody, MutationPipeline, TagsBody};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Resource to seed before replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SeedRecord {
    /// Textual reference of the resource
    pub reference: String,
    /// Owner reference, if any
    #[serde(default)]
    pub owner: Option<String>,
    /// Initial tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Initial ACL grants
    #[serde(default)]
    pub acl: BTreeMap<Capability, Vec<String>>,
    /// Initial members, for collections
    #[serde(default)]
    pub links: Vec<String>,
}

/// One request to replay
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScenarioRequest {
    /// Add and remove collection members
    ModifyLinks {
        /// Requesting user
        actor: String,
        /// Collection reference
        target: String,
        /// Members to add
        #[serde(default)]
        add: Option<Vec<String>>,
        /// Members to remove
        #[serde(default)]
        remove: Option<Vec<String>>,
    },
    /// Add image tags
    AddTags {
        /// Requesting user
        actor: String,
        /// Image reference
        target: String,
        /// Tags to add
        #[serde(default)]
        tags: Option<Vec<String>>,
    },
    /// Remove image tags
    RemoveTags {
        /// Requesting user
        actor: String,
        /// Image reference
        target: String,
        /// Tags to remove
        #[serde(default)]
        tags: Option<Vec<String>>,
    },
    /// Delete a resource
    Delete {
        /// Requesting user
        actor: String,
        /// Resource reference
        target: String,
    },
    /// List collection members
    ListLinks {
        /// Requesting user
        actor: String,
        /// Collection reference
        target: String,
    },
    /// Read image tags
    GetTags {
        /// Requesting user
        actor: String,
        /// Image reference
        target: String,
    },
}

impl ScenarioRequest {
    /// Operation name as written in the file
    pub fn op(&self) -> &'static str {
        match self {
            ScenarioRequest::ModifyLinks { .. } => "modify_links",
            ScenarioRequest::AddTags { .. } => "add_tags",
            ScenarioRequest::RemoveTags { .. } => "remove_tags",
            ScenarioRequest::Delete { .. } => "delete",
            ScenarioRequest::ListLinks { .. } => "list_links",
            ScenarioRequest::GetTags { .. } => "get_tags",
        }
    }

    fn actor(&self) -> &str {
        match self {
            ScenarioRequest::ModifyLinks { actor, .. }
            | ScenarioRequest::AddTags { actor, .. }
            | ScenarioRequest::RemoveTags { actor, .. }
            | ScenarioRequest::Delete { actor, .. }
            | ScenarioRequest::ListLinks { actor, .. }
            | ScenarioRequest::GetTags { actor, .. } => actor,
        }
    }

    fn target(&self) -> &str {
        match self {
            ScenarioRequest::ModifyLinks { target, .. }
            | ScenarioRequest::AddTags { target, .. }
            | ScenarioRequest::RemoveTags { target, .. }
            | ScenarioRequest::Delete { target, .. }
            | ScenarioRequest::ListLinks { target, .. }
            | ScenarioRequest::GetTags { target, .. } => target,
        }
    }
}

/// Seed records plus requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    /// Resources present before the first request
    #[serde(default)]
    pub records: Vec<SeedRecord>,
    /// Requests in replay order
    #[serde(default)]
    pub requests: Vec<ScenarioRequest>,
}

impl Scenario {
    /// Read a scenario from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// Parse a scenario from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Outcome of one replayed request, printed as a JSON line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayLine {
    /// Position in the request list
    pub index: usize,
    /// Operation name
    pub op: &'static str,
    /// Target as written in the file
    pub target: String,
    /// Status class of the outcome
    pub status: StatusClass,
    /// Rejection kind, when rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
    /// Members returned by `list_links`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    /// Tags returned by `get_tags`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
}

fn parse_ref(text: &str) -> Result<Ref> {
    Ref::parse(text).with_context(|| format!("invalid reference {text:?} in scenario"))
}

/// Write one seed record to both stores
async fn seed(
    fast: &MemoryAssociationStore,
    records: &MemoryRecordStore,
    seed: &SeedRecord,
) -> Result<()> {
    let reference = parse_ref(&seed.reference)?;
    let mut record = Record::new(reference.clone()).with_tags(seed.tags.iter().cloned());
    if let Some(owner) = &seed.owner {
        record = record.with_owner(parse_ref(owner)?);
    }
    for (capability, holders) in &seed.acl {
        for holder in holders {
            record = record.with_grant(*capability, parse_ref(holder)?);
        }
    }

    let owner = record
        .owner
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    fast.set(&keys::marker(&reference), owner).await?;
    for (capability, holders) in &record.acl {
        for holder in holders {
            fast.set_add(&keys::acl(&reference, *capability), &holder.to_string())
                .await?;
        }
    }
    for member in &seed.links {
        let member = parse_ref(member)?;
        fast.set_add(&keys::links(&reference), &member.to_string())
            .await?;
    }
    records.put(record).await?;
    debug!(%reference, "seeded");
    Ok(())
}

/// Seed fresh in-memory stores and replay every request
pub async fn replay(scenario: &Scenario, config: &FokalConfig) -> Result<Vec<ReplayLine>> {
    check_unique(scenario)?;
    let fast = MemoryAssociationStore::new();
    let records = MemoryRecordStore::new();
    for record in &scenario.records {
        seed(&fast, &records, record).await?;
    }
    info!(records = scenario.records.len(), "scenario seeded");

    let pipeline = MutationPipeline::new(
        Arc::new(fast.clone()),
        Arc::new(records.clone()),
        config.clone(),
    );

    let mut lines = Vec::with_capacity(scenario.requests.len());
    for (index, request) in scenario.requests.iter().enumerate() {
        lines.push(run(&pipeline, config, index, request).await?);
    }
    Ok(lines)
}

async fn run(
    pipeline: &MutationPipeline,
    config: &FokalConfig,
    index: usize,
    request: &ScenarioRequest,
) -> Result<ReplayLine> {
    let actor = Actor::new(parse_ref(request.actor())?)
        .with_context(|| format!("request {index}: actor must be a user"))?;
    let ctx = RequestContext::from_config(actor, config);
    let mut line = ReplayLine {
        index,
        op: request.op(),
        target: request.target().to_string(),
        status: StatusClass::Success,
        rejection: None,
        links: None,
        tags: None,
    };

    // An unparseable target never reaches the pipeline
    let Ok(target) = Ref::parse(request.target()) else {
        line.status = StatusClass::BadRequest;
        line.rejection = Some(Rejection::MalformedReference);
        return Ok(line);
    };

    let outcome: Outcome = match request {
        ScenarioRequest::ModifyLinks { add, remove, .. } => {
            let body = LinkChangesBody {
                add: add.clone(),
                remove: remove.clone(),
            };
            pipeline.modify_collection_links(&ctx, &target, &body).await
        }
        ScenarioRequest::AddTags { tags, .. } => {
            let body = TagsBody { tags: tags.clone() };
            pipeline.add_image_tags(&ctx, &target, &body).await
        }
        ScenarioRequest::RemoveTags { tags, .. } => {
            let body = TagsBody { tags: tags.clone() };
            pipeline.remove_image_tags(&ctx, &target, &body).await
        }
        ScenarioRequest::Delete { .. } => pipeline.delete_resource(&ctx, &target).await,
        ScenarioRequest::ListLinks { .. } => pipeline
            .list_collection_links(&ctx, &target)
            .await
            .map(|members| {
                line.links = Some(members.iter().map(ToString::to_string).collect());
            }),
        ScenarioRequest::GetTags { .. } => {
            pipeline.get_image_tags(&ctx, &target).await.map(|tags| {
                line.tags = Some(tags);
            })
        }
    };

    line.status = outcome.status();
    line.rejection = outcome.err();
    Ok(line)
}

/// Reject scenarios that name the same resource twice
fn check_unique(scenario: &Scenario) -> Result<()> {
    let mut seen = BTreeSet::new();
    for record in &scenario.records {
        if !seen.insert(record.reference.as_str()) {
            bail!("resource {} is seeded twice", record.reference);
        }
    }
    Ok(())
}
