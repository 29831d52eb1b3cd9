//! Runtime configuration for the mutation layer
//!
//! Loaded from TOML, overlaid with `FOKAL_*` environment variables, then
//! validated. Every field has a default so an empty file is a valid config.

use crate::errors::FokalError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "FOKAL_";

/// Order in which a link batch applies its two lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOrder {
    /// Additions first, then removals; a reference in both lists ends absent
    #[default]
    AddThenRemove,
    /// Removals first, then additions; a reference in both lists ends present
    RemoveThenAdd,
}

impl std::str::FromStr for LinkOrder {
    type Err = FokalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add_then_remove" => Ok(LinkOrder::AddThenRemove),
            "remove_then_add" => Ok(LinkOrder::RemoveThenAdd),
            other => Err(FokalError::invalid(format!("unknown link order: {other}"))),
        }
    }
}

/// Trait for configuration merging
pub trait ConfigMerge {
    /// Merge this configuration with another
    fn merge_with(&mut self, other: &Self) -> Result<(), FokalError>;
}

/// Trait for configuration validation
pub trait ConfigValidation {
    /// Validate this configuration
    fn validate(&self) -> Result<(), FokalError>;
}

/// Mutation layer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FokalConfig {
    /// Deadline budget for all store calls made on behalf of one request
    pub store_deadline_ms: u64,
    /// Order in which link additions and removals are applied
    pub link_order: LinkOrder,
    /// Maximum references or tags in one request body
    pub max_batch_entries: usize,
    /// Maximum tag length in characters
    pub max_tag_length: usize,
    /// Log filter used by binaries
    pub log_level: String,
}

impl Default for FokalConfig {
    fn default() -> Self {
        Self {
            store_deadline_ms: 2_000,
            link_order: LinkOrder::default(),
            max_batch_entries: 256,
            max_tag_length: 64,
            log_level: "info".to_string(),
        }
    }
}

impl FokalConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, FokalError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay `FOKAL_*` environment variables
    pub fn merge_with_env(&mut self) -> Result<(), FokalError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Overlay variables from an explicit iterator
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<(), FokalError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(field) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match field {
                "STORE_DEADLINE_MS" => self.store_deadline_ms = parse_number(&key, &value)?,
                "LINK_ORDER" => self.link_order = value.parse()?,
                "MAX_BATCH_ENTRIES" => self.max_batch_entries = parse_number(&key, &value)?,
                "MAX_TAG_LENGTH" => self.max_tag_length = parse_number(&key, &value)?,
                "LOG_LEVEL" => self.log_level = value,
                _ => tracing::debug!(variable = %key, "ignoring unknown config variable"),
            }
        }
        Ok(())
    }

    /// Deadline budget as a duration
    pub fn store_deadline(&self) -> Duration {
        Duration::from_millis(self.store_deadline_ms)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, FokalError> {
    value
        .parse()
        .map_err(|_| FokalError::invalid(format!("{key} must be a non-negative integer")))
}

impl ConfigMerge for FokalConfig {
    fn merge_with(&mut self, other: &Self) -> Result<(), FokalError> {
        let defaults = FokalConfig::default();
        if other.store_deadline_ms != defaults.store_deadline_ms {
            self.store_deadline_ms = other.store_deadline_ms;
        }
        if other.link_order != defaults.link_order {
            self.link_order = other.link_order;
        }
        if other.max_batch_entries != defaults.max_batch_entries {
            self.max_batch_entries = other.max_batch_entries;
        }
        if other.max_tag_length != defaults.max_tag_length {
            self.max_tag_length = other.max_tag_length;
        }
        if other.log_level != defaults.log_level {
            self.log_level.clone_from(&other.log_level);
        }
        Ok(())
    }
}

impl ConfigValidation for FokalConfig {
    fn validate(&self) -> Result<(), FokalError> {
        if self.store_deadline_ms == 0 {
            return Err(FokalError::invalid("store_deadline_ms must be positive"));
        }
        if self.max_batch_entries == 0 {
            return Err(FokalError::invalid("max_batch_entries must be positive"));
        }
        if self.max_tag_length == 0 {
            return Err(FokalError::invalid("max_tag_length must be positive"));
        }
        Ok(())
    }
}
