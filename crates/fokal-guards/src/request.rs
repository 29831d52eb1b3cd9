//! Typed request bodies
//!
//! The transport collaborator deserializes bodies into these structures, or
//! converts a loose key → list-of-strings map with `from_map`. Every field is
//! optional at the type level. Absence is reported as a body rejection by
//! `validate`, which runs once before any store is touched.

use fokal_core::{BodyError, CollectionType, FokalConfig, Ref, ReferenceError, Rejection};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Why a body could not be turned into a change set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// An entry failed reference validation
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    /// The body was missing keys or carried invalid entries
    #[error(transparent)]
    Body(#[from] BodyError),
}

impl RequestError {
    /// Terminal rejection for this error
    pub fn rejection(&self) -> Rejection {
        match self {
            RequestError::Reference(_) => Rejection::MalformedReference,
            RequestError::Body(_) => Rejection::MalformedBody,
        }
    }
}

/// Body of a collection link modification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkChangesBody {
    /// Member references to add, in `"<collection>/<id>"` form
    #[serde(default)]
    pub add: Option<Vec<String>>,
    /// Member references to remove
    #[serde(default)]
    pub remove: Option<Vec<String>>,
}

/// Validated link changes; duplicates have collapsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkChanges {
    /// Members to upsert
    pub additions: BTreeSet<Ref>,
    /// Members to delete
    pub removals: BTreeSet<Ref>,
}

impl LinkChangesBody {
    /// Build from a loose payload map
    pub fn from_map(map: &HashMap<String, Vec<String>>) -> Self {
        Self {
            add: map.get("add").cloned(),
            remove: map.get("remove").cloned(),
        }
    }

    /// Require both keys and parse every entry as an image reference
    pub fn validate(&self, config: &FokalConfig) -> Result<LinkChanges, RequestError> {
        let add = self.add.as_ref().ok_or(BodyError::MissingField("add"))?;
        let remove = self
            .remove
            .as_ref()
            .ok_or(BodyError::MissingField("remove"))?;
        check_count("add", add.len(), config)?;
        check_count("remove", remove.len(), config)?;
        Ok(LinkChanges {
            additions: parse_members(add)?,
            removals: parse_members(remove)?,
        })
    }
}

fn check_count(field: &'static str, count: usize, config: &FokalConfig) -> Result<(), BodyError> {
    if count > config.max_batch_entries {
        return Err(BodyError::TooManyEntries {
            field,
            count,
            limit: config.max_batch_entries,
        });
    }
    Ok(())
}

fn parse_members(entries: &[String]) -> Result<BTreeSet<Ref>, ReferenceError> {
    entries
        .iter()
        .map(|entry| {
            let member = Ref::parse(entry)?;
            member.expect_collection(CollectionType::Images)?;
            Ok(member)
        })
        .collect()
}

/// Body of a tag addition or removal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsBody {
    /// Tags to add or remove
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl TagsBody {
    /// Build from a loose payload map
    pub fn from_map(map: &HashMap<String, Vec<String>>) -> Self {
        Self {
            tags: map.get("tags").cloned(),
        }
    }

    /// Require the `tags` key and check each tag; duplicates collapse
    ///
    /// Tags are kept verbatim: membership is case-sensitive exact match.
    pub fn validate(&self, config: &FokalConfig) -> Result<BTreeSet<String>, RequestError> {
        let tags = self.tags.as_ref().ok_or(BodyError::MissingField("tags"))?;
        check_count("tags", tags.len(), config)?;
        for tag in tags {
            if tag.is_empty() {
                return Err(BodyError::EmptyTag.into());
            }
            if tag.chars().count() > config.max_tag_length {
                return Err(BodyError::TagTooLong {
                    limit: config.max_tag_length,
                }
                .into());
            }
        }
        Ok(tags.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn config() -> FokalConfig {
        FokalConfig::default()
    }

    #[test]
    fn missing_keys_are_body_errors() {
        let body = LinkChangesBody {
            add: Some(vec![]),
            remove: None,
        };
        let err = body.validate(&config()).unwrap_err();
        assert_eq!(err, RequestError::Body(BodyError::MissingField("remove")));
        assert_eq!(err.rejection(), Rejection::MalformedBody);

        assert_matches!(
            TagsBody::default().validate(&config()),
            Err(RequestError::Body(BodyError::MissingField("tags")))
        );
    }

    #[test]
    fn loose_map_conversion() {
        let mut map = HashMap::new();
        map.insert("add".to_string(), vec!["images/abcdefghijkl".to_string()]);
        let body = LinkChangesBody::from_map(&map);
        assert!(body.add.is_some());
        assert!(body.remove.is_none());

        map.insert("remove".to_string(), vec![]);
        let changes = LinkChangesBody::from_map(&map).validate(&config()).unwrap();
        assert_eq!(changes.additions.len(), 1);
        assert!(changes.removals.is_empty());
    }

    #[test]
    fn members_must_be_images() {
        let body = LinkChangesBody {
            add: Some(vec!["collections/4".to_string()]),
            remove: Some(vec![]),
        };
        let err = body.validate(&config()).unwrap_err();
        assert_eq!(err.rejection(), Rejection::MalformedReference);

        let body = LinkChangesBody {
            add: Some(vec!["images/short".to_string()]),
            remove: Some(vec![]),
        };
        assert_eq!(
            body.validate(&config()).unwrap_err().rejection(),
            Rejection::MalformedReference
        );
    }

    #[test]
    fn duplicate_members_collapse() {
        let body = LinkChangesBody {
            add: Some(vec![
                "images/abcdefghijkl".to_string(),
                "/images/abcdefghijkl".to_string(),
            ]),
            remove: Some(vec![]),
        };
        assert_eq!(body.validate(&config()).unwrap().additions.len(), 1);
    }

    #[test]
    fn tag_limits() {
        let config = FokalConfig {
            max_tag_length: 4,
            max_batch_entries: 2,
            ..FokalConfig::default()
        };
        let too_long = TagsBody {
            tags: Some(vec!["sunset".to_string()]),
        };
        assert_matches!(
            too_long.validate(&config),
            Err(RequestError::Body(BodyError::TagTooLong { limit: 4 }))
        );
        let empty = TagsBody {
            tags: Some(vec![String::new()]),
        };
        assert_matches!(
            empty.validate(&config),
            Err(RequestError::Body(BodyError::EmptyTag))
        );
        let too_many = TagsBody {
            tags: Some(vec!["a".into(), "b".into(), "c".into()]),
        };
        assert_matches!(
            too_many.validate(&config),
            Err(RequestError::Body(BodyError::TooManyEntries { field: "tags", .. }))
        );
    }

    #[test]
    fn tags_keep_case() {
        let body = TagsBody {
            tags: Some(vec!["Sunset".into(), "sunset".into(), "sunset".into()]),
        };
        assert_eq!(body.validate(&config()).unwrap().len(), 2);
    }

    #[test]
    fn deserializes_from_json() {
        let body: LinkChangesBody =
            serde_json::from_str(r#"{"add": ["images/abcdefghijkl"]}"#).unwrap();
        assert_eq!(body.remove, None);
    }
}
