//! Typed resource references
//!
//! A [`Ref`] names any addressable resource as a `(CollectionType, id)` pair.
//! Whether a reference is well-formed is a pure function of those two fields:
//! validation never consults a store, so it can run as the first gate of every
//! operation and is safe to repeat.

use crate::errors::ReferenceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of an image identifier
pub const IMAGE_ID_LEN: usize = 12;
/// Upper bound on username length
pub const MAX_USER_ID_LEN: usize = 32;
/// Upper bound on tag reference length
pub const MAX_TAG_ID_LEN: usize = 64;

/// Closed set of resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    /// User accounts, keyed by username
    Users,
    /// Images, keyed by a 12-letter token
    Images,
    /// Albums, keyed by a numeric id
    Collections,
    /// Tags, keyed by their label
    Tags,
}

impl CollectionType {
    /// All known collection types
    pub const ALL: [CollectionType; 4] = [
        CollectionType::Users,
        CollectionType::Images,
        CollectionType::Collections,
        CollectionType::Tags,
    ];

    /// Path segment used in the textual reference form
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::Users => "users",
            CollectionType::Images => "images",
            CollectionType::Collections => "collections",
            CollectionType::Tags => "tags",
        }
    }

    /// Check `id` against this collection's shape rule
    pub fn accepts_id(&self, id: &str) -> bool {
        match self {
            CollectionType::Images => {
                id.len() == IMAGE_ID_LEN && id.bytes().all(|b| b.is_ascii_alphabetic())
            }
            CollectionType::Users => {
                !id.is_empty()
                    && id.len() <= MAX_USER_ID_LEN
                    && id
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
            }
            CollectionType::Collections => {
                // Canonical decimal: `7` and `07` must not name two collections
                !id.is_empty()
                    && id.bytes().all(|b| b.is_ascii_digit())
                    && (id == "0" || !id.starts_with('0'))
                    && id.parse::<u64>().is_ok()
            }
            CollectionType::Tags => {
                let len = id.chars().count();
                len > 0
                    && len <= MAX_TAG_ID_LEN
                    && id.trim() == id
                    && !id.chars().any(|c| c == '/' || c.is_control())
            }
        }
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionType {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ReferenceError::UnknownCollection(s.to_string()))
    }
}

/// Reference to a resource
///
/// Equality, hashing and ordering compare `collection` then `id`, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ref {
    /// Kind of resource
    pub collection: CollectionType,
    /// Identifier within the collection
    pub id: String,
}

impl Ref {
    /// Create a reference without validating it
    pub fn new(collection: CollectionType, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }

    /// Reference to a user
    pub fn user(id: impl Into<String>) -> Self {
        Self::new(CollectionType::Users, id)
    }

    /// Reference to an image
    pub fn image(id: impl Into<String>) -> Self {
        Self::new(CollectionType::Images, id)
    }

    /// Reference to a collection
    pub fn collection(id: impl Into<String>) -> Self {
        Self::new(CollectionType::Collections, id)
    }

    /// Reference to a tag
    pub fn tag(id: impl Into<String>) -> Self {
        Self::new(CollectionType::Tags, id)
    }

    /// Check the identifier against its collection's shape rule
    pub fn validate(&self) -> Result<(), ReferenceError> {
        if self.id.is_empty() {
            return Err(ReferenceError::EmptyId(self.collection));
        }
        if !self.collection.accepts_id(&self.id) {
            return Err(ReferenceError::BadShape {
                collection: self.collection,
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Whether the reference is well-formed
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validate and additionally require a specific collection type
    pub fn expect_collection(&self, expected: CollectionType) -> Result<(), ReferenceError> {
        if self.collection != expected {
            return Err(ReferenceError::WrongCollection {
                expected,
                found: self.collection,
            });
        }
        self.validate()
    }

    /// Parse the `"<collection>/<id>"` textual form and validate it
    pub fn parse(text: &str) -> Result<Self, ReferenceError> {
        let trimmed = text.trim_start_matches('/');
        let (collection, id) = trimmed
            .split_once('/')
            .ok_or_else(|| ReferenceError::Unparseable(text.to_string()))?;
        let reference = Ref::new(collection.parse()?, id);
        reference.validate()?;
        Ok(reference)
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

impl FromStr for Ref {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ref::parse(s)
    }
}

/// Authenticated requester
///
/// Produced by the authentication collaborator; always a well-formed user
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Ref", into = "Ref")]
pub struct Actor(Ref);

impl Actor {
    /// Wrap an authenticated user reference
    pub fn new(reference: Ref) -> Result<Self, ReferenceError> {
        reference.expect_collection(CollectionType::Users)?;
        Ok(Self(reference))
    }

    /// The actor's user reference
    pub fn reference(&self) -> &Ref {
        &self.0
    }
}

impl TryFrom<Ref> for Actor {
    type Error = ReferenceError;

    fn try_from(reference: Ref) -> Result<Self, Self::Error> {
        Actor::new(reference)
    }
}

impl From<Actor> for Ref {
    fn from(actor: Actor) -> Self {
        actor.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
