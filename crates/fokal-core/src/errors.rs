//! Unified error types for Fokal
//!
//! `FokalError` is the single error type carried across crate boundaries.
//! The narrower enums below describe why a specific gate refused input; the
//! pipeline folds them into a [`Rejection`](crate::Rejection) before anything
//! reaches a caller.

use crate::reference::CollectionType;
use serde::{Deserialize, Serialize};

/// Unified error type for configuration and parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum FokalError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl FokalError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for FokalError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for FokalError {
    fn from(err: toml::de::Error) -> Self {
        Self::invalid(format!("Invalid TOML: {err}"))
    }
}

/// Error returned by every backing-store primitive
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The caller-supplied deadline elapsed before the store answered
    #[error("store call timed out: {operation}")]
    Timeout {
        /// Name of the primitive that timed out
        operation: String,
    },

    /// The store answered with an error
    #[error("store backend error: {0}")]
    Backend(String),

    /// The key or record reference was rejected by the store
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },
}

impl StoreError {
    /// Create a timeout error for the named primitive
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }
}

/// Why a reference failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    /// Collection name is not one of the known resource kinds
    #[error("unknown collection type: {0}")]
    UnknownCollection(String),

    /// Identifier is empty
    #[error("empty identifier for {0}")]
    EmptyId(CollectionType),

    /// Identifier does not match the shape rule of its collection
    #[error("identifier {id:?} is not a valid {collection} id")]
    BadShape {
        /// Collection whose rule was violated
        collection: CollectionType,
        /// Offending identifier
        id: String,
    },

    /// Well-formed reference of the wrong kind for this operation
    #[error("expected a {expected} reference, found {found}")]
    WrongCollection {
        /// Kind the operation requires
        expected: CollectionType,
        /// Kind that was supplied
        found: CollectionType,
    },

    /// Text form could not be split into collection and id
    #[error("unparseable reference: {0:?}")]
    Unparseable(String),
}

/// Why a request body failed validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    /// A required key was absent
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A tag was empty
    #[error("empty tag")]
    EmptyTag,

    /// A tag exceeded the configured length
    #[error("tag longer than {limit} characters")]
    TagTooLong {
        /// Configured maximum
        limit: usize,
    },

    /// A list held more entries than one request may carry
    #[error("{field} carries {count} entries, limit is {limit}")]
    TooManyEntries {
        /// Offending field
        field: &'static str,
        /// Entries supplied
        count: usize,
        /// Configured maximum
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = FokalError::invalid("test message");
        assert!(matches!(err, FokalError::Invalid { .. }));
        assert_eq!(err.to_string(), "Invalid: test message");
    }

    #[test]
    fn test_store_error_names_primitive() {
        let err = StoreError::timeout("set_add");
        assert_eq!(err.to_string(), "store call timed out: set_add");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        assert!(matches!(FokalError::from(io_err), FokalError::NotFound { .. }));
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        assert!(matches!(FokalError::from(io_err), FokalError::Internal { .. }));
    }
}
