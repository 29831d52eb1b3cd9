//! Terminal outcomes reported to boundary collaborators
//!
//! Every operation ends in exactly one of five rejection kinds or success.
//! Store error detail never travels in a rejection; it is logged where it
//! happens and collapsed into [`Rejection::StoreFailure`].

use serde::{Deserialize, Serialize};

/// Terminal rejection kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum Rejection {
    /// Reference failed shape or type validation
    #[error("invalid reference")]
    MalformedReference,
    /// Expected keys were absent from the payload or entries were invalid
    #[error("invalid body")]
    MalformedBody,
    /// Actor does not hold the required capability
    #[error("not authorized")]
    Unauthorized,
    /// Target does not exist
    #[error("resource does not exist")]
    NotFound,
    /// A backing store call failed or timed out
    #[error("internal failure")]
    StoreFailure,
}

impl Rejection {
    /// Transport-independent status category
    pub fn status(&self) -> StatusClass {
        match self {
            Rejection::MalformedReference | Rejection::MalformedBody => StatusClass::BadRequest,
            Rejection::Unauthorized => StatusClass::Forbidden,
            Rejection::NotFound => StatusClass::NotFound,
            Rejection::StoreFailure => StatusClass::InternalError,
        }
    }
}

/// Stable status category that collaborators map onto transport codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusClass {
    /// Operation applied
    Success,
    /// Caller sent something malformed
    BadRequest,
    /// Caller lacks permission
    Forbidden,
    /// Target is absent
    NotFound,
    /// Backing store failed
    InternalError,
}

/// Result of a gated operation; `Ok` is the Accepted outcome
pub type Outcome<T = ()> = Result<T, Rejection>;

/// Status lookup on any outcome
pub trait OutcomeStatus {
    /// Status category of this outcome
    fn status(&self) -> StatusClass;
}

impl<T> OutcomeStatus for Outcome<T> {
    fn status(&self) -> StatusClass {
        match self {
            Ok(_) => StatusClass::Success,
            Err(rejection) => rejection.status(),
        }
    }
}
