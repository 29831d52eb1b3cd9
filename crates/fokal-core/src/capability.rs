//! Capability tokens checked per `(actor, capability, target)` triple
//!
//! Possession is never stored on the actor. It is derived from the target's
//! owner and access-control list at resolution time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::FokalError;

/// Named permission over a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// Read the resource
    CanView,
    /// Mutate the resource's links or tags
    CanEdit,
    /// Remove the resource
    CanDelete,
}

impl Capability {
    /// All capabilities
    pub const ALL: [Capability; 3] = [
        Capability::CanView,
        Capability::CanEdit,
        Capability::CanDelete,
    ];

    /// Key fragment used in store layouts
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CanView => "can_view",
            Capability::CanEdit => "can_edit",
            Capability::CanDelete => "can_delete",
        }
    }

    /// Capabilities whose grant also satisfies `self`, including `self`
    ///
    /// `CanEdit` implies `CanView`; `CanDelete` implies nothing else.
    pub fn satisfied_by(&self) -> &'static [Capability] {
        match self {
            Capability::CanView => &[Capability::CanView, Capability::CanEdit],
            Capability::CanEdit => &[Capability::CanEdit],
            Capability::CanDelete => &[Capability::CanDelete],
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = FokalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| FokalError::invalid(format!("unknown capability: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_implies_view_only() {
        assert!(Capability::CanView
            .satisfied_by()
            .contains(&Capability::CanEdit));
        assert!(!Capability::CanDelete
            .satisfied_by()
            .contains(&Capability::CanEdit));
        assert!(!Capability::CanEdit
            .satisfied_by()
            .contains(&Capability::CanView));
    }

    #[test]
    fn parses_store_names() {
        for cap in Capability::ALL {
            assert_eq!(cap.as_str().parse::<Capability>().unwrap(), cap);
        }
        assert!("can_fly".parse::<Capability>().is_err());
    }
}
