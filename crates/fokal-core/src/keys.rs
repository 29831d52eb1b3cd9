//! Fast-store key layout
//!
//! - `marker:<collection>/<id>`: existence marker, value is the owner reference or empty
//! - `acl:<capability>:<collection>/<id>`: set of granted actor references
//! - `links:collections/<id>`: set of member references
//!
//! The reference always comes last, after a fixed prefix free of reference
//! text, so two distinct references never share a key whatever their ids hold.

use crate::capability::Capability;
use crate::reference::Ref;

/// Existence marker key; its value holds the owner
pub fn marker(reference: &Ref) -> String {
    format!("marker:{reference}")
}

/// ACL set key for one capability
pub fn acl(reference: &Ref, capability: Capability) -> String {
    format!("acl:{capability}:{reference}")
}

/// Link set key of a collection
pub fn links(collection: &Ref) -> String {
    format!("links:{collection}")
}

/// Every key the fast store may hold for `reference`
pub fn all_for(reference: &Ref) -> Vec<String> {
    let mut keys = vec![marker(reference), links(reference)];
    keys.extend(Capability::ALL.iter().map(|cap| acl(reference, *cap)));
    keys
}
