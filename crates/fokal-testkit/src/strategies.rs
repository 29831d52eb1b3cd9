//! Proptest strategies for references and tags

use fokal_core::Ref;
use proptest::prelude::*;

/// Well-formed image references
pub fn image_ref() -> impl Strategy<Value = Ref> {
    "[a-zA-Z]{12}".prop_map(Ref::image)
}

/// Well-formed collection references
pub fn collection_ref() -> impl Strategy<Value = Ref> {
    any::<u32>().prop_map(|id| Ref::collection(id.to_string()))
}

/// Non-empty tags that pass body validation under default limits
pub fn tag() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,30}"
}

/// Lists of tags with repeats likely
pub fn tag_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(vec!["ocean", "sunset", "dusk", "Ocean"]), 0..8)
        .prop_map(|tags| tags.into_iter().map(String::from).collect())
}
