//! Stable ordering of generated endpoints.
//!
//! Paths are grouped by primary resource, then by relationship, with the
//! related-resource endpoint (`/{type}/{id}/{rel}`) ahead of its
//! relationship endpoint (`/{type}/{id}/relationships/{rel}`). Entries with
//! equal keys keep their insertion order.

use crate::paths::PathEntry;

/// Sort key extracted from a path pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EndpointSortKey {
    pub resource: String,
    /// Empty when the path is not about a relationship.
    pub relationship: String,
    pub is_relationship_path: bool,
}

impl EndpointSortKey {
    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (resource, relationship, is_relationship_path) = match segments.as_slice() {
            [resource, _, "relationships", relationship, ..] => (*resource, *relationship, true),
            [resource, _, relationship, ..] => (*resource, *relationship, false),
            [resource, ..] => (*resource, "", false),
            [] => ("", "", false),
        };
        Self {
            resource: resource.to_string(),
            relationship: relationship.to_string(),
            is_relationship_path,
        }
    }
}

pub struct EndpointOrderingPass;

impl EndpointOrderingPass {
    /// Sorts `entries` in place. The sort is stable.
    pub fn apply(entries: &mut [PathEntry]) {
        entries.sort_by_cached_key(|entry| EndpointSortKey::from_path(&entry.path));
    }
}
