//! Environment snapshots consumed by the graph diff builder
//!
//! One `EnvInput` describes a single environment (base or current):
//! a node table keyed by unique_id, the parent map from the manifest,
//! and whether the environment supplied catalog (column/type) metadata.

use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-environment payload for a node
///
/// Opaque to the diff engine beyond the checksum; display fields are
/// carried through to the merged graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePayload {
    /// Display name (e.g. "orders")
    pub name: String,

    /// Resource kind (model, seed, snapshot, source, ...)
    pub resource_type: String,

    /// Owning dbt package
    pub package_name: String,

    /// Content checksum, if the environment supplied one
    #[serde(default)]
    pub checksum: Option<String>,
}

/// One environment's slice of the lineage graph
///
/// `BTreeMap` keeps iteration deterministic so the merged graph's node
/// ordering (and therefore `modified_set`) is stable across builds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvInput {
    /// Node payloads keyed by unique_id
    pub nodes: BTreeMap<NodeId, NodePayload>,

    /// Child id -> parent ids, as in the dbt manifest's parent_map
    pub parent_map: BTreeMap<NodeId, Vec<NodeId>>,

    /// Whether this environment supplied catalog metadata at all
    pub has_catalog: bool,
}

impl EnvInput {
    /// Build an input from a parent map alone, with no node payloads.
    ///
    /// Useful in tests and for stale artifacts where only lineage survived.
    pub fn from_parent_map(parent_map: BTreeMap<NodeId, Vec<NodeId>>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            parent_map,
            has_catalog: false,
        }
    }

    /// Number of nodes in this environment's universe (parent-map keys)
    pub fn len(&self) -> usize {
        self.parent_map.len()
    }

    /// True when the parent map is empty
    pub fn is_empty(&self) -> bool {
        self.parent_map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_map_is_the_node_universe() {
        let mut parent_map = BTreeMap::new();
        parent_map.insert("model.demo.a".to_string(), vec![]);
        parent_map.insert("model.demo.b".to_string(), vec!["model.demo.a".to_string()]);

        let env = EnvInput::from_parent_map(parent_map);
        assert_eq!(env.len(), 2);
        assert!(env.nodes.is_empty());
        assert!(!env.has_catalog);
    }
}
