//! Merged lineage graph types
//!
//! The graph is an arena: nodes and edges live in id-keyed maps owned by
//! `MergedGraph`, and adjacency is stored as id references rather than
//! live object pointers. Removing or detaching anything is not supported;
//! the graph is built once per (base, current) pair and immutable after.

use driftlens_core::{ChangeStatus, NodeId, NodePayload, Provenance};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Edge identifier: `{parent_id}_{child_id}`
pub type EdgeId = String;

/// Compose the canonical edge id for a parent/child pair
pub fn edge_id(parent_id: &str, child_id: &str) -> EdgeId {
    format!("{}_{}", parent_id, child_id)
}

/// A node in the merged graph
#[derive(Debug, Clone, Serialize)]
pub struct LineageNode {
    /// Stable identifier shared across environments
    pub id: NodeId,

    /// Display name
    pub name: String,

    /// Resource kind (model, seed, snapshot, source, ...)
    pub resource_type: String,

    /// Owning package
    pub package_name: String,

    /// Base environment's payload, if present there
    pub base: Option<NodePayload>,

    /// Current environment's payload, if present there
    pub current: Option<NodePayload>,

    /// Which environment(s) contributed this node
    pub provenance: Provenance,

    /// Change classification; `None` means unchanged
    pub change_status: Option<ChangeStatus>,

    /// Incoming edges, keyed by the parent node's id
    pub parents: BTreeMap<NodeId, EdgeId>,

    /// Outgoing edges, keyed by the child node's id
    pub children: BTreeMap<NodeId, EdgeId>,
}

/// An edge in the merged graph
///
/// Endpoints are ids into the graph's node arena, never owned references.
#[derive(Debug, Clone, Serialize)]
pub struct LineageEdge {
    pub id: EdgeId,
    pub parent_id: NodeId,
    pub child_id: NodeId,
    pub provenance: Provenance,

    /// Added/removed mirroring provenance; `None` for edges in both sides
    pub change_status: Option<ChangeStatus>,
}

/// Whether each environment supplied catalog metadata (independent of the diff)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogExistence {
    pub base: bool,
    pub current: bool,
}

/// The merged, provenance-annotated lineage graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergedGraph {
    nodes: HashMap<NodeId, LineageNode>,
    edges: HashMap<EdgeId, LineageEdge>,

    /// Node ids in insertion order (base pass first, then current-only)
    node_order: Vec<NodeId>,

    /// Ids of nodes with a non-unchanged status, in insertion order
    pub modified_set: Vec<NodeId>,

    /// Per-environment catalog availability
    pub catalog_existence: CatalogExistence,
}

impl MergedGraph {
    pub(crate) fn new(catalog_existence: CatalogExistence) -> Self {
        Self {
            catalog_existence,
            ..Default::default()
        }
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&LineageNode> {
        self.nodes.get(id)
    }

    /// Look up an edge by id
    pub fn edge(&self, id: &str) -> Option<&LineageEdge> {
        self.edges.get(id)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &LineageNode> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// All edges (no ordering guarantee)
    pub fn edges(&self) -> impl Iterator<Item = &LineageEdge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Parent ids of a node; unknown ids yield nothing
    pub fn parent_ids(&self, id: &str) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|n| n.parents.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Child ids of a node; unknown ids yield nothing
    pub fn child_ids(&self, id: &str) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|n| n.children.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub(crate) fn insert_node(&mut self, node: LineageNode) {
        self.node_order.push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut LineageNode> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn edge_mut(&mut self, id: &str) -> Option<&mut LineageEdge> {
        self.edges.get_mut(id)
    }

    pub(crate) fn insert_edge(&mut self, edge: LineageEdge) {
        self.edges.insert(edge.id.clone(), edge);
    }

    pub(crate) fn node_order(&self) -> &[NodeId] {
        &self.node_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_id_format() {
        assert_eq!(edge_id("model.demo.a", "model.demo.b"), "model.demo.a_model.demo.b");
    }

    #[test]
    fn unknown_ids_have_no_neighbors() {
        let graph = MergedGraph::default();
        assert!(graph.parent_ids("model.demo.ghost").is_empty());
        assert!(graph.child_ids("model.demo.ghost").is_empty());
    }
}
