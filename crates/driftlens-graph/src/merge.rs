//! Graph diff builder
//!
//! Merges the base and current environments' dependency graphs into a
//! single provenance-annotated graph. Parent-map keys are the
//! authoritative node universe; node payloads from the manifest are
//! attached where available. Edges are wired in a second pass once every
//! node exists, and their provenance is computed independently of their
//! endpoints'.

use crate::types::{edge_id, CatalogExistence, LineageEdge, LineageNode, MergedGraph};
use driftlens_core::{ChangeStatus, EnvInput, NodePayload, Provenance};
use std::collections::BTreeMap;
use tracing::warn;

/// Which side of the diff a pass is processing
#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Base,
    Current,
}

/// Build the merged graph for a (base, current) input pair.
///
/// Pure function of its inputs; the returned graph is immutable. A new
/// base or current selection means rebuilding from scratch.
pub fn build_merged_graph(base: &EnvInput, current: &EnvInput) -> MergedGraph {
    let mut graph = MergedGraph::new(CatalogExistence {
        base: base.has_catalog,
        current: current.has_catalog,
    });

    // Pass 1: nodes, base side first, then current upgrades/creates.
    for child in base.parent_map.keys() {
        add_node(&mut graph, child, base.nodes.get(child), Side::Base);
    }
    for child in current.parent_map.keys() {
        add_node(&mut graph, child, current.nodes.get(child), Side::Current);
    }

    // Pass 2: edges, only after every node exists.
    wire_edges(&mut graph, &base.parent_map, Side::Base);
    wire_edges(&mut graph, &current.parent_map, Side::Current);

    // Pass 3: change classification and the modified set.
    classify(&mut graph);

    graph
}

fn add_node(graph: &mut MergedGraph, id: &str, payload: Option<&NodePayload>, side: Side) {
    if let Some(node) = graph.node_mut(id) {
        if side == Side::Current {
            node.provenance = node.provenance.merge_current();
            if let Some(payload) = payload {
                node.name = payload.name.clone();
                node.resource_type = payload.resource_type.clone();
                node.package_name = payload.package_name.clone();
                node.current = Some(payload.clone());
            }
        }
        return;
    }

    let provenance = match side {
        Side::Base => Provenance::BaseOnly,
        Side::Current => Provenance::CurrentOnly,
    };

    let mut node = LineageNode {
        id: id.to_string(),
        // Fall back to the id when the manifest has no payload for this key
        name: payload.map(|p| p.name.clone()).unwrap_or_else(|| id.to_string()),
        resource_type: payload.map(|p| p.resource_type.clone()).unwrap_or_default(),
        package_name: payload.map(|p| p.package_name.clone()).unwrap_or_default(),
        base: None,
        current: None,
        provenance,
        change_status: None,
        parents: BTreeMap::new(),
        children: BTreeMap::new(),
    };

    match side {
        Side::Base => node.base = payload.cloned(),
        Side::Current => node.current = payload.cloned(),
    }

    graph.insert_node(node);
}

fn wire_edges(graph: &mut MergedGraph, parent_map: &BTreeMap<String, Vec<String>>, side: Side) {
    for (child, parents) in parent_map {
        for parent in parents {
            // Stale manifests reference parents that never appear as
            // parent-map keys; those nodes don't exist, so skip the edge.
            if !graph.contains_node(parent) || !graph.contains_node(child) {
                warn!(%parent, %child, "dangling parent-map reference, skipping edge");
                continue;
            }

            let id = edge_id(parent, child);

            if let Some(edge) = graph.edge_mut(&id) {
                if side == Side::Current {
                    edge.provenance = edge.provenance.merge_current();
                }
                continue;
            }

            let provenance = match side {
                Side::Base => Provenance::BaseOnly,
                Side::Current => Provenance::CurrentOnly,
            };

            graph.insert_edge(LineageEdge {
                id: id.clone(),
                parent_id: parent.clone(),
                child_id: child.clone(),
                provenance,
                change_status: None,
            });

            if let Some(node) = graph.node_mut(child) {
                node.parents.insert(parent.clone(), id.clone());
            }
            if let Some(node) = graph.node_mut(parent) {
                node.children.insert(child.clone(), id.clone());
            }
        }
    }
}

fn classify(graph: &mut MergedGraph) {
    let order: Vec<String> = graph.node_order().to_vec();
    let mut modified_set = Vec::new();

    for id in &order {
        let Some(node) = graph.node_mut(id) else { continue };

        node.change_status = ChangeStatus::for_node(
            node.provenance,
            node.base.as_ref().and_then(|p| p.checksum.as_deref()),
            node.current.as_ref().and_then(|p| p.checksum.as_deref()),
        );

        if node.change_status.is_some() {
            modified_set.push(id.clone());
        }
    }

    let edge_ids: Vec<String> = graph.edges().map(|e| e.id.clone()).collect();
    for id in edge_ids {
        if let Some(edge) = graph.edge_mut(&id) {
            edge.change_status = ChangeStatus::for_edge(edge.provenance);
        }
    }

    graph.modified_set = modified_set;
}
