//! Manifest + catalog -> environment input for the graph diff builder

use crate::catalog::Catalog;
use crate::manifest::{Manifest, ManifestNode};
use driftlens_core::{EnvInput, NodePayload};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Assemble one environment's diff input from its artifacts.
///
/// The parent map defines the node universe; payloads are attached for
/// every parent-map key the manifest has a node or source entry for.
/// `has_catalog` means the catalog actually carried column metadata; a
/// missing or empty catalog reads as false. The diff itself never
/// depends on it.
pub fn env_input(manifest: &Manifest, catalog: Option<&Catalog>) -> EnvInput {
    let mut nodes = BTreeMap::new();
    let mut parent_map = BTreeMap::new();

    for (child, parents) in &manifest.parent_map {
        parent_map.insert(child.clone(), parents.clone());

        if let Some(node) = manifest.get_node(child) {
            nodes.insert(child.clone(), payload_for(node));
        }
    }

    EnvInput {
        nodes,
        parent_map,
        has_catalog: catalog.is_some_and(Catalog::has_columns),
    }
}

fn payload_for(node: &ManifestNode) -> NodePayload {
    let checksum = node
        .checksum
        .as_ref()
        .map(|c| c.checksum.clone())
        .or_else(|| node.raw_code.as_deref().map(raw_code_checksum));

    NodePayload {
        name: node.name.clone(),
        resource_type: node.resource_type.clone(),
        package_name: node.package_name.clone(),
        checksum,
    }
}

/// Fallback checksum over raw model code for manifests that predate
/// per-node checksums (dbt < 0.21 state artifacts).
fn raw_code_checksum(raw_code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_code.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::FileChecksum;
    use std::collections::HashMap;

    fn manifest_with(nodes: Vec<ManifestNode>, parent_map: Vec<(&str, Vec<&str>)>) -> Manifest {
        Manifest {
            metadata: Default::default(),
            nodes: nodes
                .into_iter()
                .map(|n| (n.unique_id.clone(), n))
                .collect(),
            sources: HashMap::new(),
            parent_map: parent_map
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
                .collect(),
        }
    }

    fn node(id: &str, checksum: Option<&str>, raw_code: Option<&str>) -> ManifestNode {
        ManifestNode {
            unique_id: id.to_string(),
            name: id.rsplit('.').next().unwrap().to_string(),
            resource_type: "model".to_string(),
            package_name: "demo".to_string(),
            checksum: checksum.map(|c| FileChecksum {
                name: "sha256".to_string(),
                checksum: c.to_string(),
            }),
            raw_code: raw_code.map(String::from),
        }
    }

    #[test]
    fn payloads_attach_for_parent_map_keys() {
        let manifest = manifest_with(
            vec![node("model.demo.a", Some("v1"), None)],
            vec![("model.demo.a", vec![]), ("model.demo.b", vec!["model.demo.a"])],
        );

        let env = env_input(&manifest, None);

        assert_eq!(env.parent_map.len(), 2);
        // b has no manifest entry, so no payload
        assert_eq!(env.nodes.len(), 1);
        assert_eq!(env.nodes["model.demo.a"].checksum.as_deref(), Some("v1"));
    }

    #[test]
    fn raw_code_fallback_checksum() {
        let manifest = manifest_with(
            vec![
                node("model.demo.a", None, Some("select 1")),
                node("model.demo.b", None, Some("select 1")),
                node("model.demo.c", None, Some("select 2")),
            ],
            vec![
                ("model.demo.a", vec![]),
                ("model.demo.b", vec![]),
                ("model.demo.c", vec![]),
            ],
        );

        let env = env_input(&manifest, None);

        let a = env.nodes["model.demo.a"].checksum.clone().unwrap();
        let b = env.nodes["model.demo.b"].checksum.clone().unwrap();
        let c = env.nodes["model.demo.c"].checksum.clone().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn catalog_counts_only_when_it_carries_columns() {
        let manifest = manifest_with(vec![], vec![]);
        assert!(!env_input(&manifest, None).has_catalog);

        // An empty catalog artifact supplied no column metadata
        assert!(!env_input(&manifest, Some(&Catalog::default())).has_catalog);

        let catalog = Catalog::from_str(
            r#"{
                "nodes": {
                    "model.demo.a": {
                        "columns": {"id": {"name": "id", "type": "INTEGER"}}
                    }
                }
            }"#,
        )
        .unwrap();
        assert!(env_input(&manifest, Some(&catalog)).has_catalog);
    }
}
