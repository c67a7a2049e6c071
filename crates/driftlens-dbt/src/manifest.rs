//! dbt manifest.json parsing
//!
//! Parses dbt-generated manifest.json to extract nodes, sources,
//! checksums, and the parent map that defines the lineage graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// dbt manifest.json structure (subset of fields we care about)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Metadata about the manifest
    #[serde(default)]
    pub metadata: ManifestMetadata,

    /// Model, seed, snapshot and test nodes
    #[serde(default)]
    pub nodes: HashMap<String, ManifestNode>,

    /// Source definitions (same shape as nodes for our purposes)
    #[serde(default)]
    pub sources: HashMap<String, ManifestNode>,

    /// Parent map (node -> list of parent nodes)
    #[serde(default)]
    pub parent_map: HashMap<String, Vec<String>>,
}

impl Manifest {
    /// Load manifest from file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse manifest from JSON string
    pub fn from_str(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(|e| ManifestError::ParseError(e.to_string()))
    }

    /// Look up a node or source payload by unique_id
    pub fn get_node(&self, unique_id: &str) -> Option<&ManifestNode> {
        self.nodes
            .get(unique_id)
            .or_else(|| self.sources.get(unique_id))
    }
}

/// Manifest metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    #[serde(default)]
    pub dbt_schema_version: String,

    #[serde(default)]
    pub dbt_version: String,

    #[serde(default)]
    pub generated_at: String,

    #[serde(default)]
    pub invocation_id: Option<String>,
}

/// A node in the manifest (model, seed, snapshot, source, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    /// Unique identifier (e.g., "model.my_project.orders")
    pub unique_id: String,

    /// Node name (e.g., "orders")
    pub name: String,

    /// Resource type (model, seed, snapshot, source, ...)
    pub resource_type: String,

    /// Package name
    #[serde(default)]
    pub package_name: String,

    /// Content checksum computed by dbt at compile time
    #[serde(default)]
    pub checksum: Option<FileChecksum>,

    /// Raw model code, when the manifest includes it
    #[serde(default)]
    pub raw_code: Option<String>,
}

/// dbt file checksum (algorithm name + digest)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChecksum {
    #[serde(default)]
    pub name: String,

    pub checksum: String,
}

/// Manifest parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read manifest file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse manifest JSON: {0}")]
    ParseError(String),
}
