//! dbt catalog.json parsing
//!
//! The diff engine only needs to know whether an environment supplied
//! column/type metadata at all, but the column map is kept so consumers
//! can render profile diffs later.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// dbt catalog.json structure (subset)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog entries for model-like nodes, keyed by unique_id
    #[serde(default)]
    pub nodes: HashMap<String, CatalogTable>,

    /// Catalog entries for sources, keyed by unique_id
    #[serde(default)]
    pub sources: HashMap<String, CatalogTable>,
}

impl Catalog {
    /// Load catalog from file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_str(&contents)
    }

    /// Parse catalog from JSON string
    pub fn from_str(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(|e| CatalogError::ParseError(e.to_string()))
    }

    /// True when the catalog carries any column metadata
    pub fn has_columns(&self) -> bool {
        self.nodes
            .values()
            .chain(self.sources.values())
            .any(|table| !table.columns.is_empty())
    }
}

/// One table's catalog entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogTable {
    /// Columns keyed by name
    #[serde(default)]
    pub columns: HashMap<String, CatalogColumn>,
}

/// Column metadata from the warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: String,

    #[serde(default)]
    pub index: Option<u32>,
}

/// Catalog parsing errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse catalog JSON: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_catalog_columns() {
        let catalog = Catalog::from_str(
            r#"{
                "nodes": {
                    "model.demo.orders": {
                        "columns": {
                            "id": {"name": "id", "type": "INTEGER", "index": 1},
                            "amount": {"name": "amount", "type": "NUMERIC", "index": 2}
                        }
                    }
                }
            }"#,
        )
        .unwrap();

        assert!(catalog.has_columns());
        let orders = &catalog.nodes["model.demo.orders"];
        assert_eq!(orders.columns["id"].data_type, "INTEGER");
    }

    #[test]
    fn empty_catalog_has_no_columns() {
        let catalog = Catalog::from_str("{}").unwrap();
        assert!(!catalog.has_columns());
    }
}
