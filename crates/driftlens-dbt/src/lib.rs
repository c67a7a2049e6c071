//! dbt artifact loading for driftlens
//!
//! Parses the subset of manifest.json and catalog.json the lineage diff
//! engine cares about, and assembles them into per-environment inputs.

pub mod catalog;
pub mod env;
pub mod manifest;

pub use catalog::{Catalog, CatalogError};
pub use env::env_input;
pub use manifest::{FileChecksum, Manifest, ManifestError, ManifestMetadata, ManifestNode};
