//! Lineage graph diff engine
//!
//! Merges two environments' dependency graphs into one graph annotated
//! with provenance and change status, and provides bounded-degree
//! upstream/downstream selection over the result.

pub mod merge;
pub mod select;
pub mod set;
pub mod types;

pub use merge::build_merged_graph;
pub use select::{select_downstream, select_upstream};
pub use set::{intersect, neighbor_set, union};
pub use types::{CatalogExistence, EdgeId, LineageEdge, LineageNode, MergedGraph};
