//! Provenance and change classification for merged lineage graphs

use serde::{Deserialize, Serialize};

/// Node identifier (unique_id from the dbt manifest, stable across environments)
pub type NodeId = String;

/// Which environment(s) contributed a node or edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Present only in the base environment
    BaseOnly,

    /// Present only in the current environment
    CurrentOnly,

    /// Present in both environments
    Both,
}

impl Provenance {
    /// Upgrade base-only provenance when the current environment also
    /// contributes the same node or edge.
    pub fn merge_current(self) -> Self {
        match self {
            Provenance::BaseOnly | Provenance::Both => Provenance::Both,
            Provenance::CurrentOnly => Provenance::CurrentOnly,
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::BaseOnly => write!(f, "base-only"),
            Provenance::CurrentOnly => write!(f, "current-only"),
            Provenance::Both => write!(f, "both"),
        }
    }
}

/// How a node or edge changed between base and current
///
/// Unchanged nodes and edges carry no change status at all (`None` on the
/// owning type), so this enum only covers the interesting cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    /// Only in current (new model, new edge)
    Added,

    /// Only in base (deleted model, dropped edge)
    Removed,

    /// In both environments with differing checksums (nodes only)
    Modified,
}

impl ChangeStatus {
    /// Derive a node's change status from its provenance and the two
    /// environments' checksums.
    ///
    /// Added iff current-only, removed iff base-only; a node present in
    /// both environments is modified only when both checksums exist and
    /// differ. Anything else is unchanged (`None`).
    pub fn for_node(
        provenance: Provenance,
        base_checksum: Option<&str>,
        current_checksum: Option<&str>,
    ) -> Option<Self> {
        match provenance {
            Provenance::CurrentOnly => Some(ChangeStatus::Added),
            Provenance::BaseOnly => Some(ChangeStatus::Removed),
            Provenance::Both => match (base_checksum, current_checksum) {
                (Some(base), Some(current)) if base != current => Some(ChangeStatus::Modified),
                _ => None,
            },
        }
    }

    /// Derive an edge's change status from its provenance alone.
    ///
    /// Edges have no content of their own, so they are never modified:
    /// added iff current-only, removed iff base-only.
    pub fn for_edge(provenance: Provenance) -> Option<Self> {
        match provenance {
            Provenance::CurrentOnly => Some(ChangeStatus::Added),
            Provenance::BaseOnly => Some(ChangeStatus::Removed),
            Provenance::Both => None,
        }
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeStatus::Added => write!(f, "added"),
            ChangeStatus::Removed => write!(f, "removed"),
            ChangeStatus::Modified => write!(f, "modified"),
        }
    }
}
