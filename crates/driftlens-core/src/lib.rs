//! Driftlens Core
//!
//! Shared domain types for the lineage diff engine: node identity,
//! provenance, change classification, and environment snapshots.
//! These types are stable across crates - the graph builder, the run
//! orchestrator, and the CLI all speak in terms of them.

pub mod config;
pub mod env;
pub mod types;

pub use config::{Config, ConfigError};
pub use env::{EnvInput, NodePayload};
pub use types::{ChangeStatus, NodeId, Provenance};
