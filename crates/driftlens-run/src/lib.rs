//! Multi-node run orchestration
//!
//! Dispatches diagnostic runs (row-count diff, value diff, ...) across a
//! set of selected lineage nodes, either one run per node or a single
//! batched run, and tracks per-node status through submission, polling,
//! and cooperative cancellation. The run-submission backend is a trait
//! boundary; only a scripted mock lives in-tree.

pub mod client;
pub mod mock;
pub mod orchestrator;
pub mod run;

pub use client::{ClientError, RunClient};
pub use mock::MockRunClient;
pub use orchestrator::{
    ActionEvents, ActionState, ActionStatus, DispatchMode, NodeAction, NodeParams, NodeStatus,
    Orchestrator, OrchestratorError, RunPlan, SelectedNode,
};
pub use run::{Progress, Run};
