//! Run submission trait boundary
//!
//! The orchestrator drives any backend implementing `RunClient`. The
//! production HTTP client lives outside this workspace; the in-tree
//! implementation is the scripted mock used by tests.

use crate::run::Run;
use serde_json::Value;
use std::time::Duration;

/// Errors from the submission backend
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Submission rejected: {0}")]
    SubmitRejected(String),

    #[error("Unknown run: {0}")]
    UnknownRun(String),
}

/// Trait for backends that execute diagnostic runs
#[async_trait::async_trait]
pub trait RunClient: Send + Sync {
    /// Backend name for logging (e.g. "mock", "http")
    fn name(&self) -> &'static str;

    /// Enqueue a run and return its id.
    ///
    /// With `nowait` the call must return as soon as the job is queued,
    /// never blocking for job completion.
    async fn submit_run(
        &self,
        run_type: &str,
        params: &Value,
        nowait: bool,
    ) -> Result<String, ClientError>;

    /// Fetch the latest snapshot of a run.
    ///
    /// `interval_hint` tells long-polling backends how long the caller
    /// waits between polls; simple backends may ignore it.
    async fn poll_run(&self, run_id: &str, interval_hint: Duration) -> Result<Run, ClientError>;

    /// Best-effort cancel; the server may ignore it if already terminal.
    async fn cancel_run(&self, run_id: &str) -> Result<(), ClientError>;
}
