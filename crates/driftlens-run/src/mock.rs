//! Mock run client for testing
//!
//! Returns scripted run snapshots without talking to any server. Each
//! submission consumes the next script in the queue; each poll advances
//! that run one step, holding the final step once reached. Useful for:
//! - Unit testing orchestration logic (ordering, cancel, skip)
//! - Simulating slow runs, job failures, and transport errors

use crate::client::{ClientError, RunClient};
use crate::run::Run;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Record of one submission, kept for test assertions
#[derive(Debug, Clone)]
pub struct SubmittedRun {
    pub run_id: String,
    pub run_type: String,
    pub params: Value,
}

/// Scripted in-memory run client
///
/// Scripts are queues of `Run` snapshots (built with `Run::in_flight`,
/// `Run::succeeded`, `Run::failed`); the mock stamps the real run id onto
/// every step at submission time. A submission with no script queued
/// succeeds immediately on the first poll.
pub struct MockRunClient {
    scripts: Arc<RwLock<VecDeque<Vec<Run>>>>,
    runs: Arc<RwLock<HashMap<String, VecDeque<Run>>>>,
    submitted: Arc<RwLock<Vec<SubmittedRun>>>,
    canceled: Arc<RwLock<Vec<String>>>,
    next_id: AtomicUsize,
    fail_submit: bool,
    fail_poll: bool,
    latency_ms: u64,
}

impl MockRunClient {
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(RwLock::new(VecDeque::new())),
            runs: Arc::new(RwLock::new(HashMap::new())),
            submitted: Arc::new(RwLock::new(Vec::new())),
            canceled: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicUsize::new(1),
            fail_submit: false,
            fail_poll: false,
            latency_ms: 0,
        }
    }

    /// Fail every submission with a transport error
    pub fn with_submit_failure(mut self) -> Self {
        self.fail_submit = true;
        self
    }

    /// Fail every poll with a transport error
    pub fn with_poll_failure(mut self) -> Self {
        self.fail_poll = true;
        self
    }

    /// Simulate backend latency on every call
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Queue the script for the next submission
    pub async fn push_script(&self, steps: Vec<Run>) {
        self.scripts.write().await.push_back(steps);
    }

    /// All submissions so far, in order
    pub async fn submitted(&self) -> Vec<SubmittedRun> {
        self.submitted.read().await.clone()
    }

    /// Run ids cancel was requested for, in order
    pub async fn canceled(&self) -> Vec<String> {
        self.canceled.read().await.clone()
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
        }
    }
}

impl Default for MockRunClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RunClient for MockRunClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn submit_run(
        &self,
        run_type: &str,
        params: &Value,
        _nowait: bool,
    ) -> Result<String, ClientError> {
        self.simulate_latency().await;

        if self.fail_submit {
            return Err(ClientError::NetworkError("submit failed".to_string()));
        }

        let run_id = format!("run-{}", self.next_id.fetch_add(1, Ordering::SeqCst));

        let steps = self
            .scripts
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| vec![Run::succeeded("", json!({}))]);

        let steps: VecDeque<Run> = steps
            .into_iter()
            .map(|mut run| {
                run.run_id = run_id.clone();
                run
            })
            .collect();

        self.runs.write().await.insert(run_id.clone(), steps);
        self.submitted.write().await.push(SubmittedRun {
            run_id: run_id.clone(),
            run_type: run_type.to_string(),
            params: params.clone(),
        });

        Ok(run_id)
    }

    async fn poll_run(&self, run_id: &str, _interval_hint: Duration) -> Result<Run, ClientError> {
        self.simulate_latency().await;

        if self.fail_poll {
            return Err(ClientError::NetworkError("poll failed".to_string()));
        }

        let mut runs = self.runs.write().await;
        let steps = runs
            .get_mut(run_id)
            .ok_or_else(|| ClientError::UnknownRun(run_id.to_string()))?;

        // Advance one step per poll, holding the final snapshot
        if steps.len() > 1 {
            Ok(steps.pop_front().unwrap_or_else(|| Run::failed(run_id, "empty script")))
        } else {
            steps
                .front()
                .cloned()
                .ok_or_else(|| ClientError::UnknownRun(run_id.to_string()))
        }
    }

    async fn cancel_run(&self, run_id: &str) -> Result<(), ClientError> {
        self.simulate_latency().await;
        self.canceled.write().await.push(run_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HINT: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn scripted_run_advances_per_poll() {
        let client = MockRunClient::new();
        client
            .push_script(vec![
                Run::in_flight("", 25.0),
                Run::in_flight("", 75.0),
                Run::succeeded("", json!({"rows": 3})),
            ])
            .await;

        let run_id = client.submit_run("row_count_diff", &json!({}), true).await.unwrap();

        let first = client.poll_run(&run_id, HINT).await.unwrap();
        assert!(!first.is_terminal());
        assert_eq!(first.progress.unwrap().percentage, 25.0);

        client.poll_run(&run_id, HINT).await.unwrap();
        let last = client.poll_run(&run_id, HINT).await.unwrap();
        assert!(last.is_terminal());

        // Terminal snapshot holds
        let held = client.poll_run(&run_id, HINT).await.unwrap();
        assert_eq!(held, last);
    }

    #[tokio::test]
    async fn unscripted_submission_succeeds_immediately() {
        let client = MockRunClient::new();
        let run_id = client.submit_run("value_diff", &json!({}), true).await.unwrap();
        assert!(client.poll_run(&run_id, HINT).await.unwrap().is_terminal());
    }

    #[tokio::test]
    async fn unknown_run_is_an_error() {
        let client = MockRunClient::new();
        let err = client.poll_run("run-99", HINT).await.unwrap_err();
        assert!(matches!(err, ClientError::UnknownRun(_)));
    }

    #[tokio::test]
    async fn records_submissions_and_cancels() {
        let client = MockRunClient::new();
        let run_id = client
            .submit_run("profile_diff", &json!({"model": "orders"}), true)
            .await
            .unwrap();
        client.cancel_run(&run_id).await.unwrap();

        let submitted = client.submitted().await;
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].run_type, "profile_diff");
        assert_eq!(client.canceled().await, vec![run_id]);
    }
}
