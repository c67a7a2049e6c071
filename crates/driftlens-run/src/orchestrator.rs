//! Multi-node action orchestrator
//!
//! One orchestration invocation applies a single run type to a list of
//! selected nodes, either per node (strictly sequential submissions) or
//! as one batched run. State is published as immutable snapshots through
//! a watch channel; consumers observe, never mutate. Cancellation is
//! cooperative: the loop notices a cancel request only at node/batch
//! boundaries, and an in-flight run is polled to its terminal state.

use crate::client::{ClientError, RunClient};
use crate::run::Run;
use driftlens_core::{Config, NodeId};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How runs are dispatched across the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// One run per node, submitted sequentially
    PerNode,

    /// One batched run covering every candidate node
    MultiNodes,
}

/// Orchestration-level status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Running,
    Canceling,
    Canceled,
    Completed,
}

/// Node-level status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Running,
    Success,
    Failure,
    Skipped,
}

/// Per-node bookkeeping for one orchestration invocation
#[derive(Debug, Clone, Serialize)]
pub struct NodeAction {
    pub status: NodeStatus,
    pub skip_reason: Option<String>,

    /// Latest run snapshot seen for this node
    pub run: Option<Run>,
}

impl NodeAction {
    fn pending() -> Self {
        Self {
            status: NodeStatus::Pending,
            skip_reason: None,
            run: None,
        }
    }
}

/// Snapshot of one orchestration invocation
#[derive(Debug, Clone, Serialize)]
pub struct ActionState {
    pub mode: DispatchMode,
    pub run_type: String,
    pub status: ActionStatus,

    /// Nodes settled so far (success, failure, or skip)
    pub completed: usize,

    /// Units of work: node count per-node, 1 for a batch
    pub total: usize,

    /// Id of the most recently submitted run
    pub current_run: Option<String>,

    pub actions: BTreeMap<NodeId, NodeAction>,
}

impl ActionState {
    fn idle() -> Self {
        Self {
            mode: DispatchMode::PerNode,
            run_type: String::new(),
            status: ActionStatus::Pending,
            completed: 0,
            total: 0,
            current_run: None,
            actions: BTreeMap::new(),
        }
    }

    /// True once the invocation can no longer make progress
    pub fn is_settled(&self) -> bool {
        matches!(self.status, ActionStatus::Completed | ActionStatus::Canceled)
    }
}

/// A node chosen for orchestration
///
/// Carries just enough metadata for param builders; the orchestrator
/// itself only cares about the id.
#[derive(Debug, Clone)]
pub struct SelectedNode {
    pub id: NodeId,
    pub name: String,
    pub resource_type: String,
    pub package_name: String,
}

impl SelectedNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource_type: "model".to_string(),
            package_name: String::new(),
        }
    }
}

/// Outcome of a per-node params builder
pub enum NodeParams {
    /// Submit a run with these params
    Submit(Value),

    /// Don't submit; mark the node skipped with this reason
    Skip(String),
}

type PerNodeParamsFn = dyn Fn(&SelectedNode) -> NodeParams + Send + Sync;
type SkipFn = dyn Fn(&SelectedNode) -> Option<String> + Send + Sync;
type BatchParamsFn = dyn Fn(&[SelectedNode]) -> Value + Send + Sync;

/// Dispatch strategy plus the caller's param builders
pub enum RunPlan {
    PerNode {
        params: Box<PerNodeParamsFn>,
    },
    MultiNodes {
        skip: Box<SkipFn>,
        params: Box<BatchParamsFn>,
    },
}

impl RunPlan {
    /// Per-node dispatch: each node independently yields params or a skip reason
    pub fn per_node<F>(params: F) -> Self
    where
        F: Fn(&SelectedNode) -> NodeParams + Send + Sync + 'static,
    {
        RunPlan::PerNode { params: Box::new(params) }
    }

    /// Batched dispatch: a per-node skip predicate plus one params build
    /// over the full candidate list
    pub fn multi_nodes<S, F>(skip: S, params: F) -> Self
    where
        S: Fn(&SelectedNode) -> Option<String> + Send + Sync + 'static,
        F: Fn(&[SelectedNode]) -> Value + Send + Sync + 'static,
    {
        RunPlan::MultiNodes {
            skip: Box::new(skip),
            params: Box::new(params),
        }
    }

    fn mode(&self) -> DispatchMode {
        match self {
            RunPlan::PerNode { .. } => DispatchMode::PerNode,
            RunPlan::MultiNodes { .. } => DispatchMode::MultiNodes,
        }
    }
}

/// Callbacks invoked synchronously at each state change
pub trait ActionEvents: Send + Sync {
    fn on_started(&self, _state: &ActionState) {}
    fn on_node_updated(&self, _node_id: &str, _action: &NodeAction) {}
    fn on_completed(&self, _state: &ActionState) {}
}

struct NoopEvents;

impl ActionEvents for NoopEvents {}

/// Errors from starting an orchestration
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("No nodes selected")]
    EmptySelection,

    #[error("An orchestration is already in flight")]
    AlreadyRunning,
}

/// Drives diagnostic runs across a node selection
pub struct Orchestrator<C: RunClient + 'static> {
    client: Arc<C>,
    events: Arc<dyn ActionEvents>,
    poll_interval: Duration,
    state: Arc<watch::Sender<ActionState>>,
    busy: Arc<AtomicBool>,
}

impl<C: RunClient + 'static> Orchestrator<C> {
    pub fn new(client: Arc<C>) -> Self {
        let (state, _) = watch::channel(ActionState::idle());
        Self {
            client,
            events: Arc::new(NoopEvents),
            poll_interval: Duration::from_secs(2),
            state: Arc::new(state),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register callbacks for state changes
    pub fn with_events(mut self, events: Arc<dyn ActionEvents>) -> Self {
        self.events = events;
        self
    }

    /// Override the 2s default poll cadence
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Apply the poll cadence from a driftlens.toml config
    pub fn with_config(self, config: &Config) -> Self {
        self.with_poll_interval(Duration::from_secs(config.poll_interval_secs))
    }

    /// The cadence runs are polled at
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Start an orchestration over `nodes`.
    ///
    /// Resets any previous invocation's state and returns immediately;
    /// the invocation runs on a spawned task. Fails fast on an empty
    /// selection or when an invocation is already in flight.
    pub fn start(
        &self,
        nodes: Vec<SelectedNode>,
        run_type: impl Into<String>,
        plan: RunPlan,
    ) -> Result<(), OrchestratorError> {
        if nodes.is_empty() {
            return Err(OrchestratorError::EmptySelection);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(OrchestratorError::AlreadyRunning);
        }

        let run_type = run_type.into();
        let total = match plan.mode() {
            DispatchMode::PerNode => nodes.len(),
            DispatchMode::MultiNodes => 1,
        };

        // Fresh ActionState; the previous invocation's is discarded here.
        let fresh = ActionState {
            mode: plan.mode(),
            run_type: run_type.clone(),
            status: ActionStatus::Pending,
            completed: 0,
            total,
            current_run: None,
            actions: nodes
                .iter()
                .map(|n| (n.id.clone(), NodeAction::pending()))
                .collect(),
        };
        self.state.send_replace(fresh);

        let driver = Driver {
            client: Arc::clone(&self.client),
            events: Arc::clone(&self.events),
            state: Arc::clone(&self.state),
            poll_interval: self.poll_interval,
            busy: Arc::clone(&self.busy),
        };

        tokio::spawn(async move {
            driver.drive(nodes, run_type, plan).await;
        });

        Ok(())
    }

    /// Request cooperative cancellation.
    ///
    /// Moves Running -> Canceling and forwards a best-effort cancel to the
    /// in-flight run. No-op in any other status. The loop resolves to
    /// Canceled at its next node/batch boundary.
    pub async fn cancel(&self) {
        let mut requested = false;
        self.state.send_if_modified(|s| {
            if s.status == ActionStatus::Running {
                s.status = ActionStatus::Canceling;
                requested = true;
                true
            } else {
                false
            }
        });

        if !requested {
            return;
        }

        let current_run = self.state.borrow().current_run.clone();
        if let Some(run_id) = current_run {
            info!(%run_id, "forwarding cancel to in-flight run");
            if let Err(err) = self.client.cancel_run(&run_id).await {
                warn!(%run_id, error = %err, "cancel request failed");
            }
        }
    }

    /// Point-in-time copy of the invocation state
    pub fn snapshot(&self) -> ActionState {
        self.state.borrow().clone()
    }

    /// Subscribe to state snapshots (one per transition)
    pub fn subscribe(&self) -> watch::Receiver<ActionState> {
        self.state.subscribe()
    }

    /// Wait until the current invocation settles (Completed or Canceled)
    pub async fn wait_settled(&self) {
        let mut rx = self.state.subscribe();
        loop {
            if rx.borrow().is_settled() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// The spawned side of one invocation; the only writer of ActionState
struct Driver<C> {
    client: Arc<C>,
    events: Arc<dyn ActionEvents>,
    state: Arc<watch::Sender<ActionState>>,
    poll_interval: Duration,
    busy: Arc<AtomicBool>,
}

impl<C: RunClient> Driver<C> {
    async fn drive(&self, nodes: Vec<SelectedNode>, run_type: String, plan: RunPlan) {
        info!(
            %run_type,
            nodes = nodes.len(),
            client = self.client.name(),
            "orchestration started"
        );

        self.update(|s| s.status = ActionStatus::Running);
        let started = self.state.borrow().clone();
        self.events.on_started(&started);

        match plan {
            RunPlan::PerNode { params } => self.drive_per_node(&nodes, &run_type, &*params).await,
            RunPlan::MultiNodes { skip, params } => {
                self.drive_multi_nodes(&nodes, &run_type, &*skip, &*params).await
            }
        }

        let snapshot = self.state.borrow().clone();
        info!(status = ?snapshot.status, completed = snapshot.completed, "orchestration settled");
        self.events.on_completed(&snapshot);
        self.busy.store(false, Ordering::SeqCst);
    }

    async fn drive_per_node(
        &self,
        nodes: &[SelectedNode],
        run_type: &str,
        build: &PerNodeParamsFn,
    ) {
        for node in nodes {
            // Cancellation checkpoint: only at the loop boundary, so the
            // node currently in flight always settles first.
            if self.status() == ActionStatus::Canceling {
                self.update(|s| s.status = ActionStatus::Canceled);
                return;
            }

            match build(node) {
                NodeParams::Skip(reason) => {
                    debug!(node = %node.id, %reason, "skipping node");
                    self.update_node(&node.id, |a| {
                        a.status = NodeStatus::Skipped;
                        a.skip_reason = Some(reason);
                    });
                }
                NodeParams::Submit(params) => {
                    self.update_node(&node.id, |a| a.status = NodeStatus::Running);

                    // A transport error leaves the node non-terminal for this
                    // attempt; siblings and the completion signal still advance.
                    if let Err(err) = self
                        .run_to_terminal(std::slice::from_ref(&node.id), run_type, &params)
                        .await
                    {
                        warn!(node = %node.id, error = %err, "run did not reach a terminal state");
                    }
                }
            }

            self.update(|s| s.completed += 1);
        }

        // A cancel that arrived while the final node was in flight still
        // resolves to Canceled; Canceling never settles as Completed.
        if self.status() == ActionStatus::Canceling {
            self.update(|s| s.status = ActionStatus::Canceled);
        } else {
            self.update(|s| s.status = ActionStatus::Completed);
        }
    }

    async fn drive_multi_nodes(
        &self,
        nodes: &[SelectedNode],
        run_type: &str,
        skip: &SkipFn,
        build: &BatchParamsFn,
    ) {
        let mut candidates = Vec::new();
        for node in nodes {
            match skip(node) {
                Some(reason) => {
                    debug!(node = %node.id, %reason, "skipping node");
                    self.update_node(&node.id, |a| {
                        a.status = NodeStatus::Skipped;
                        a.skip_reason = Some(reason);
                    });
                }
                None => candidates.push(node.clone()),
            }
        }

        if !candidates.is_empty() {
            let params = build(&candidates);
            let ids: Vec<NodeId> = candidates.iter().map(|n| n.id.clone()).collect();
            for id in &ids {
                self.update_node(id, |a| a.status = NodeStatus::Running);
            }

            if let Err(err) = self.run_to_terminal(&ids, run_type, &params).await {
                warn!(error = %err, "batched run did not reach a terminal state");
            }
        }

        // The whole batch is one unit of work
        self.update(|s| s.completed += 1);

        if self.status() == ActionStatus::Canceling {
            self.update(|s| s.status = ActionStatus::Canceled);
        } else {
            self.update(|s| s.status = ActionStatus::Completed);
        }
    }

    /// Submit one run and poll it to a terminal state, mirroring every
    /// snapshot onto all target nodes' actions.
    async fn run_to_terminal(
        &self,
        targets: &[NodeId],
        run_type: &str,
        params: &Value,
    ) -> Result<(), ClientError> {
        let run_id = self.client.submit_run(run_type, params, true).await?;
        debug!(%run_id, run_type, "run submitted");
        self.update(|s| s.current_run = Some(run_id.clone()));

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval fires immediately; consume the zeroth tick so the first
        // poll happens one interval after submission
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let run = self.client.poll_run(&run_id, self.poll_interval).await?;
            let status = if run.error.is_some() {
                NodeStatus::Failure
            } else if run.result.is_some() {
                NodeStatus::Success
            } else {
                NodeStatus::Running
            };

            for id in targets {
                let snapshot = run.clone();
                self.update_node(id, move |a| {
                    a.status = status;
                    a.run = Some(snapshot);
                });
            }

            if run.is_terminal() {
                debug!(%run_id, status = ?status, "run settled");
                return Ok(());
            }
        }
    }

    fn status(&self) -> ActionStatus {
        self.state.borrow().status
    }

    fn update(&self, f: impl FnOnce(&mut ActionState)) {
        self.state.send_modify(f);
    }

    fn update_node(&self, node_id: &str, f: impl FnOnce(&mut NodeAction)) {
        self.state.send_modify(|s| {
            if let Some(action) = s.actions.get_mut(node_id) {
                f(action);
            }
        });

        let action = self.state.borrow().actions.get(node_id).cloned();
        if let Some(action) = action {
            self.events.on_node_updated(node_id, &action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunClient;

    #[tokio::test]
    async fn empty_selection_fails_fast() {
        let orchestrator = Orchestrator::new(Arc::new(MockRunClient::new()));
        let err = orchestrator
            .start(vec![], "row_count_diff", RunPlan::per_node(|_| NodeParams::Submit(serde_json::json!({}))))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::EmptySelection));
    }

    #[tokio::test]
    async fn idle_state_before_any_invocation() {
        let orchestrator = Orchestrator::new(Arc::new(MockRunClient::new()));
        let state = orchestrator.snapshot();
        assert_eq!(state.status, ActionStatus::Pending);
        assert!(state.actions.is_empty());
        assert!(!state.is_settled());
    }

    #[tokio::test]
    async fn config_sets_the_poll_cadence() {
        let config = Config::from_toml("poll_interval_secs = 7").unwrap();
        let orchestrator = Orchestrator::new(Arc::new(MockRunClient::new())).with_config(&config);
        assert_eq!(orchestrator.poll_interval(), Duration::from_secs(7));

        let defaulted = Orchestrator::new(Arc::new(MockRunClient::new()))
            .with_config(&Config::default());
        assert_eq!(defaulted.poll_interval(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn cancel_before_start_is_a_noop() {
        let client = Arc::new(MockRunClient::new());
        let orchestrator = Orchestrator::new(Arc::clone(&client));
        orchestrator.cancel().await;
        assert_eq!(orchestrator.snapshot().status, ActionStatus::Pending);
        assert!(client.canceled().await.is_empty());
    }
}
