//! Run snapshots returned by the submission backend
//!
//! A run is terminal once it carries either a result or an error; the
//! payload itself is opaque to the orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of a server-side diagnostic job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Opaque server-assigned identifier
    pub run_id: String,

    /// Error message; presence means the run failed
    #[serde(default)]
    pub error: Option<String>,

    /// Result payload; presence means the run succeeded
    #[serde(default)]
    pub result: Option<Value>,

    /// Progress report while the run is still executing
    #[serde(default)]
    pub progress: Option<Progress>,
}

/// In-flight progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub percentage: f64,
}

impl Run {
    /// A run that is still executing
    pub fn in_flight(run_id: impl Into<String>, percentage: f64) -> Self {
        Self {
            run_id: run_id.into(),
            error: None,
            result: None,
            progress: Some(Progress { percentage }),
        }
    }

    /// A run that finished with a result
    pub fn succeeded(run_id: impl Into<String>, result: Value) -> Self {
        Self {
            run_id: run_id.into(),
            error: None,
            result: Some(result),
            progress: Some(Progress { percentage: 100.0 }),
        }
    }

    /// A run that finished with an error
    pub fn failed(run_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            error: Some(error.into()),
            result: None,
            progress: None,
        }
    }

    /// Absence of both error and result means still running
    pub fn is_terminal(&self) -> bool {
        self.error.is_some() || self.result.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terminal_states() {
        assert!(!Run::in_flight("r1", 40.0).is_terminal());
        assert!(Run::succeeded("r1", json!({"rows": 10})).is_terminal());
        assert!(Run::failed("r1", "boom").is_terminal());
    }

    #[test]
    fn deserializes_sparse_payload() {
        let run: Run = serde_json::from_str(r#"{"run_id": "abc"}"#).unwrap();
        assert_eq!(run.run_id, "abc");
        assert!(!run.is_terminal());
        assert!(run.progress.is_none());
    }
}
