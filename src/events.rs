//! Status events emitted at workflow step boundaries.
//!
//! The orchestrator emits a `running` event before each step and a
//! `completed` event after it, plus one terminal workflow-level event.
//! Delivery is strictly best-effort: a broadcaster with no listeners, or a
//! listener that lags behind, must never slow down or fail the pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Step-level status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Running,
    Completed,
    Failed,
}

/// A timestamped notification about one workflow's progress.
///
/// Events for a given workflow are observed in emission order; no ordering
/// holds across concurrent workflows.
#[derive(Debug, Clone, Serialize)]
pub struct StatusEvent {
    pub workflow_id: Uuid,
    /// Agent name for step events, `"workflow"` for terminal events.
    pub step: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl StatusEvent {
    pub fn new(
        workflow_id: Uuid,
        step: impl Into<String>,
        status: StepStatus,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self {
            workflow_id,
            step: step.into(),
            status,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Fan-out channel for status events.
///
/// A thin wrapper over `tokio::sync::broadcast`: subscription and drop are
/// atomic, and slow receivers are skipped by the channel rather than
/// blocking the sender. Constructed once at server startup and handed to
/// each orchestrator, so tests can inject their own instance.
#[derive(Debug, Clone)]
pub struct StatusBroadcaster {
    tx: broadcast::Sender<StatusEvent>,
}

impl StatusBroadcaster {
    /// Create a broadcaster buffering up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Attach a new listener.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }

    /// Number of currently attached listeners.
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Emit an event to all listeners. Failures (no listeners attached)
    /// are logged at debug and swallowed.
    pub fn emit(&self, event: StatusEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!("no status listeners attached: {}", e);
        }
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}
