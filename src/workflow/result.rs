//! Terminal workflow envelope: step summaries, aggregate metrics, status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::AgentResult;
use crate::pricing;
use crate::workflow::context::{Category, Urgency};

/// Terminal status of one workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Completed,
    Failed,
}

/// Persisted record of one agent's execution within a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSummary {
    pub agent: String,
    pub output: String,
    pub reasoning: String,
    pub confidence: f64,
    pub cost_usd: f64,
    pub latency_ms: u64,
    pub tokens_used: u64,
}

impl From<&AgentResult> for StepSummary {
    fn from(result: &AgentResult) -> Self {
        Self {
            agent: result.agent_name.clone(),
            output: result.output.clone(),
            reasoning: result.reasoning.clone(),
            confidence: result.confidence,
            cost_usd: result.cost_usd,
            latency_ms: result.latency_ms,
            tokens_used: result.tokens_used,
        }
    }
}

/// Aggregate metrics over exactly the steps that executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetrics {
    pub total_cost_usd: f64,
    pub total_latency_ms: u64,
    pub total_tokens: u64,
    pub avg_confidence: f64,
    pub agents_used: usize,
    pub workflow_duration_ms: u64,
}

impl WorkflowMetrics {
    /// Aggregate over the executed steps.
    pub fn aggregate(steps: &[StepSummary], workflow_duration_ms: u64) -> Self {
        let total_cost_usd: f64 = steps.iter().map(|s| s.cost_usd).sum();
        let total_latency_ms: u64 = steps.iter().map(|s| s.latency_ms).sum();
        let total_tokens: u64 = steps.iter().map(|s| s.tokens_used).sum();
        let avg_confidence = if steps.is_empty() {
            0.0
        } else {
            steps.iter().map(|s| s.confidence).sum::<f64>() / steps.len() as f64
        };

        Self {
            total_cost_usd: pricing::round_usd(total_cost_usd),
            total_latency_ms,
            total_tokens,
            avg_confidence: (avg_confidence * 100.0).round() / 100.0,
            agents_used: steps.len(),
            workflow_duration_ms,
        }
    }
}

/// Error description carried by a failed envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowFailure {
    /// Coarse error class (for dashboards and alerting).
    pub kind: String,
    pub message: String,
}

/// The terminal result envelope returned by `run_workflow`.
///
/// # Invariants
/// - `steps.len()` equals the number of agents actually executed
/// - `metrics` is present exactly when `status == Completed`
/// - `error` is present exactly when `status == Failed`; failed envelopes
///   still carry the steps (and their costs) that ran before the failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_id: Uuid,
    pub status: WorkflowStatus,
    pub user_input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    /// The writer's final customer-facing text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_output: Option<String>,
    /// Structured review verdict, when the reviewer produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qa_review: Option<serde_json::Value>,
    pub steps: Vec<StepSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<WorkflowMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WorkflowFailure>,
    pub timestamp: DateTime<Utc>,
}
