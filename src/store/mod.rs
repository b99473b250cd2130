//! Workflow persistence.
//!
//! Stores every terminal envelope (completed or failed) plus one metrics
//! row per executed step, and answers the read-side queries the API
//! exposes: fetch by id, filtered listing, and an aggregate summary.

mod sqlite;

pub use sqlite::SqliteWorkflowStore;

use serde::Serialize;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Internal(String),
}

/// Filters for listing stored workflows.
#[derive(Debug, Clone)]
pub struct WorkflowFilter {
    pub category: Option<String>,
    pub status: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for WorkflowFilter {
    fn default() -> Self {
        Self {
            category: None,
            status: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// One row in a workflow listing.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSummaryRow {
    pub workflow_id: String,
    pub status: String,
    pub user_input: String,
    pub category: Option<String>,
    pub urgency: Option<String>,
    pub total_cost_usd: f64,
    pub avg_confidence: f64,
    pub agents_used: usize,
    pub created_at: String,
}

/// A page of workflow listings.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowPage {
    pub total: usize,
    pub workflows: Vec<WorkflowSummaryRow>,
}

/// Workflow count per category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Averaged per-agent step metrics.
#[derive(Debug, Clone, Serialize)]
pub struct AgentPerformance {
    pub agent: String,
    pub avg_latency_ms: f64,
    pub avg_cost_usd: f64,
    pub avg_confidence: f64,
}

/// Aggregate metrics over all stored workflows.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub total_workflows: usize,
    pub avg_cost_usd: f64,
    pub avg_latency_ms: f64,
    pub avg_confidence: f64,
    pub category_breakdown: Vec<CategoryCount>,
    pub agent_performance: Vec<AgentPerformance>,
}
