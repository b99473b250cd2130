//! SQLite-backed workflow store: one row per workflow, one row per step.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    AgentPerformance, CategoryCount, MetricsSummary, StoreError, WorkflowFilter, WorkflowPage,
    WorkflowSummaryRow,
};
use crate::workflow::{WorkflowResult, WorkflowStatus};

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS workflows (
    workflow_id TEXT PRIMARY KEY NOT NULL,
    status TEXT NOT NULL,
    user_input TEXT NOT NULL,
    category TEXT,
    urgency TEXT,
    final_output TEXT,
    total_cost_usd REAL NOT NULL DEFAULT 0,
    total_latency_ms INTEGER NOT NULL DEFAULT 0,
    total_tokens INTEGER NOT NULL DEFAULT 0,
    avg_confidence REAL NOT NULL DEFAULT 0,
    agents_used INTEGER NOT NULL DEFAULT 0,
    result_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_workflows_created_at ON workflows(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_workflows_category ON workflows(category);
CREATE INDEX IF NOT EXISTS idx_workflows_status ON workflows(status);

CREATE TABLE IF NOT EXISTS workflow_steps (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    workflow_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    agent TEXT NOT NULL,
    latency_ms INTEGER NOT NULL,
    cost_usd REAL NOT NULL,
    tokens_used INTEGER NOT NULL,
    confidence REAL NOT NULL,
    FOREIGN KEY (workflow_id) REFERENCES workflows(workflow_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_steps_workflow ON workflow_steps(workflow_id, position);
CREATE INDEX IF NOT EXISTS idx_steps_agent ON workflow_steps(agent);
"#;

/// Workflow persistence over a single SQLite database.
pub struct SqliteWorkflowStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteWorkflowStore {
    /// Open (or create) the database at `db_path` and apply the schema.
    pub async fn open(db_path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Opening touches the filesystem; keep it off the async runtime.
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let conn = Connection::open(&db_path)?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(|e| StoreError::Internal(format!("task join error: {e}")))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Persist one workflow envelope plus its step rows.
    pub async fn insert(&self, result: &WorkflowResult) -> Result<(), StoreError> {
        let result_json = serde_json::to_string(result)?;
        let status = match result.status {
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Failed => "failed",
        };

        // Sum over the executed steps rather than the metrics block so
        // partial spend on failed runs is still auditable.
        let total_cost_usd: f64 = result.steps.iter().map(|s| s.cost_usd).sum();
        let total_latency_ms: i64 = result.steps.iter().map(|s| s.latency_ms as i64).sum();
        let total_tokens: i64 = result.steps.iter().map(|s| s.tokens_used as i64).sum();
        let avg_confidence = result
            .metrics
            .as_ref()
            .map(|m| m.avg_confidence)
            .unwrap_or_else(|| {
                if result.steps.is_empty() {
                    0.0
                } else {
                    result.steps.iter().map(|s| s.confidence).sum::<f64>()
                        / result.steps.len() as f64
                }
            });

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO workflows (
                workflow_id, status, user_input, category, urgency, final_output,
                total_cost_usd, total_latency_ms, total_tokens, avg_confidence,
                agents_used, result_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                result.workflow_id.to_string(),
                status,
                result.user_input,
                result.category.map(|c| c.as_str()),
                result.urgency.map(|u| u.as_str()),
                result.final_output,
                total_cost_usd,
                total_latency_ms,
                total_tokens,
                avg_confidence,
                result.steps.len() as i64,
                result_json,
                result.timestamp.to_rfc3339(),
            ],
        )?;

        for (position, step) in result.steps.iter().enumerate() {
            tx.execute(
                "INSERT INTO workflow_steps (
                    workflow_id, position, agent, latency_ms, cost_usd,
                    tokens_used, confidence
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    result.workflow_id.to_string(),
                    position as i64,
                    step.agent,
                    step.latency_ms as i64,
                    step.cost_usd,
                    step.tokens_used as i64,
                    step.confidence,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Fetch a stored envelope by id.
    pub async fn get(&self, workflow_id: Uuid) -> Result<Option<WorkflowResult>, StoreError> {
        let conn = self.conn.lock().await;
        let json: Option<String> = conn
            .query_row(
                "SELECT result_json FROM workflows WHERE workflow_id = ?1",
                params![workflow_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// List stored workflows, newest first, with optional filters.
    pub async fn list(&self, filter: &WorkflowFilter) -> Result<WorkflowPage, StoreError> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut args: Vec<Box<dyn rusqlite::ToSql + Send>> = Vec::new();

        if let Some(category) = &filter.category {
            conditions.push("category = ?");
            args.push(Box::new(category.clone()));
        }
        if let Some(status) = &filter.status {
            conditions.push("status = ?");
            args.push(Box::new(status.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let conn = self.conn.lock().await;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM workflows{where_clause}"),
            rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
            |row| row.get(0),
        )?;

        args.push(Box::new(filter.limit as i64));
        args.push(Box::new(filter.offset as i64));

        let mut stmt = conn.prepare(&format!(
            "SELECT workflow_id, status, user_input, category, urgency,
                    total_cost_usd, avg_confidence, agents_used, created_at
             FROM workflows{where_clause}
             ORDER BY created_at DESC LIMIT ? OFFSET ?"
        ))?;

        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
                |row| {
                    Ok(WorkflowSummaryRow {
                        workflow_id: row.get(0)?,
                        status: row.get(1)?,
                        user_input: row.get(2)?,
                        category: row.get(3)?,
                        urgency: row.get(4)?,
                        total_cost_usd: row.get(5)?,
                        avg_confidence: row.get(6)?,
                        agents_used: row.get::<_, i64>(7)? as usize,
                        created_at: row.get(8)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(WorkflowPage {
            total: total as usize,
            workflows: rows,
        })
    }

    /// Aggregate metrics across all stored workflows.
    pub async fn metrics_summary(&self) -> Result<MetricsSummary, StoreError> {
        let conn = self.conn.lock().await;

        let (total_workflows, avg_cost_usd, avg_latency_ms, avg_confidence): (
            i64,
            f64,
            f64,
            f64,
        ) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(AVG(total_cost_usd), 0),
                    COALESCE(AVG(total_latency_ms), 0),
                    COALESCE(AVG(avg_confidence), 0)
             FROM workflows",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT category, COUNT(*) FROM workflows
             WHERE category IS NOT NULL GROUP BY category",
        )?;
        let category_breakdown = stmt
            .query_map([], |row| {
                Ok(CategoryCount {
                    category: row.get(0)?,
                    count: row.get::<_, i64>(1)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT agent, AVG(latency_ms), AVG(cost_usd), AVG(confidence)
             FROM workflow_steps GROUP BY agent",
        )?;
        let agent_performance = stmt
            .query_map([], |row| {
                Ok(AgentPerformance {
                    agent: row.get(0)?,
                    avg_latency_ms: row.get(1)?,
                    avg_cost_usd: row.get(2)?,
                    avg_confidence: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MetricsSummary {
            total_workflows: total_workflows as usize,
            avg_cost_usd,
            avg_latency_ms,
            avg_confidence,
            category_breakdown,
            agent_performance,
        })
    }
}
