//! HTTP route handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::events::StatusBroadcaster;
use crate::llm::{CompletionClient, GroqClient};
use crate::store::{MetricsSummary, SqliteWorkflowStore, WorkflowFilter, WorkflowPage};
use crate::workflow::{Orchestrator, WorkflowResult};

use super::types::{ExecuteWorkflowRequest, HealthResponse, ListWorkflowsQuery};
use super::ws;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Workflow persistence.
    pub store: SqliteWorkflowStore,
    /// Shared completion client (read-only, reused by every run).
    pub client: Arc<dyn CompletionClient>,
    /// Status event fan-out, shared by orchestrators and the websocket.
    pub events: StatusBroadcaster,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = SqliteWorkflowStore::open(config.database_path.clone()).await?;

    let client: Arc<dyn CompletionClient> = Arc::new(GroqClient::with_timeout(
        config.api_key.clone(),
        Duration::from_secs(config.request_timeout_secs),
    ));

    let events = StatusBroadcaster::default();

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        client,
        events,
    });

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/workflow/execute", post(execute_workflow))
        .route("/api/workflows", get(list_workflows))
        .route("/api/workflows/:id", get(get_workflow))
        .route("/api/metrics/summary", get(metrics_summary))
        .route("/api/ws", get(ws::status_ws))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Execute one workflow and persist its result.
///
/// Each request gets its own orchestrator, so concurrent requests never
/// share per-run state. Status events stream on `/api/ws` while this
/// handler waits for the terminal envelope.
async fn execute_workflow(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExecuteWorkflowRequest>,
) -> Result<Json<WorkflowResult>, (StatusCode, String)> {
    if request.user_input.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "user_input must not be empty".to_string(),
        ));
    }

    let orchestrator = Orchestrator::new(
        Arc::clone(&state.client),
        &state.config.models,
        state.events.clone(),
    );

    let result = orchestrator
        .run_workflow(&request.user_input, &request.workflow_type)
        .await;

    // The run already happened and cost money; a storage failure should
    // not hide the envelope from the caller.
    if let Err(e) = state.store.insert(&result).await {
        tracing::warn!(workflow_id = %result.workflow_id, "failed to persist workflow: {}", e);
    }

    Ok(Json(result))
}

/// Get a stored workflow envelope by id.
async fn get_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowResult>, (StatusCode, String)> {
    match state.store.get(id).await {
        Ok(Some(result)) => Ok(Json(result)),
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("Workflow {} not found", id))),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// List stored workflows with optional filters.
async fn list_workflows(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListWorkflowsQuery>,
) -> Result<Json<WorkflowPage>, (StatusCode, String)> {
    let filter = WorkflowFilter {
        category: params.category,
        status: params.status,
        limit: params.limit.unwrap_or(50),
        offset: params.offset.unwrap_or(0),
    };

    state
        .store
        .list(&filter)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Aggregate metrics across all stored workflows.
async fn metrics_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MetricsSummary>, (StatusCode, String)> {
    state
        .store
        .metrics_summary()
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
