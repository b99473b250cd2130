//! HTTP API for the workflow server.
//!
//! ## Endpoints
//!
//! - `POST /api/workflow/execute` - Run the five-step workflow for a message
//! - `GET /api/workflows` - List stored workflows (filter by category/status)
//! - `GET /api/workflows/{id}` - Get a stored workflow envelope
//! - `GET /api/metrics/summary` - Aggregate metrics across workflows
//! - `GET /api/ws` - WebSocket stream of workflow status events
//! - `GET /api/health` - Health check

pub mod routes;
pub mod types;
mod ws;

pub use routes::{serve, AppState};
pub use types::*;
