//! Workflow orchestration: per-run context, the five-step sequencer, and
//! the terminal result envelope.

pub mod context;
pub mod orchestrator;
pub mod result;

pub use context::{Category, Classification, Urgency, WorkflowContext};
pub use orchestrator::Orchestrator;
pub use result::{
    StepSummary, WorkflowFailure, WorkflowMetrics, WorkflowResult, WorkflowStatus,
};
