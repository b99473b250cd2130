//! Core result type for agent executions.

use serde::{Deserialize, Serialize};

/// Result of one agent invocation.
///
/// # Invariants
/// - `confidence` is clamped to `[0.0, 1.0]`
/// - `cost_usd` is never negative
/// - a degraded result (failed call) carries zero cost, zero confidence and
///   zero tokens, with the error description as its output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    /// Stable agent name (`classifier`, `researcher`, ...).
    pub agent_name: String,

    /// The model output, or an error description for degraded results.
    pub output: String,

    /// Why the agent decided what it decided (≤ 100 chars).
    pub reasoning: String,

    /// Confidence score in `[0, 1]`.
    pub confidence: f64,

    /// Estimated spend for this call in USD.
    pub cost_usd: f64,

    /// Wall-clock latency of the call.
    pub latency_ms: u64,

    /// Total tokens reported by the provider.
    pub tokens_used: u64,

    /// Raw completion text, when one was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl AgentResult {
    /// Stand-in result for a failed agent call. The pipeline continues
    /// with this in place of real output.
    pub fn degraded(
        agent_name: impl Into<String>,
        error_kind: &str,
        error_message: impl std::fmt::Display,
        latency_ms: u64,
    ) -> Self {
        let agent_name = agent_name.into();
        let output = format!("Error in {}: {}", agent_name, error_message);
        Self {
            agent_name,
            reasoning: format!("Agent failed: {error_kind}"),
            confidence: 0.0,
            cost_usd: 0.0,
            latency_ms,
            tokens_used: 0,
            raw_response: Some(output.clone()),
            output,
        }
    }
}
