//! Agent execution: one completion call shaped into an `AgentResult`.
//!
//! There is a single executor type; role behavior comes entirely from the
//! `AgentRole` value it is configured with. A failed call never escapes:
//! it degrades into a zero-cost, zero-confidence result and the pipeline
//! moves on.

use std::sync::Arc;
use std::time::Instant;

use crate::agents::config::AgentConfig;
use crate::agents::role::AgentRole;
use crate::agents::types::AgentResult;
use crate::agents::extract;
use crate::llm::{CompletionClient, CompletionRequest};
use crate::pricing;
use crate::workflow::context::WorkflowContext;

/// Baseline for the heuristic confidence estimate.
const BASE_CONFIDENCE: f64 = 0.70;
/// Bonus when the output contains a brace-delimited object.
const STRUCTURED_BONUS: f64 = 0.10;
/// Bonus for detailed responses (over 200 characters).
const LENGTH_BONUS: f64 = 0.10;
/// Heuristic estimates never claim more than this.
const HEURISTIC_CAP: f64 = 0.95;

/// Maximum length of the extracted reasoning string.
const REASONING_MAX_CHARS: usize = 100;

/// Executes one role's completion call per workflow step.
pub struct AgentExecutor {
    role: AgentRole,
    config: AgentConfig,
    client: Arc<dyn CompletionClient>,
}

impl AgentExecutor {
    pub fn new(role: AgentRole, config: AgentConfig, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            role,
            config,
            client,
        }
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run this agent against the step input and shared context.
    ///
    /// Never returns an error: any failure in the completion call is
    /// converted into a degraded result.
    pub async fn execute(&self, input: &str, ctx: &WorkflowContext) -> AgentResult {
        let started = Instant::now();
        let prompt = self.role.build_prompt(input, ctx);

        let request = CompletionRequest {
            model: self.config.model.clone(),
            system_prompt: self.config.system_prompt.clone(),
            user_prompt: prompt,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        match self.client.complete(&request).await {
            Ok(completion) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let cost_usd = pricing::cost_usd(&self.config.model, completion.total_tokens);
                let reasoning = extract_reasoning(&completion.text);
                let confidence = estimate_confidence(&completion.text);

                AgentResult {
                    agent_name: self.config.name.clone(),
                    raw_response: Some(completion.text.clone()),
                    output: completion.text,
                    reasoning,
                    confidence,
                    cost_usd,
                    latency_ms,
                    tokens_used: completion.total_tokens,
                }
            }
            Err(error) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                tracing::warn!(
                    agent = %self.config.name,
                    model = %self.config.model,
                    kind = error.kind(),
                    "agent call failed, degrading step: {}",
                    error
                );
                AgentResult::degraded(&self.config.name, error.kind(), error, latency_ms)
            }
        }
    }
}

/// Pull a reasoning string out of agent output.
///
/// A structured `reasoning` field wins; otherwise the text up to the first
/// period. Either way the result is capped at 100 characters.
pub fn extract_reasoning(output: &str) -> String {
    if let Some(reasoning) = extract::extract(output).get_str("reasoning") {
        return truncate_chars(reasoning, REASONING_MAX_CHARS);
    }

    let first_sentence = output.split('.').next().unwrap_or(output).trim();
    truncate_chars(first_sentence, REASONING_MAX_CHARS)
}

/// Estimate confidence for an output.
///
/// A structured `confidence` field is used directly (clamped); otherwise a
/// fixed heuristic: 0.70 base, +0.10 for a brace-delimited object, +0.10
/// for responses over 200 characters, capped at 0.95.
pub fn estimate_confidence(output: &str) -> f64 {
    if let Some(confidence) = extract::extract(output).get_f64("confidence") {
        return confidence.clamp(0.0, 1.0);
    }

    let mut confidence = BASE_CONFIDENCE;
    if output.contains('{') && output.contains('}') {
        confidence += STRUCTURED_BONUS;
    }
    if output.len() > 200 {
        confidence += LENGTH_BONUS;
    }

    confidence.min(HEURISTIC_CAP).clamp(0.0, 1.0)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
