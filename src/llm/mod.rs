//! Completion client for language-model calls.
//!
//! This module provides a trait-based abstraction over completion
//! providers, with Groq as the primary implementation. Each agent in the
//! workflow issues exactly one completion per step, so the interface is a
//! single-shot `complete` rather than a conversational loop.

mod error;
mod groq;

pub use error::{classify_http_status, LlmError, RetryConfig};
pub use groq::GroqClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One completion request: a fixed system prompt plus a user prompt,
/// with the sampling parameters taken from the agent's configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (Groq format, e.g. `llama-3.1-8b-instant`).
    pub model: String,
    /// Role-specific system prompt.
    pub system_prompt: String,
    /// Fully templated user prompt.
    pub user_prompt: String,
    /// Sampling temperature (0 = deterministic).
    pub temperature: f64,
    /// Output token ceiling.
    pub max_tokens: u32,
}

/// Result of a completion call.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The model's output text.
    pub text: String,
    /// Total tokens consumed (prompt + completion) as reported upstream.
    pub total_tokens: u64,
}

/// Trait for completion providers.
///
/// Implementations must be safe to share across concurrent workflow runs;
/// the client itself holds no per-run state.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Execute one completion request.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;
}
