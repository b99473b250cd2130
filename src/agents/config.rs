//! Static agent configuration and the five-role registry.
//!
//! Configs are built once at registry construction and never mutated;
//! the registry is read-only afterwards and safe to share across
//! concurrent workflow runs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agents::executor::AgentExecutor;
use crate::agents::role::AgentRole;
use crate::llm::CompletionClient;

/// Immutable configuration for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    /// Model identifier (Groq format).
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl AgentConfig {
    /// Role defaults with the given model.
    ///
    /// Temperatures follow the role: near-deterministic for rule
    /// application (validator), higher for natural writing (writer).
    pub fn for_role(role: AgentRole, model: impl Into<String>) -> Self {
        let (temperature, max_tokens) = match role {
            AgentRole::Classify => (0.3, 500),
            AgentRole::Research => (0.4, 800),
            AgentRole::Validate => (0.2, 700),
            AgentRole::Write => (0.7, 1200),
            AgentRole::Review => (0.3, 1000),
        };

        Self {
            name: role.agent_name().to_string(),
            model: model.into(),
            temperature,
            max_tokens,
            system_prompt: role.system_prompt().to_string(),
        }
    }
}

/// Model assignment per role.
///
/// Defaults use the fast 8B model for mechanical steps and larger models
/// where output quality matters most (writing and review).
#[derive(Debug, Clone)]
pub struct AgentModels {
    pub classifier: String,
    pub researcher: String,
    pub validator: String,
    pub writer: String,
    pub reviewer: String,
}

impl Default for AgentModels {
    fn default() -> Self {
        Self {
            classifier: "llama-3.1-8b-instant".to_string(),
            researcher: "llama-3.1-8b-instant".to_string(),
            validator: "llama-3.1-8b-instant".to_string(),
            writer: "mixtral-8x7b-32768".to_string(),
            reviewer: "llama-3.1-70b-versatile".to_string(),
        }
    }
}

impl AgentModels {
    fn model_for(&self, role: AgentRole) -> &str {
        match role {
            AgentRole::Classify => &self.classifier,
            AgentRole::Research => &self.researcher,
            AgentRole::Validate => &self.validator,
            AgentRole::Write => &self.writer,
            AgentRole::Review => &self.reviewer,
        }
    }
}

/// The five configured agent executors, in pipeline order.
pub struct AgentRegistry {
    executors: Vec<AgentExecutor>,
}

impl AgentRegistry {
    pub fn new(client: Arc<dyn CompletionClient>, models: &AgentModels) -> Self {
        let executors = AgentRole::ALL
            .iter()
            .map(|&role| {
                let config = AgentConfig::for_role(role, models.model_for(role));
                AgentExecutor::new(role, config, Arc::clone(&client))
            })
            .collect();

        Self { executors }
    }

    /// Executor for a role.
    pub fn executor(&self, role: AgentRole) -> &AgentExecutor {
        &self.executors[role.index()]
    }

    /// Number of configured agents.
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Completion, CompletionRequest, LlmError};
    use async_trait::async_trait;

    struct NullClient;

    #[async_trait]
    impl crate::llm::CompletionClient for NullClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, LlmError> {
            Err(LlmError::Network("unreachable".into()))
        }
    }

    #[test]
    fn registry_holds_five_agents_in_pipeline_order() {
        let registry = AgentRegistry::new(Arc::new(NullClient), &AgentModels::default());
        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry.executor(AgentRole::Classify).config().name,
            "classifier"
        );
        assert_eq!(
            registry.executor(AgentRole::Review).config().name,
            "reviewer"
        );
    }

    #[test]
    fn role_defaults_set_sampling_and_token_ceilings() {
        let config = AgentConfig::for_role(AgentRole::Write, "mixtral-8x7b-32768");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_tokens, 1200);
        assert!(config.system_prompt.contains("email writer"));

        let config = AgentConfig::for_role(AgentRole::Validate, "llama-3.1-8b-instant");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 700);
    }
}
