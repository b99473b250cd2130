//! Five-step workflow orchestration.
//!
//! The pipeline is strictly sequential: classify → research → validate →
//! write → review, each step feeding the next through the typed context.
//! Two failure tiers apply: a failed agent call degrades that one step and
//! the pipeline continues, while anything that escapes the step sequence
//! itself (a programming error) is caught at the boundary and turned into a
//! `failed` envelope carrying the steps that did run.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use serde_json::json;

use crate::agents::{extract, AgentModels, AgentRegistry, AgentResult, AgentRole, Extracted};
use crate::events::{StatusBroadcaster, StatusEvent, StepStatus};
use crate::llm::CompletionClient;
use crate::tools::{KnowledgeBase, OrderLookup, PolicyChecker};
use crate::workflow::context::{Category, Classification, Urgency, WorkflowContext};
use crate::workflow::result::{
    StepSummary, WorkflowFailure, WorkflowMetrics, WorkflowResult, WorkflowStatus,
};

const TOTAL_STEPS: usize = 5;

/// Step name used for workflow-level (terminal) status events.
const WORKFLOW_STEP: &str = "workflow";

/// Drives one customer-support workflow at a time.
///
/// Holds only read-only state (registry, tools) plus the injected event
/// broadcaster; all per-run state lives in the `WorkflowContext` owned by
/// each `run_workflow` call, so a single instance is safe to share across
/// concurrent runs.
pub struct Orchestrator {
    registry: AgentRegistry,
    knowledge: KnowledgeBase,
    orders: OrderLookup,
    policies: PolicyChecker,
    events: StatusBroadcaster,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        models: &AgentModels,
        events: StatusBroadcaster,
    ) -> Self {
        Self {
            registry: AgentRegistry::new(client, models),
            knowledge: KnowledgeBase::new(),
            orders: OrderLookup::new(),
            policies: PolicyChecker::new(),
            events,
        }
    }

    /// Run the complete five-step workflow for one user message.
    ///
    /// Always returns an envelope; errors never escape this boundary.
    pub async fn run_workflow(&self, user_input: &str, workflow_kind: &str) -> WorkflowResult {
        let started = Instant::now();
        let mut ctx = WorkflowContext::new(user_input, workflow_kind);
        let mut steps: Vec<StepSummary> = Vec::new();

        tracing::info!(
            workflow_id = %ctx.workflow_id,
            kind = workflow_kind,
            "starting workflow"
        );

        let outcome = AssertUnwindSafe(self.run_steps(&mut ctx, &mut steps))
            .catch_unwind()
            .await;

        match outcome {
            Ok(()) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                let metrics = WorkflowMetrics::aggregate(&steps, duration_ms);

                let result = WorkflowResult {
                    workflow_id: ctx.workflow_id,
                    status: WorkflowStatus::Completed,
                    user_input: ctx.user_input.clone(),
                    category: Some(ctx.category()),
                    urgency: Some(ctx.urgency()),
                    final_output: ctx.draft.clone(),
                    qa_review: ctx.review.as_ref().and_then(Extracted::as_value),
                    steps,
                    metrics: Some(metrics),
                    error: None,
                    timestamp: Utc::now(),
                };

                tracing::info!(
                    workflow_id = %ctx.workflow_id,
                    duration_ms,
                    "workflow completed"
                );
                self.emit_terminal(&result, StepStatus::Completed);
                result
            }
            Err(panic) => {
                let message = panic_message(panic);
                tracing::error!(
                    workflow_id = %ctx.workflow_id,
                    steps_completed = steps.len(),
                    "workflow failed: {}",
                    message
                );

                let result = WorkflowResult {
                    workflow_id: ctx.workflow_id,
                    status: WorkflowStatus::Failed,
                    user_input: ctx.user_input.clone(),
                    category: ctx.classification.map(|c| c.category),
                    urgency: ctx.classification.map(|c| c.urgency),
                    final_output: None,
                    qa_review: None,
                    steps,
                    metrics: None,
                    error: Some(WorkflowFailure {
                        kind: "panic".to_string(),
                        message,
                    }),
                    timestamp: Utc::now(),
                };

                self.emit_terminal(&result, StepStatus::Failed);
                result
            }
        }
    }

    /// Execute the five steps in order, threading the context through.
    async fn run_steps(&self, ctx: &mut WorkflowContext, steps: &mut Vec<StepSummary>) {
        let user_input = ctx.user_input.clone();

        // Step 1: classify the request.
        let classified = self.run_step(AgentRole::Classify, &user_input, ctx, 1).await;
        let parsed = extract(&classified.output);
        ctx.classification = Some(Classification {
            category: Category::parse_or_default(parsed.get_str("category")),
            urgency: Urgency::parse_or_default(parsed.get_str("urgency")),
        });
        steps.push(StepSummary::from(&classified));

        // Step 2: research. Resolve any referenced order and retrieve
        // documents first so the prompt template stays a pure function.
        if let Some(order_text) = self.orders.lookup(&user_input) {
            ctx.order_details = Some(order_text);
        }
        ctx.knowledge = Some(self.knowledge.search(&user_input, Some(ctx.category())));

        let researched = self.run_step(AgentRole::Research, &user_input, ctx, 2).await;
        ctx.research = Some(extract(&researched.output));
        steps.push(StepSummary::from(&researched));

        // Step 3: validate against policies.
        ctx.policies = Some(self.policies.policies_for(ctx.category()));

        let validated = self.run_step(AgentRole::Validate, &user_input, ctx, 3).await;
        ctx.validation = Some(extract(&validated.output));
        steps.push(StepSummary::from(&validated));

        // Step 4: write the customer response. The draft is kept verbatim;
        // no JSON parsing is attempted on prose output.
        let written = self.run_step(AgentRole::Write, "", ctx, 4).await;
        ctx.draft = Some(written.output.clone());
        steps.push(StepSummary::from(&written));

        // Step 5: review the draft.
        let draft = ctx.draft.clone().unwrap_or_default();
        let reviewed = self.run_step(AgentRole::Review, &draft, ctx, 5).await;
        ctx.review = Some(extract(&reviewed.output));
        steps.push(StepSummary::from(&reviewed));
    }

    /// Run one agent step with running/completed events around it.
    async fn run_step(
        &self,
        role: AgentRole,
        input: &str,
        ctx: &WorkflowContext,
        step_number: usize,
    ) -> AgentResult {
        let agent_name = role.agent_name();

        self.events.emit(StatusEvent::new(
            ctx.workflow_id,
            agent_name,
            StepStatus::Running,
            Some(json!({
                "step": step_number,
                "total_steps": TOTAL_STEPS,
                "message": format!("Executing {agent_name}..."),
            })),
        ));

        let result = self.registry.executor(role).execute(input, ctx).await;

        tracing::info!(
            workflow_id = %ctx.workflow_id,
            agent = agent_name,
            step = step_number,
            latency_ms = result.latency_ms,
            tokens = result.tokens_used,
            "step completed"
        );

        self.events.emit(StatusEvent::new(
            ctx.workflow_id,
            agent_name,
            StepStatus::Completed,
            Some(json!({
                "step": step_number,
                "total_steps": TOTAL_STEPS,
                "result": StepSummary::from(&result),
            })),
        ));

        result
    }

    /// Emit the terminal workflow event. Serialization problems are logged
    /// and swallowed; notification must never change the returned result.
    fn emit_terminal(&self, result: &WorkflowResult, status: StepStatus) {
        let payload = match serde_json::to_value(result) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("failed to serialize workflow event payload: {}", e);
                None
            }
        };

        self.events.emit(StatusEvent::new(
            result.workflow_id,
            WORKFLOW_STEP,
            status,
            payload,
        ));
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Completion, CompletionRequest, LlmError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted client: pops one canned response per call, in step order.
    struct ScriptedClient {
        responses: Mutex<Vec<Result<Completion, LlmError>>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<Completion, LlmError>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, LlmError> {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .expect("script exhausted")
        }
    }

    /// Client that panics on every call, simulating a programming error
    /// outside the per-agent degradation tier.
    struct PanickingClient;

    #[async_trait]
    impl CompletionClient for PanickingClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, LlmError> {
            panic!("state corrupted")
        }
    }

    fn ok(text: &str) -> Result<Completion, LlmError> {
        Ok(Completion {
            text: text.to_string(),
            total_tokens: 100,
        })
    }

    fn five_good_responses() -> Vec<Result<Completion, LlmError>> {
        vec![
            ok(r#"{"category": "refund", "urgency": "high", "reasoning": "asks for money back", "confidence": 0.9}"#),
            ok(r#"{"key_findings": "refund policy applies", "order_info": "Order #12345", "confidence": 0.8}"#),
            ok(r#"{"approved": true, "amount": "799.00", "required_actions": [], "reasoning": "within window", "confidence": 0.9}"#),
            ok("Dear Customer, your refund of $799.00 has been approved."),
            ok(r#"{"overall_score": 9, "recommendation": "APPROVE", "confidence": 0.9}"#),
        ]
    }

    fn orchestrator_with(client: impl CompletionClient + 'static) -> Orchestrator {
        Orchestrator::new(
            Arc::new(client),
            &AgentModels::default(),
            StatusBroadcaster::new(64),
        )
    }

    #[tokio::test]
    async fn successful_run_produces_five_steps_and_metrics() {
        let orchestrator = orchestrator_with(ScriptedClient::new(five_good_responses()));
        let result = orchestrator
            .run_workflow("I want a refund for order #12345", "customer_support")
            .await;

        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(result.steps.len(), 5);
        assert_eq!(result.category, Some(Category::Refund));
        assert_eq!(result.urgency, Some(Urgency::High));
        assert!(result
            .final_output
            .as_deref()
            .unwrap()
            .contains("refund of $799.00"));

        let metrics = result.metrics.unwrap();
        assert_eq!(metrics.agents_used, 5);
        assert_eq!(metrics.total_tokens, 500);
        assert!(metrics.total_cost_usd > 0.0);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn degraded_research_step_still_completes() {
        let mut responses = five_good_responses();
        responses[1] = Err(LlmError::Network("connection reset".into()));

        let orchestrator = orchestrator_with(ScriptedClient::new(responses));
        let result = orchestrator.run_workflow("refund please", "customer_support").await;

        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(result.steps.len(), 5);
        assert!(result.steps[1].output.contains("Error in researcher"));
        assert_eq!(result.steps[1].confidence, 0.0);
        assert_eq!(result.steps[1].cost_usd, 0.0);
    }

    #[tokio::test]
    async fn pipeline_tier_failure_yields_failed_envelope() {
        let orchestrator = orchestrator_with(PanickingClient);
        let result = orchestrator.run_workflow("hello", "customer_support").await;

        assert_eq!(result.status, WorkflowStatus::Failed);
        let failure = result.error.unwrap();
        assert_eq!(failure.kind, "panic");
        assert!(failure.message.contains("state corrupted"));
        assert!(result.metrics.is_none());
    }

    #[tokio::test]
    async fn events_follow_emission_order() {
        let broadcaster = StatusBroadcaster::new(64);
        let mut rx = broadcaster.subscribe();
        let orchestrator = Orchestrator::new(
            Arc::new(ScriptedClient::new(five_good_responses())),
            &AgentModels::default(),
            broadcaster,
        );

        let result = orchestrator.run_workflow("refund please", "customer_support").await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        // running + completed per step, plus the terminal workflow event.
        assert_eq!(events.len(), 11);
        for (i, agent) in ["classifier", "researcher", "validator", "writer", "reviewer"]
            .iter()
            .enumerate()
        {
            assert_eq!(events[i * 2].step, *agent);
            assert_eq!(events[i * 2].status, StepStatus::Running);
            assert_eq!(events[i * 2 + 1].step, *agent);
            assert_eq!(events[i * 2 + 1].status, StepStatus::Completed);
        }
        assert_eq!(events[10].step, "workflow");
        assert_eq!(events[10].status, StepStatus::Completed);
        assert!(events.iter().all(|e| e.workflow_id == result.workflow_id));
    }
}
