//! End-to-end pipeline tests over a scripted completion client.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use deskflow::agents::AgentModels;
use deskflow::events::StatusBroadcaster;
use deskflow::llm::{Completion, CompletionClient, CompletionRequest, LlmError};
use deskflow::workflow::{Category, Orchestrator, Urgency, WorkflowStatus};

/// Pops one canned response per call in step order, recording every
/// request so tests can inspect the prompts each agent actually saw.
struct RecordingClient {
    responses: Mutex<Vec<Result<Completion, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl RecordingClient {
    fn new(responses: Vec<Result<Completion, LlmError>>) -> Self {
        let mut responses = responses;
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn request(&self, index: usize) -> CompletionRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl CompletionClient for RecordingClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop()
            .expect("script exhausted: more completion calls than scripted responses")
    }
}

fn ok(text: &str) -> Result<Completion, LlmError> {
    Ok(Completion {
        text: text.to_string(),
        total_tokens: 120,
    })
}

fn refund_script() -> Vec<Result<Completion, LlmError>> {
    vec![
        ok(r#"{"category": "refund", "urgency": "high", "reasoning": "customer asks for money back", "confidence": 0.92}"#),
        ok(r#"{"key_findings": "order delivered, within return window", "relevant_policies": "30 day returns", "order_info": "Order #12345, $799.00, delivered", "missing_info": "none", "confidence": 0.85}"#),
        ok(r#"{"approved": true, "amount": "799.00", "required_actions": ["return item"], "reasoning": "10 days old, within the 30 day window", "policy_references": "Refund Policy", "confidence": 0.9}"#),
        ok("Dear Customer,\n\nYour refund of $799.00 for order #12345 has been approved. Please return the item within 14 days.\n\nBest regards,\nSupport Team"),
        ok(r#"{"accuracy_score": 9, "tone_score": 9, "completeness_score": 8, "clarity_score": 9, "overall_score": 9, "strengths": ["clear amount"], "improvements": [], "recommendation": "APPROVE", "reasoning": "accurate and clear", "confidence": 0.9}"#),
    ]
}

fn orchestrator_over(client: Arc<RecordingClient>) -> Orchestrator {
    Orchestrator::new(client, &AgentModels::default(), StatusBroadcaster::new(128))
}

#[tokio::test]
async fn refund_scenario_threads_order_details_through_the_pipeline() {
    let client = Arc::new(RecordingClient::new(refund_script()));
    let orchestrator = orchestrator_over(Arc::clone(&client));

    let result = orchestrator
        .run_workflow(
            "I want a refund for order #12345, it's been 10 days",
            "customer_support",
        )
        .await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.category, Some(Category::Refund));
    assert_eq!(result.urgency, Some(Urgency::High));
    assert_eq!(result.steps.len(), 5);

    // The researcher's prompt must surface the stored order: total and
    // fulfillment status from the fixed dataset.
    let research_prompt = client.request(1).user_prompt;
    assert!(research_prompt.contains("Order #12345"));
    assert!(research_prompt.contains("$799.00"));
    assert!(research_prompt.contains("DELIVERED"));

    // The validator sees the refund policy with its 30-day window.
    let validate_prompt = client.request(2).user_prompt;
    assert!(validate_prompt.contains("Refund Policy"));
    assert!(validate_prompt.contains("30 days"));
    assert!(validate_prompt.contains("Request Type: refund"));

    // The writer receives the approved decision and amount.
    let write_prompt = client.request(3).user_prompt;
    assert!(write_prompt.contains("Decision: Approved"));
    assert!(write_prompt.contains("799.00"));

    // The reviewer receives the draft for comparison.
    let review_prompt = client.request(4).user_prompt;
    assert!(review_prompt.contains("Your refund of $799.00"));

    let qa = result.qa_review.expect("review produced structured output");
    assert_eq!(qa["recommendation"], "APPROVE");
}

#[tokio::test]
async fn completed_run_aggregates_metrics_over_five_steps() {
    let client = Arc::new(RecordingClient::new(refund_script()));
    let orchestrator = orchestrator_over(Arc::clone(&client));

    let result = orchestrator
        .run_workflow("refund for order #12345 please", "customer_support")
        .await;

    let metrics = result.metrics.expect("completed runs carry metrics");
    assert_eq!(metrics.agents_used, 5);
    assert_eq!(metrics.total_tokens, 5 * 120);
    assert!(metrics.total_cost_usd > 0.0);
    assert!((0.0..=1.0).contains(&metrics.avg_confidence));

    let agents: Vec<&str> = result.steps.iter().map(|s| s.agent.as_str()).collect();
    assert_eq!(
        agents,
        vec!["classifier", "researcher", "validator", "writer", "reviewer"]
    );
}

#[tokio::test]
async fn failed_research_call_degrades_but_run_completes() {
    let mut script = refund_script();
    script[1] = Err(LlmError::Server {
        status: 503,
        message: "upstream overloaded".to_string(),
    });

    let client = Arc::new(RecordingClient::new(script));
    let orchestrator = orchestrator_over(Arc::clone(&client));

    let result = orchestrator
        .run_workflow("refund for order #12345", "customer_support")
        .await;

    // The research step degrades in place; it does not disappear.
    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.steps.len(), 5);

    let research = &result.steps[1];
    assert!(research.output.contains("Error in researcher"));
    assert_eq!(research.confidence, 0.0);
    assert_eq!(research.cost_usd, 0.0);
    assert_eq!(research.tokens_used, 0);

    // Later steps still ran with real output.
    assert!(result.metrics.unwrap().total_tokens > 0);
    assert!(result.final_output.is_some());
}

#[tokio::test]
async fn unknown_order_number_gets_not_found_message_and_completes() {
    let client = Arc::new(RecordingClient::new(refund_script()));
    let orchestrator = orchestrator_over(Arc::clone(&client));

    let result = orchestrator
        .run_workflow("order #99999 refund please", "customer_support")
        .await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.steps.len(), 5);

    // A recognized-but-unknown order number yields an explicit not-found
    // message, not a silently absent section.
    let research_prompt = client.request(1).user_prompt;
    assert!(research_prompt.contains("Order #99999 not found in system."));
}

#[tokio::test]
async fn envelope_round_trips_after_a_real_run() {
    let client = Arc::new(RecordingClient::new(refund_script()));
    let orchestrator = orchestrator_over(client);

    let result = orchestrator
        .run_workflow("refund for order #12345", "customer_support")
        .await;

    let json = serde_json::to_string(&result).unwrap();
    let back: deskflow::WorkflowResult = serde_json::from_str(&json).unwrap();

    assert_eq!(back.workflow_id, result.workflow_id);
    assert_eq!(back.metrics, result.metrics);
    assert_eq!(
        back.steps.iter().map(|s| &s.agent).collect::<Vec<_>>(),
        result.steps.iter().map(|s| &s.agent).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn prose_only_agents_fall_back_to_defaults() {
    // Every agent answers in plain prose: classification defaults apply
    // and downstream prompts still render.
    let script = vec![
        ok("This looks like a general question about shipping."),
        ok("Shipping usually takes 5-7 business days."),
        ok("Nothing to validate here, the question is informational."),
        ok("Hello,\n\nStandard shipping takes 5-7 business days.\n\nBest,\nSupport"),
        ok("Looks fine to send."),
    ];

    let client = Arc::new(RecordingClient::new(script));
    let orchestrator = orchestrator_over(Arc::clone(&client));

    let result = orchestrator
        .run_workflow("how long does shipping take?", "customer_support")
        .await;

    assert_eq!(result.status, WorkflowStatus::Completed);
    assert_eq!(result.category, Some(Category::GeneralQuestion));
    assert_eq!(result.urgency, Some(Urgency::Medium));
    // Prose review output means no structured verdict.
    assert!(result.qa_review.is_none());

    let validate_prompt = client.request(2).user_prompt;
    assert!(validate_prompt.contains("Request Type: general_question"));
    assert!(validate_prompt.contains("Customer Support:"));
}
