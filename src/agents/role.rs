//! The five workflow roles and their prompt templates.
//!
//! Roles are a closed set: polymorphism is over this enum, not an open
//! trait hierarchy. Each template is a pure function of the step input and
//! the accumulated context, so identical inputs always produce identical
//! prompts.

use serde::{Deserialize, Serialize};

use crate::agents::Extracted;
use crate::workflow::context::WorkflowContext;

/// One of the five fixed pipeline roles, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Classify,
    Research,
    Validate,
    Write,
    Review,
}

impl AgentRole {
    /// All roles in pipeline order.
    pub const ALL: [AgentRole; 5] = [
        AgentRole::Classify,
        AgentRole::Research,
        AgentRole::Validate,
        AgentRole::Write,
        AgentRole::Review,
    ];

    /// Position within the pipeline, starting at 0.
    pub fn index(&self) -> usize {
        match self {
            AgentRole::Classify => 0,
            AgentRole::Research => 1,
            AgentRole::Validate => 2,
            AgentRole::Write => 3,
            AgentRole::Review => 4,
        }
    }

    /// Stable agent name used in step summaries and status events.
    pub fn agent_name(&self) -> &'static str {
        match self {
            AgentRole::Classify => "classifier",
            AgentRole::Research => "researcher",
            AgentRole::Validate => "validator",
            AgentRole::Write => "writer",
            AgentRole::Review => "reviewer",
        }
    }

    /// Role-specific system prompt.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AgentRole::Classify => CLASSIFY_SYSTEM_PROMPT,
            AgentRole::Research => RESEARCH_SYSTEM_PROMPT,
            AgentRole::Validate => VALIDATE_SYSTEM_PROMPT,
            AgentRole::Write => WRITE_SYSTEM_PROMPT,
            AgentRole::Review => REVIEW_SYSTEM_PROMPT,
        }
    }

    /// Build the user prompt for this role.
    pub fn build_prompt(&self, input: &str, ctx: &WorkflowContext) -> String {
        match self {
            AgentRole::Classify => classify_prompt(input),
            AgentRole::Research => research_prompt(input, ctx),
            AgentRole::Validate => validate_prompt(input, ctx),
            AgentRole::Write => write_prompt(ctx),
            AgentRole::Review => review_prompt(input, ctx),
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.agent_name())
    }
}

const CLASSIFY_SYSTEM_PROMPT: &str = "\
You are a customer support classification expert.
Your job is to analyze customer messages and accurately categorize them.

Categories:
- refund: Customer wants their money back
- exchange: Customer wants to swap/replace a product
- complaint: Customer is expressing dissatisfaction
- general_question: Customer needs information or help

Urgency Levels:
- high: Angry customer, legal threats, time-sensitive (same-day delivery issue)
- medium: Product defect, wrong item received, payment issues
- low: General questions, tracking info, policy questions

Always respond in valid JSON format with category, urgency, and reasoning.
Be concise but accurate in your reasoning.";

const RESEARCH_SYSTEM_PROMPT: &str = "\
You are a research specialist for customer support.
Your job is to extract and summarize relevant information from provided documents.

Given a customer query and relevant documents:
1. Identify key information that answers the query
2. Extract specific details (prices, policies, dates, etc.)
3. Summarize clearly and concisely
4. Note any missing information

Always provide factual information based on the documents provided.
Do not make up information that isn't in the documents.";

const VALIDATE_SYSTEM_PROMPT: &str = "\
You are a policy validation expert for customer support.
Your job is to determine if customer requests comply with company policies.

You must:
1. Apply business rules strictly and consistently
2. Calculate exact refund/exchange amounts
3. Identify required actions (return shipping, photos, etc.)
4. Clearly state approval or denial with reasoning

Be fair but follow policies exactly. If something is unclear, note it.";

const WRITE_SYSTEM_PROMPT: &str = "\
You are an expert customer support email writer.
Your emails are known for being empathetic, clear, and professional.

Email Writing Guidelines:
1. Start with empathy - acknowledge the customer's situation
2. Be clear and direct - explain the resolution or next steps
3. Use professional but warm tone
4. Include specific details (amounts, dates, actions)
5. End with clear next steps and contact info
6. Keep it concise - 3-4 short paragraphs max

Write complete, ready-to-send emails.";

const REVIEW_SYSTEM_PROMPT: &str = "\
You are a quality assurance expert for customer support.
Your job is to review email responses and ensure they meet high quality standards.

Evaluation Criteria:
1. ACCURACY (1-10): Does the email match the validation decision and amounts?
2. TONE (1-10): Is it empathetic, professional, and customer-friendly?
3. COMPLETENESS (1-10): Are all points addressed? Clear next steps?
4. CLARITY (1-10): Is it easy to understand? Free of jargon?

Provide specific, actionable feedback for improvements.
Be thorough but fair in your evaluation.";

fn classify_prompt(input: &str) -> String {
    format!(
        r#"Analyze this customer support message and classify it.

Customer Message:
"{input}"

Respond with valid JSON only:
{{
    "category": "refund|exchange|complaint|general_question",
    "urgency": "low|medium|high",
    "reasoning": "Brief explanation of your classification",
    "confidence": 0.0-1.0
}}"#
    )
}

fn research_prompt(input: &str, ctx: &WorkflowContext) -> String {
    let category = ctx.category();
    let documents = ctx
        .knowledge
        .as_deref()
        .unwrap_or("No relevant documents found in knowledge base.");

    let order_section = match ctx.order_details.as_deref() {
        Some(details) => format!("\n\nOrder Information:\n{details}"),
        None => String::new(),
    };

    format!(
        r#"Research the following customer query and extract relevant information.

Customer Query:
"{input}"

Query Category: {category}

Relevant Documents:
{documents}{order_section}

Please provide:
1. Key information that addresses the query
2. Relevant policies or product details
3. Any order-specific information if applicable
4. Missing information that would be needed

Respond in JSON:
{{
    "key_findings": "Main information found",
    "relevant_policies": "Applicable policies",
    "order_info": "Order details if found",
    "missing_info": "What additional info is needed",
    "confidence": 0.0-1.0
}}"#,
        category = category.as_str(),
    )
}

fn validate_prompt(input: &str, ctx: &WorkflowContext) -> String {
    let category = ctx.category();
    let policies = ctx
        .policies
        .as_deref()
        .unwrap_or("No specific policy found. Use general customer support guidelines.");

    // Prefer the researcher's extracted order details, then the lookup text.
    let order_info = ctx
        .research
        .as_ref()
        .and_then(|r| r.get_str("order_info"))
        .map(str::to_string)
        .or_else(|| ctx.order_details.clone())
        .unwrap_or_else(|| "No order information available".to_string());

    let research = ctx
        .research
        .as_ref()
        .map(Extracted::to_prompt_text)
        .unwrap_or_else(|| "No research findings available".to_string());

    format!(
        r#"Validate this customer request against company policies.

Request Type: {category}
Customer Request: "{input}"

Order Information:
{order_info}

Applicable Policies:
{policies}

Research Findings:
{research}

Determine:
1. Is the request eligible/approved? (yes/no)
2. What is the refund/exchange amount? (if applicable)
3. What actions are required? (return item, provide photos, etc.)
4. What is the reasoning for approval/denial?

Respond in JSON:
{{
    "approved": true/false,
    "amount": "dollar amount or N/A",
    "required_actions": ["action1", "action2"],
    "reasoning": "Clear explanation",
    "policy_references": "Which policies apply",
    "confidence": 0.0-1.0
}}"#,
        category = category.as_str(),
    )
}

/// Decision fields pulled from a validation result for the writing and
/// review prompts.
fn validation_decision(validation: Option<&Extracted>) -> (String, String, Vec<String>, String) {
    let Some(validation) = validation else {
        return (
            "Unknown".to_string(),
            "N/A".to_string(),
            Vec::new(),
            String::new(),
        );
    };

    match validation {
        Extracted::Structured(_) => {
            let approved = match validation.get_bool("approved") {
                Some(true) => "Approved",
                Some(false) => "Denied",
                None => "Unknown",
            }
            .to_string();
            let amount = validation
                .get_str("amount")
                .map(str::to_string)
                .or_else(|| validation.get_f64("amount").map(|n| format!("{n:.2}")))
                .unwrap_or_else(|| "N/A".to_string());
            let actions = validation.get_str_array("required_actions");
            let reasoning = validation
                .get_str("reasoning")
                .unwrap_or_default()
                .to_string();
            (approved, amount, actions, reasoning)
        }
        Extracted::Unstructured(text) => (
            "Unknown".to_string(),
            "N/A".to_string(),
            Vec::new(),
            text.clone(),
        ),
    }
}

fn write_prompt(ctx: &WorkflowContext) -> String {
    let category = ctx.category();
    let (approved, amount, actions, reasoning) = validation_decision(ctx.validation.as_ref());

    let actions_text = if actions.is_empty() {
        "None".to_string()
    } else {
        actions
            .iter()
            .map(|a| format!("- {a}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let research = ctx
        .research
        .as_ref()
        .map(Extracted::to_prompt_text)
        .unwrap_or_else(|| "No research findings available".to_string());

    format!(
        r#"Write a professional customer support email based on this situation.

Request Type: {category}
Decision: {approved}
Amount: {amount}
Validation Reasoning: {reasoning}

Research Findings:
{research}

Required Customer Actions:
{actions_text}

Write a complete email response that:
1. Acknowledges the customer's situation with empathy
2. Clearly explains the resolution ({approved})
3. Provides specific details (amount: {amount})
4. Lists any required actions
5. Ends with next steps and contact information

The email should be ready to send - no placeholders like [Customer Name].
Use "Dear Customer" or "Hello" as greeting.

Write the email now (no JSON, just the email text):"#,
        category = category.as_str(),
    )
}

fn review_prompt(draft: &str, ctx: &WorkflowContext) -> String {
    let category = ctx.category();
    let (approved, amount, _, _) = validation_decision(ctx.validation.as_ref());
    let validation = ctx
        .validation
        .as_ref()
        .map(Extracted::to_prompt_text)
        .unwrap_or_else(|| "No validation details available".to_string());

    format!(
        r#"Review this customer support email for quality.

REQUEST TYPE: {category}
EXPECTED DECISION: {approved}
EXPECTED AMOUNT: {amount}

VALIDATION DETAILS:
{validation}

EMAIL TO REVIEW:
---
{draft}
---

Evaluate the email on these criteria (score 1-10 each):

1. ACCURACY: Does the email correctly state the decision ({approved}) and amount ({amount})?
2. TONE: Is it empathetic, professional, and friendly?
3. COMPLETENESS: Are all necessary details included? Clear next steps?
4. CLARITY: Is it easy to understand? Well-structured?

Respond in JSON:
{{
    "accuracy_score": 1-10,
    "tone_score": 1-10,
    "completeness_score": 1-10,
    "clarity_score": 1-10,
    "overall_score": 1-10,
    "strengths": ["strength1", "strength2"],
    "improvements": ["improvement1", "improvement2"],
    "recommendation": "APPROVE|REVISE|REJECT",
    "reasoning": "Overall assessment",
    "confidence": 0.0-1.0
}}"#,
        category = category.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::extract;
    use crate::workflow::context::{Category, Classification, Urgency};

    fn refund_context() -> WorkflowContext {
        let mut ctx = WorkflowContext::new("I want a refund for order #12345", "customer_support");
        ctx.classification = Some(Classification {
            category: Category::Refund,
            urgency: Urgency::High,
        });
        ctx
    }

    #[test]
    fn prompts_are_pure_functions_of_their_inputs() {
        let ctx = refund_context();
        for role in AgentRole::ALL {
            let first = role.build_prompt("input text", &ctx);
            let second = role.build_prompt("input text", &ctx);
            assert_eq!(first, second, "{role} prompt must be deterministic");
        }
    }

    #[test]
    fn classify_prompt_embeds_the_message() {
        let ctx = WorkflowContext::new("", "customer_support");
        let prompt = AgentRole::Classify.build_prompt("my package never arrived", &ctx);
        assert!(prompt.contains("my package never arrived"));
        assert!(prompt.contains("refund|exchange|complaint|general_question"));
    }

    #[test]
    fn research_prompt_includes_category_and_order_details() {
        let mut ctx = refund_context();
        ctx.order_details = Some("Order #12345\nTotal: $799.00".to_string());
        ctx.knowledge = Some("[Document 1] Refund Policy\n30 days".to_string());

        let prompt = AgentRole::Research.build_prompt("refund please", &ctx);
        assert!(prompt.contains("Query Category: refund"));
        assert!(prompt.contains("Total: $799.00"));
        assert!(prompt.contains("[Document 1] Refund Policy"));
    }

    #[test]
    fn write_prompt_reflects_validation_decision() {
        let mut ctx = refund_context();
        ctx.validation = Some(extract(
            r#"{"approved": true, "amount": "799.00", "required_actions": ["return item"], "reasoning": "within window"}"#,
        ));

        let prompt = AgentRole::Write.build_prompt("", &ctx);
        assert!(prompt.contains("Decision: Approved"));
        assert!(prompt.contains("Amount: 799.00"));
        assert!(prompt.contains("- return item"));
    }

    #[test]
    fn write_prompt_handles_prose_validation() {
        let mut ctx = refund_context();
        ctx.validation = Some(extract("the request looks fine to me"));

        let prompt = AgentRole::Write.build_prompt("", &ctx);
        assert!(prompt.contains("Decision: Unknown"));
        assert!(prompt.contains("the request looks fine to me"));
    }

    #[test]
    fn review_prompt_embeds_the_draft() {
        let mut ctx = refund_context();
        ctx.validation = Some(extract(r#"{"approved": false, "amount": "N/A"}"#));

        let prompt = AgentRole::Review.build_prompt("Dear Customer, ...", &ctx);
        assert!(prompt.contains("EMAIL TO REVIEW"));
        assert!(prompt.contains("Dear Customer, ..."));
        assert!(prompt.contains("EXPECTED DECISION: Denied"));
    }
}
