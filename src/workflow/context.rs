//! Per-run workflow state threaded between pipeline steps.
//!
//! One context is created per `run_workflow` call and owned by that call;
//! the orchestrator never stores it, which is what keeps concurrent runs
//! isolated. Each stage appends exactly one field, so a missing stage is an
//! explicit `None` instead of an absent dictionary key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::Extracted;

/// Request category decided by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Refund,
    Exchange,
    Complaint,
    #[default]
    GeneralQuestion,
}

impl Category {
    /// Parse a classifier-provided label. Anything unrecognized falls back
    /// to the default category rather than failing the step.
    pub fn parse_or_default(label: Option<&str>) -> Self {
        match label {
            Some("refund") => Category::Refund,
            Some("exchange") => Category::Exchange,
            Some("complaint") => Category::Complaint,
            _ => Category::GeneralQuestion,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Refund => "refund",
            Category::Exchange => "exchange",
            Category::Complaint => "complaint",
            Category::GeneralQuestion => "general_question",
        }
    }
}

/// Urgency decided by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    pub fn parse_or_default(label: Option<&str>) -> Self {
        match label {
            Some("low") => Urgency::Low,
            Some("high") => Urgency::High,
            _ => Urgency::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

/// Output of the classify stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub urgency: Urgency,
}

/// State accumulated across the five pipeline stages.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub workflow_id: Uuid,
    pub user_input: String,
    pub workflow_kind: String,
    pub started_at: DateTime<Utc>,

    /// Stage 1: category + urgency.
    pub classification: Option<Classification>,
    /// Injected before stage 2 when the message references a known order.
    pub order_details: Option<String>,
    /// Knowledge-base documents retrieved for stage 2's prompt.
    pub knowledge: Option<String>,
    /// Stage 2: research findings.
    pub research: Option<Extracted>,
    /// Policy text retrieved for stage 3's prompt.
    pub policies: Option<String>,
    /// Stage 3: validation decision.
    pub validation: Option<Extracted>,
    /// Stage 4: drafted customer response.
    pub draft: Option<String>,
    /// Stage 5: review verdict.
    pub review: Option<Extracted>,
}

impl WorkflowContext {
    pub fn new(user_input: impl Into<String>, workflow_kind: impl Into<String>) -> Self {
        Self {
            workflow_id: Uuid::new_v4(),
            user_input: user_input.into(),
            workflow_kind: workflow_kind.into(),
            started_at: Utc::now(),
            classification: None,
            order_details: None,
            knowledge: None,
            research: None,
            policies: None,
            validation: None,
            draft: None,
            review: None,
        }
    }

    /// Category decided so far, defaulting when classification is missing
    /// or unparseable.
    pub fn category(&self) -> Category {
        self.classification.map(|c| c.category).unwrap_or_default()
    }

    /// Urgency decided so far, with the same default behavior.
    pub fn urgency(&self) -> Urgency {
        self.classification.map(|c| c.urgency).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parsing_defaults_unknown_labels() {
        assert_eq!(Category::parse_or_default(Some("refund")), Category::Refund);
        assert_eq!(
            Category::parse_or_default(Some("exchange")),
            Category::Exchange
        );
        assert_eq!(
            Category::parse_or_default(Some("billing")),
            Category::GeneralQuestion
        );
        assert_eq!(Category::parse_or_default(None), Category::GeneralQuestion);
    }

    #[test]
    fn urgency_parsing_defaults_to_medium() {
        assert_eq!(Urgency::parse_or_default(Some("high")), Urgency::High);
        assert_eq!(Urgency::parse_or_default(Some("urgent")), Urgency::Medium);
        assert_eq!(Urgency::parse_or_default(None), Urgency::Medium);
    }

    #[test]
    fn fresh_context_has_no_stage_output() {
        let ctx = WorkflowContext::new("where is my order?", "customer_support");
        assert!(ctx.classification.is_none());
        assert!(ctx.research.is_none());
        assert!(ctx.draft.is_none());
        assert_eq!(ctx.category(), Category::GeneralQuestion);
        assert_eq!(ctx.urgency(), Urgency::Medium);
    }

    #[test]
    fn category_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(Category::GeneralQuestion).unwrap(),
            "general_question"
        );
        assert_eq!(serde_json::to_value(Urgency::Low).unwrap(), "low");
    }
}
