//! Business-rule policies per request category.
//!
//! Policy text feeds the validator's prompt; the eligibility and amount
//! calculators are deterministic helpers for auditing what the validator
//! should have concluded.

use chrono::{DateTime, Utc};

use crate::workflow::context::Category;

/// Days after purchase during which refunds and exchanges are accepted.
pub const RETURN_WINDOW_DAYS: i64 = 30;

/// Static policy definition for one category.
#[derive(Debug, Clone)]
struct Policy {
    name: &'static str,
    rules: &'static [&'static str],
    time_limit_days: Option<i64>,
}

fn policy_for(category: Category) -> Policy {
    match category {
        Category::Refund => Policy {
            name: "Refund Policy",
            rules: &[
                "Returns accepted within 30 days of purchase",
                "Items must be in original condition with tags",
                "Full refund to original payment method",
                "Shipping costs non-refundable (unless defective/wrong item)",
                "Processing time: 5-7 business days",
            ],
            time_limit_days: Some(RETURN_WINDOW_DAYS),
        },
        Category::Exchange => Policy {
            name: "Exchange Policy",
            rules: &[
                "Exchanges within 30 days of purchase",
                "Items must be unworn and in original condition",
                "Free exchange shipping for defective/wrong items",
                "Customer pays return shipping for size/color exchanges",
                "Processing time: 3-5 business days",
            ],
            time_limit_days: Some(RETURN_WINDOW_DAYS),
        },
        Category::Complaint => Policy {
            name: "Complaint Handling",
            rules: &[
                "All complaints acknowledged within 24 hours",
                "Investigation completed within 3 business days",
                "Resolution offered based on issue severity",
                "Customer satisfaction tracked and followed up",
            ],
            time_limit_days: None,
        },
        Category::GeneralQuestion => Policy {
            name: "Customer Support",
            rules: &[
                "Response provided within 2 hours during business hours",
                "All questions answered thoroughly",
                "Additional resources provided when applicable",
                "Follow-up offered if needed",
            ],
            time_limit_days: None,
        },
    }
}

/// Result of a refund eligibility check.
#[derive(Debug, Clone)]
pub struct RefundEligibility {
    pub eligible: bool,
    pub refund_percentage: u8,
    pub shipping_refundable: bool,
    pub issues: Vec<String>,
    pub days_since_order: i64,
    pub time_limit: i64,
    pub within_time_limit: bool,
    pub reasoning: String,
}

/// Refund amount breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct RefundBreakdown {
    pub product_refund: f64,
    pub shipping_refund: f64,
    pub total_refund: f64,
}

/// Business rules engine for customer support.
#[derive(Debug, Clone, Default)]
pub struct PolicyChecker;

impl PolicyChecker {
    pub fn new() -> Self {
        Self
    }

    /// Formatted policy text for a category, ready for a prompt.
    pub fn policies_for(&self, category: Category) -> String {
        let policy = policy_for(category);

        let rules_text = policy
            .rules
            .iter()
            .map(|rule| format!("- {rule}"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut result = format!("{}:\n{}", policy.name, rules_text);
        if let Some(days) = policy.time_limit_days {
            result.push_str(&format!("\n\nTime Limit: {days} days from purchase"));
        }

        result
    }

    /// Check whether a refund request is eligible under the refund policy.
    ///
    /// `item_condition` is one of good/worn/damaged/used; `reason` is one
    /// of changed_mind/defective/wrong_item.
    pub fn check_refund_eligibility(
        &self,
        order_date: DateTime<Utc>,
        item_condition: &str,
        reason: &str,
    ) -> RefundEligibility {
        let days_since_order = (Utc::now() - order_date).num_days();
        let within_time_limit = days_since_order <= RETURN_WINDOW_DAYS;
        let condition_exempt = matches!(reason, "defective" | "wrong_item");

        let mut eligible = true;
        let mut issues = Vec::new();

        if !within_time_limit {
            eligible = false;
            issues.push(format!(
                "Order is {days_since_order} days old (limit: {RETURN_WINDOW_DAYS} days)"
            ));
        }

        if matches!(item_condition, "worn" | "damaged" | "used") && !condition_exempt {
            eligible = false;
            issues.push("Item is not in original condition".to_string());
        }

        let reasoning = if eligible {
            format!(
                "Refund approved. Item is within return window and meets policy requirements. Reason: {reason}"
            )
        } else {
            format!("Refund denied. Issues: {}", issues.join("; "))
        };

        RefundEligibility {
            eligible,
            refund_percentage: if eligible { 100 } else { 0 },
            shipping_refundable: condition_exempt,
            issues,
            days_since_order,
            time_limit: RETURN_WINDOW_DAYS,
            within_time_limit,
            reasoning,
        }
    }

    /// Compute the refund amount for an order.
    pub fn calculate_refund_amount(
        &self,
        order_total: f64,
        shipping_cost: f64,
        refund_percentage: u8,
        include_shipping: bool,
    ) -> RefundBreakdown {
        let product_refund =
            (order_total - shipping_cost) * (f64::from(refund_percentage) / 100.0);
        let shipping_refund = if include_shipping { shipping_cost } else { 0.0 };

        RefundBreakdown {
            product_refund: round_cents(product_refund),
            shipping_refund: round_cents(shipping_refund),
            total_refund: round_cents(product_refund + shipping_refund),
        }
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
