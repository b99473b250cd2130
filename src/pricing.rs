//! Cost calculation from token usage and model pricing.
//!
//! Single source of truth for estimating API spend across all five agent
//! roles. Rates are flat USD per million tokens; Groq bills prompt and
//! completion tokens at the same blended rate for these models.

/// Fallback rate applied when a model is missing from the table, so cost
/// reporting keeps working when a new model is rolled out before pricing
/// is updated.
const FALLBACK_RATE_PER_MILLION: f64 = 0.10;

/// USD per million tokens for a model. Returns `None` for unknown models.
pub fn rate_per_million(model: &str) -> Option<f64> {
    match model.trim() {
        "llama-3.1-8b-instant" => Some(0.05),
        "llama-3.1-70b-versatile" => Some(0.59),
        "mixtral-8x7b-32768" => Some(0.24),
        "gemma-7b-it" => Some(0.07),
        _ => None,
    }
}

/// Estimate the cost of a call in USD.
///
/// `cost = tokens * rate / 1_000_000`, never negative. Unknown models use
/// the fallback rate and log a warning.
pub fn cost_usd(model: &str, tokens: u64) -> f64 {
    let rate = match rate_per_million(model) {
        Some(rate) => rate,
        None => {
            tracing::warn!(model = %model, "unknown model for cost calculation, using fallback rate");
            FALLBACK_RATE_PER_MILLION
        }
    };

    tokens as f64 * rate / 1_000_000.0
}

/// Round a USD amount to micro-dollar precision for stable serialization.
pub fn round_usd(amount: f64) -> f64 {
    (amount * 1_000_000.0).round() / 1_000_000.0
}
