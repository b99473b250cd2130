//! Completion error types with retry classification.
//!
//! Distinguishes transient failures (worth retrying with backoff) from
//! permanent ones. The workflow layer treats every exhausted error the same
//! way: the step degrades and the pipeline continues.

use std::time::Duration;

/// Error from a completion call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        /// Suggested delay from the Retry-After header, if present.
        retry_after: Option<Duration>,
    },

    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("client error (HTTP {status}): {message}")]
    Client { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("response parse error: {0}")]
    Parse(String),
}

impl LlmError {
    /// Short, stable name for the error kind. Embedded into degraded
    /// agent results so operators can tell failure classes apart.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::RateLimited { .. } => "rate_limited",
            LlmError::Server { .. } => "server_error",
            LlmError::Client { .. } => "client_error",
            LlmError::Network(_) => "network_error",
            LlmError::Parse(_) => "parse_error",
        }
    }

    /// Whether a retry with the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. } | LlmError::Server { .. } | LlmError::Network(_)
        )
    }

    /// Delay before the next attempt.
    ///
    /// Uses the upstream Retry-After when provided, otherwise exponential
    /// backoff from a per-kind base, capped at 30 seconds.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        if let LlmError::RateLimited {
            retry_after: Some(delay),
            ..
        } = self
        {
            return *delay;
        }

        let base_secs = match self {
            LlmError::RateLimited { .. } => 5,
            LlmError::Server { .. } => 2,
            _ => 1,
        };

        let delay = base_secs * 2u64.saturating_pow(attempt);
        Duration::from_secs(delay.min(30))
    }
}

/// Map an HTTP status code to the matching error.
pub fn classify_http_status(status: u16, body: String, retry_after: Option<Duration>) -> LlmError {
    match status {
        429 => LlmError::RateLimited {
            message: body,
            retry_after,
        },
        500 | 502 | 503 | 504 => LlmError::Server {
            status,
            message: body,
        },
        400..=499 => LlmError::Client {
            status,
            message: body,
        },
        _ => LlmError::Server {
            status,
            message: body,
        },
    }
}

/// Bounded-retry policy for completion calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try.
    pub max_retries: u32,
    /// Maximum total time to spend retrying.
    pub max_retry_duration: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            max_retry_duration: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Whether another attempt is allowed for this error.
    pub fn should_retry(&self, error: &LlmError, attempt: u32) -> bool {
        attempt < self.max_retries && error.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(LlmError::Network("reset".into()).is_transient());
        assert!(LlmError::Server {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!LlmError::Client {
            status: 401,
            message: String::new()
        }
        .is_transient());
        assert!(!LlmError::Parse("bad json".into()).is_transient());
    }

    #[test]
    fn http_status_classification() {
        assert!(matches!(
            classify_http_status(429, String::new(), None),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_http_status(502, String::new(), None),
            LlmError::Server { status: 502, .. }
        ));
        assert!(matches!(
            classify_http_status(404, String::new(), None),
            LlmError::Client { status: 404, .. }
        ));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let err = LlmError::Server {
            status: 500,
            message: String::new(),
        };
        assert!(err.suggested_delay(1) > err.suggested_delay(0));
        assert!(err.suggested_delay(10).as_secs() <= 30);
    }

    #[test]
    fn retry_after_is_respected() {
        let err = LlmError::RateLimited {
            message: String::new(),
            retry_after: Some(Duration::from_secs(12)),
        };
        assert_eq!(err.suggested_delay(0), Duration::from_secs(12));
        assert_eq!(err.suggested_delay(5), Duration::from_secs(12));
    }

    #[test]
    fn retry_policy_bounds_attempts() {
        let config = RetryConfig::default();
        let transient = LlmError::Network("timeout".into());
        assert!(config.should_retry(&transient, 0));
        assert!(!config.should_retry(&transient, config.max_retries));

        let permanent = LlmError::Client {
            status: 400,
            message: String::new(),
        };
        assert!(!config.should_retry(&permanent, 0));
    }
}
