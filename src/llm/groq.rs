//! Groq API client with per-request timeout and bounded retry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{classify_http_status, LlmError, RetryConfig};
use super::{Completion, CompletionClient, CompletionRequest};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default deadline for a single completion attempt. A hung upstream call
/// must surface as a normal failure instead of stalling the workflow.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Groq chat-completions client.
pub struct GroqClient {
    client: Client,
    api_key: String,
    retry_config: RetryConfig,
}

impl GroqClient {
    /// Create a client with the default timeout and retry policy.
    pub fn new(api_key: String) -> Self {
        Self::with_timeout(api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            retry_config: RetryConfig::default(),
        }
    }

    /// Override the retry policy.
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Parse a Retry-After header value as whole seconds.
    fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok().map(Duration::from_secs))
    }

    /// Execute a single attempt without retry.
    async fn execute_request(&self, request: &GroqRequest<'_>) -> Result<Completion, LlmError> {
        let response = match self
            .client
            .post(GROQ_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                if e.is_timeout() {
                    return Err(LlmError::Network(format!("request timeout: {}", e)));
                } else if e.is_connect() {
                    return Err(LlmError::Network(format!("connection failed: {}", e)));
                } else {
                    return Err(LlmError::Network(format!("request failed: {}", e)));
                }
            }
        };

        let status = response.status();
        let retry_after = Self::parse_retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(classify_http_status(status.as_u16(), body, retry_after));
        }

        let parsed: GroqResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::Parse(format!("failed to parse response: {}, body: {}", e, body))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Parse("no choices in response".to_string()))?;

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            total_tokens: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }

    async fn execute_with_retry(&self, request: &GroqRequest<'_>) -> Result<Completion, LlmError> {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            match self.execute_request(request).await {
                Ok(completion) => {
                    if attempt > 0 {
                        tracing::info!(
                            attempts = attempt + 1,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "completion succeeded after retry"
                        );
                    }
                    return Ok(completion);
                }
                Err(error) => {
                    let give_up = !self.retry_config.should_retry(&error, attempt)
                        || start.elapsed() > self.retry_config.max_retry_duration;
                    if give_up {
                        return Err(error);
                    }

                    let delay = error.suggested_delay(attempt);
                    tracing::warn!(
                        model = request.model,
                        attempt,
                        delay_secs = delay.as_secs(),
                        "transient completion error ({}), retrying",
                        error.kind()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let wire_request = GroqRequest {
            model: &request.model,
            messages: vec![
                GroqMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                GroqMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        self.execute_with_retry(&wire_request).await
    }
}

#[derive(Debug, Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: Vec<GroqMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct GroqMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqUsage {
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_in_openai_shape() {
        let request = GroqRequest {
            model: "llama-3.1-8b-instant",
            messages: vec![
                GroqMessage {
                    role: "system",
                    content: "You are a classifier.",
                },
                GroqMessage {
                    role: "user",
                    content: "Where is my order?",
                },
            ],
            temperature: 0.3,
            max_tokens: 500,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama-3.1-8b-instant");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "Where is my order?");
        assert_eq!(value["max_tokens"], 500);
    }

    #[test]
    fn response_parses_content_and_usage() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"category\": \"refund\"}"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
        }"#;

        let parsed: GroqResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.usage.as_ref().unwrap().total_tokens, 150);
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("{\"category\": \"refund\"}")
        );
    }
}
