use crate::constants::retry::{BASE_DELAY_MS, JITTER_MAX_MS, MAX_DELAY_MS, MAX_RETRIES};
use crate::errors::ToolError;
use crate::services::http_transport::{HttpRequest, HttpResponse, HttpTransport, RequestBody};
use crate::services::logger::Logger;
use crate::utils::redact::{redact_text, redact_value};
use rand::Rng;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
            jitter_max_ms: JITTER_MAX_MS,
        }
    }
}

impl RetryPolicy {
    /// `min(base * 2^attempt, max)`, without jitter.
    pub fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }

    pub fn delay_with_jitter(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_max_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_max_ms)
        } else {
            0
        };
        Duration::from_millis(self.backoff_delay_ms(attempt) + jitter)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub status_code: u16,
    pub data: Value,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct BackendFailure {
    pub error: ToolError,
    pub status_code: Option<u16>,
    pub attempts: u32,
}

/// Sends resource calls with the 4xx-never / 5xx-and-network-always retry rule.
#[derive(Clone)]
pub struct RetryExecutor {
    logger: Logger,
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(logger: Logger, transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self {
            logger: logger.child("http"),
            transport,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<BackendResponse, BackendFailure> {
        let send_body = matches!(method, Method::POST | Method::PATCH | Method::PUT);
        let mut last_status = None;
        let mut last_error = ToolError::network("Request was not attempted");

        for attempt in 0..=self.policy.max_retries {
            let request = HttpRequest {
                method: method.clone(),
                url: url.to_string(),
                bearer: Some(token.to_string()),
                body: body
                    .filter(|_| send_body)
                    .map(|value| RequestBody::Json(value.clone())),
            };
            let attempts = attempt + 1;

            match self.transport.send(request).await {
                Ok(response) if response.is_success() => {
                    self.logger.debug(
                        "Backend call succeeded",
                        Some(&serde_json::json!({
                            "method": method.as_str(),
                            "status": response.status,
                            "attempts": attempts,
                        })),
                    );
                    return Ok(BackendResponse {
                        status_code: response.status,
                        data: response.parsed_body(),
                        attempts,
                    });
                }
                Ok(response) if (500..=599).contains(&response.status) => {
                    last_status = Some(response.status);
                    last_error = status_error(&response);
                }
                Ok(response) => {
                    return Err(BackendFailure {
                        error: status_error(&response),
                        status_code: Some(response.status),
                        attempts,
                    });
                }
                Err(err) if err.retryable => {
                    last_status = None;
                    last_error = err;
                }
                Err(err) => {
                    return Err(BackendFailure {
                        error: err,
                        status_code: None,
                        attempts,
                    });
                }
            }

            if attempt < self.policy.max_retries {
                let delay = self.policy.delay_with_jitter(attempt);
                self.logger.warn(
                    "Retrying backend call",
                    Some(&serde_json::json!({
                        "method": method.as_str(),
                        "attempt": attempts,
                        "status": last_status,
                        "error": last_error.message,
                        "delay_ms": delay.as_millis() as u64,
                    })),
                );
                tokio::time::sleep(delay).await;
            }
        }

        let attempts = self.policy.max_retries + 1;
        let mut error = last_error.clone();
        error.message = format!(
            "{} (after {} retries)",
            last_error.message, self.policy.max_retries
        );
        self.logger.error(
            "Backend call failed after retries",
            Some(&serde_json::json!({
                "method": method.as_str(),
                "status": last_status,
                "attempts": attempts,
            })),
        );
        Err(BackendFailure {
            error,
            status_code: last_status,
            attempts,
        })
    }
}

fn status_error(response: &HttpResponse) -> ToolError {
    let body = response.parsed_body();
    let detail = body
        .get("message")
        .or_else(|| body.get("error"))
        .and_then(|v| v.as_str())
        .map(redact_text)
        .or_else(|| {
            body.as_str()
                .map(|text| redact_text(text).chars().take(200).collect())
        })
        .filter(|text: &String| !text.trim().is_empty());
    let message = match detail {
        Some(detail) => format!("Request failed with status {}: {}", response.status, detail),
        None => format!("Request failed with status {}", response.status),
    };
    ToolError::from_status(response.status, message)
        .with_details(serde_json::json!({"status": response.status, "body": redact_value(&body)}))
}
