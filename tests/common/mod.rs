#![allow(dead_code)]

use async_trait::async_trait;
use ledger_gateway::errors::ToolError;
use ledger_gateway::services::config::GatewayConfig;
use ledger_gateway::services::http_transport::{HttpRequest, HttpResponse, HttpTransport, RequestBody};
use ledger_gateway::services::retry_executor::RetryPolicy;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub static ENV_LOCK: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

pub type Scripted = Result<HttpResponse, ToolError>;

/// Transport fake. Token exchanges (form bodies) and resource calls are
/// answered from separate queues; an empty queue falls back to a fixed reply.
pub struct ScriptedTransport {
    token_queue: Mutex<VecDeque<Scripted>>,
    api_queue: Mutex<VecDeque<Scripted>>,
    api_fallback: Mutex<Scripted>,
    token_delay: Duration,
    pub token_calls: AtomicUsize,
    pub api_calls: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            token_queue: Mutex::new(VecDeque::new()),
            api_queue: Mutex::new(VecDeque::new()),
            api_fallback: Mutex::new(Ok(json_response(200, serde_json::json!({})))),
            token_delay: Duration::ZERO,
            token_calls: AtomicUsize::new(0),
            api_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }

    pub fn push_token(&self, reply: Scripted) -> &Self {
        self.token_queue.lock().unwrap().push_back(reply);
        self
    }

    pub fn push_api(&self, reply: Scripted) -> &Self {
        self.api_queue.lock().unwrap().push_back(reply);
        self
    }

    pub fn repeat_api(&self, reply: Scripted) {
        *self.api_fallback.lock().unwrap() = reply;
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn api_requests(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|req| !matches!(req.body, Some(RequestBody::Form(_))))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ToolError> {
        let is_token = matches!(request.body, Some(RequestBody::Form(_)));
        self.requests.lock().unwrap().push(request);

        if is_token {
            self.token_calls.fetch_add(1, Ordering::SeqCst);
            if !self.token_delay.is_zero() {
                tokio::time::sleep(self.token_delay).await;
            }
            let next = self.token_queue.lock().unwrap().pop_front();
            return next.unwrap_or_else(|| Ok(token_response("tok-default")));
        }

        self.api_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.api_queue.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.api_fallback.lock().unwrap().clone())
    }
}

pub fn json_response(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        content_type: Some("application/json".to_string()),
        body: body.to_string(),
    }
}

pub fn empty_response(status: u16) -> HttpResponse {
    HttpResponse {
        status,
        content_type: None,
        body: String::new(),
    }
}

pub fn token_response(token: &str) -> HttpResponse {
    json_response(
        200,
        serde_json::json!({"access_token": token, "token_type": "Bearer", "expires_in": 3600}),
    )
}

pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay_ms: 1,
        max_delay_ms: 5,
        jitter_max_ms: 0,
    }
}

pub fn config_with(pairs: &[(&str, &str)]) -> GatewayConfig {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    GatewayConfig::from_lookup(|key| map.get(key).cloned()).expect("test config")
}

pub fn oauth_config() -> GatewayConfig {
    config_with(&[
        ("LEDGER_ONBOARDING_URL", "http://onboarding.test"),
        ("LEDGER_TRANSACTION_URL", "http://transaction.test/"),
        ("LEDGER_AUTH_TOKEN_URL", "http://auth.test/v1/login/oauth/access_token"),
        ("LEDGER_CLIENT_ID", "client-1"),
        ("LEDGER_CLIENT_SECRET", "secret-1"),
        ("LEDGER_CACHE_ENCRYPTION_KEY", "integration-test-key"),
    ])
}
