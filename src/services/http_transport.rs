use crate::errors::ToolError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<RequestBody>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_lowercase().contains("json"))
            .unwrap_or(false)
    }

    /// JSON when the content type says so and the body parses, raw text otherwise.
    pub fn parsed_body(&self) -> Value {
        if self.body.is_empty() {
            return Value::Null;
        }
        if self.is_json() {
            if let Ok(parsed) = serde_json::from_str::<Value>(&self.body) {
                return parsed;
            }
        }
        Value::String(self.body.clone())
    }
}

/// The one seam between the gateway and the network.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ToolError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout_ms: u64) -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ToolError> {
        let mut req = self
            .client
            .request(request.method, &request.url)
            .header(ACCEPT, "application/json");
        if let Some(token) = &request.bearer {
            req = req.bearer_auth(token);
        }
        match request.body {
            Some(RequestBody::Json(body)) => {
                req = req.json(&body);
            }
            Some(RequestBody::Form(pairs)) => {
                let encoded = serde_urlencoded::to_string(&pairs).map_err(|err| {
                    ToolError::internal(format!("Failed to encode form body: {}", err))
                })?;
                req = req
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(encoded);
            }
            None => {}
        }

        let response = req.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ToolError {
    if err.is_timeout() {
        return ToolError::timeout(format!("HTTP request timed out: {}", err));
    }
    ToolError::network(format!("Network error: {}", err))
}
