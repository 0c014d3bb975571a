use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    Auth,
    NotFound,
    Client,
    Server,
    Network,
    Timeout,
    Internal,
}

impl ToolErrorKind {
    /// Server and connection-level failures are worth another attempt; anything
    /// the caller sent wrong is not.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ToolErrorKind::Server | ToolErrorKind::Network | ToolErrorKind::Timeout
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub retryable: bool,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
            retryable: kind.is_retryable(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "VALIDATION_ERROR", message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Auth, "AUTH_ERROR", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, "NOT_FOUND", message)
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Client, "CLIENT_ERROR", message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Server, "SERVER_ERROR", message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Network, "NETWORK_ERROR", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }

    /// Classifies a non-2xx backend status into the client/server taxonomy.
    /// Only 5xx is retryable; informational and redirect statuses that reach
    /// here are reported as unexpected.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::auth(message),
            404 => Self::not_found(message),
            400..=499 => Self::client(message),
            500..=599 => Self::server(message),
            _ => Self::new(ToolErrorKind::Client, "UNEXPECTED_STATUS", message),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}
