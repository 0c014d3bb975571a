//! Unified resource gateway: one tool that turns `{operation, resource, mode,
//! params}` into a validated, authenticated and retried ledger API call, or in
//! test mode into a preview of that call.

use crate::errors::ToolError;
use crate::ledger::{
    troubleshooting_tips, validate_request, BackendRoutes, Endpoint, Mode, Operation,
    OperationRequest, ResourceKind, ValidationReport,
};
use crate::services::logger::Logger;
use crate::services::retry_executor::{BackendFailure, RetryExecutor};
use crate::services::token_manager::TokenManager;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEnvelope {
    pub success: bool,
    pub operation: Operation,
    pub resource: ResourceKind,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub troubleshooting: Option<Vec<String>>,
    pub timestamp: String,
}

impl GatewayEnvelope {
    fn base(request: &OperationRequest, success: bool) -> Self {
        Self {
            success,
            operation: request.operation,
            resource: request.resource,
            mode: request.mode,
            data: None,
            error: None,
            error_code: None,
            details: None,
            validation: None,
            expected_response: None,
            note: None,
            status_code: None,
            attempts: None,
            response_time: None,
            troubleshooting: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn failed(request: &OperationRequest, error: &ToolError) -> Self {
        let mut envelope = Self::base(request, false);
        envelope.error = Some(error.message.clone());
        envelope.error_code = Some(error.code.clone());
        envelope.details = error.details.clone();
        envelope.troubleshooting = Some(troubleshooting_tips(&error.message));
        envelope
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            serde_json::json!({"success": false, "error": format!("Failed to encode response: {}", err)})
        })
    }
}

#[derive(Clone)]
pub struct ResourceGateway {
    logger: Logger,
    routes: BackendRoutes,
    token_manager: Arc<TokenManager>,
    executor: Arc<RetryExecutor>,
}

impl ResourceGateway {
    pub fn new(
        logger: Logger,
        routes: BackendRoutes,
        token_manager: Arc<TokenManager>,
        executor: Arc<RetryExecutor>,
    ) -> Self {
        Self {
            logger: logger.child("gateway"),
            routes,
            token_manager,
            executor,
        }
    }

    pub async fn handle_action(&self, args: Value) -> Result<Value, ToolError> {
        let request: OperationRequest = serde_json::from_value(args)
            .map_err(|err| ToolError::invalid_params(format!("Invalid gateway request: {}", err)))?;
        Ok(self.dispatch(&request).await.to_value())
    }

    pub async fn dispatch(&self, request: &OperationRequest) -> GatewayEnvelope {
        let report = validate_request(request.operation, request.resource, &request.params);
        if !report.valid {
            self.logger.info(
                "Rejected gateway request",
                Some(&serde_json::json!({
                    "operation": request.operation,
                    "resource": request.resource,
                    "errors": report.errors,
                })),
            );
            let mut envelope = GatewayEnvelope::base(request, false);
            envelope.error = Some(report.message());
            envelope.error_code = Some("VALIDATION_ERROR".to_string());
            envelope.details = Some(report.details());
            envelope.validation = Some(report);
            return envelope;
        }

        let endpoint = match self
            .routes
            .resolve(request.operation, request.resource, &request.params)
        {
            Ok(endpoint) => endpoint,
            Err(err) => return GatewayEnvelope::failed(request, &err),
        };

        match request.mode {
            Mode::Test => self.preview(request, &endpoint, report),
            Mode::Execute => self.execute(request, &endpoint).await,
        }
    }

    fn preview(
        &self,
        request: &OperationRequest,
        endpoint: &Endpoint,
        report: ValidationReport,
    ) -> GatewayEnvelope {
        let mut envelope = GatewayEnvelope::base(request, true);
        envelope.validation = Some(report);
        envelope.expected_response = Some(expected_response(request, endpoint));
        envelope.note = Some(
            "Test mode: parameters validated and no request was sent. Use mode \"execute\" to call the API."
                .to_string(),
        );
        envelope
    }

    async fn execute(&self, request: &OperationRequest, endpoint: &Endpoint) -> GatewayEnvelope {
        let started = Instant::now();

        let token = match self.token_manager.get_token().await {
            Ok(token) => token,
            Err(err) => {
                self.logger.warn(
                    "Authentication failed",
                    Some(&serde_json::json!({"code": err.code, "error": err.message})),
                );
                let mut envelope = GatewayEnvelope::failed(request, &err);
                envelope.response_time = Some(format_elapsed(started));
                return envelope;
            }
        };

        let outcome = self
            .executor
            .execute(
                endpoint.method.clone(),
                &endpoint.url,
                &token,
                request.params.payload(),
            )
            .await;

        match outcome {
            Ok(response) => {
                self.logger.info(
                    "Gateway request completed",
                    Some(&serde_json::json!({
                        "operation": request.operation,
                        "resource": request.resource,
                        "status": response.status_code,
                        "attempts": response.attempts,
                    })),
                );
                let mut envelope = GatewayEnvelope::base(request, true);
                envelope.data = Some(response.data);
                envelope.status_code = Some(response.status_code);
                envelope.attempts = Some(response.attempts);
                envelope.response_time = Some(format_elapsed(started));
                envelope
            }
            Err(BackendFailure {
                error,
                status_code,
                attempts,
            }) => {
                self.logger.warn(
                    "Gateway request failed",
                    Some(&serde_json::json!({
                        "operation": request.operation,
                        "resource": request.resource,
                        "status": status_code,
                        "attempts": attempts,
                        "code": error.code,
                    })),
                );
                let mut envelope = GatewayEnvelope::failed(request, &error);
                envelope.status_code = status_code;
                envelope.attempts = Some(attempts);
                envelope.response_time = Some(format_elapsed(started));
                envelope
            }
        }
    }
}

fn format_elapsed(started: Instant) -> String {
    format!("{}ms", started.elapsed().as_millis())
}

fn expected_response(request: &OperationRequest, endpoint: &Endpoint) -> Value {
    let entity = request.resource.entity_name();
    let (expected_status, response_shape) = match request.operation {
        Operation::List => {
            let limit = request
                .params
                .pagination
                .as_ref()
                .and_then(|p| p.whole_limit())
                .map(Value::from)
                .unwrap_or(Value::Null);
            (
                200,
                serde_json::json!({
                    "items": [format!("<{}>", entity)],
                    "pagination": {"limit": limit, "nextCursor": "<string|null>"},
                }),
            )
        }
        Operation::Get | Operation::Update => (200, Value::String(format!("<{}>", entity))),
        Operation::Create => (201, Value::String(format!("<{}>", entity))),
        Operation::Delete => (204, Value::Null),
    };
    let request_body = if request.operation.requires_data() {
        request.params.payload().cloned().unwrap_or(Value::Null)
    } else {
        Value::Null
    };

    serde_json::json!({
        "endpoint": endpoint.url,
        "method": endpoint.method.as_str(),
        "service": endpoint.service.as_str(),
        "requiresAuth": true,
        "requestBody": request_body,
        "expectedStatus": expected_status,
        "responseShape": response_shape,
    })
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for ResourceGateway {
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        self.handle_action(args).await
    }
}
