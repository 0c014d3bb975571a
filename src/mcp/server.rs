use crate::app::App;
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::mcp::catalog::{list_tools, tool_by_name, tool_names, validate_tool_args};
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::services::config::GatewayConfig;
use crate::services::logger::Logger;
use crate::utils::suggest::suggest;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "ledger-gateway";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Folds the executor's `meta` into the tool result so clients get a single
/// JSON document per call.
fn render_tool_result(payload: Value) -> Value {
    let meta = payload.get("meta").cloned().unwrap_or(Value::Null);
    let result = payload.get("result").cloned().unwrap_or(payload);
    let failed = result.get("success").and_then(|v| v.as_bool()) == Some(false);

    let document = match result {
        Value::Object(mut map) => {
            map.insert("meta".to_string(), meta);
            Value::Object(map)
        }
        other => serde_json::json!({"result": other, "meta": meta}),
    };
    let text = serde_json::to_string(&document).unwrap_or_else(|_| "{}".to_string());

    let mut out = serde_json::json!({
        "content": [ { "type": "text", "text": text } ]
    });
    if failed {
        out["isError"] = Value::Bool(true);
    }
    out
}

pub struct McpServer {
    app: Arc<App>,
    logger: Logger,
}

impl McpServer {
    pub fn new(app: Arc<App>) -> Self {
        let logger = app.logger.child("mcp");
        Self { app, logger }
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"list": true, "call": true}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": list_tools() })
    }

    pub async fn handle_tools_call(&self, name: &str, args: Value) -> Result<Value, McpError> {
        if tool_by_name(name).is_none() {
            let did_you_mean = suggest(name, &tool_names(), 3);
            let mut message = format!("Unknown tool: {}", name);
            if !did_you_mean.is_empty() {
                message.push_str(&format!("\nDid you mean: {}", did_you_mean.join(", ")));
            }
            return Err(McpError::new(ErrorCode::InvalidParams, message));
        }

        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        validate_tool_args(name, &args)?;

        let payload = self
            .app
            .tool_executor
            .execute(name, args)
            .await
            .map_err(|err| McpError::from_tool_error(name, &err))?;
        Ok(render_tool_result(payload))
    }

    /// Handles one line of input. `None` means nothing goes back on the wire.
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let parsed: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::ParseError.as_i32(),
                    "Parse error".to_string(),
                ))
            }
        };
        let request: JsonRpcRequest = match serde_json::from_value(parsed) {
            Ok(req) => req,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::InvalidRequest.as_i32(),
                    "Invalid request".to_string(),
                ))
            }
        };

        if request.method.starts_with("notifications/") {
            return request
                .id
                .map(|id| JsonRpcResponse::success(id, serde_json::json!({})));
        }
        let id = request.id?;

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.handle_initialize()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.handle_tools_list()),
            "tools/call" => {
                let params = request.params.as_object().cloned().unwrap_or_default();
                let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
                if name.is_empty() {
                    JsonRpcResponse::failure(
                        id,
                        ErrorCode::InvalidParams.as_i32(),
                        "Missing tool name".to_string(),
                    )
                } else {
                    let args = params.get("arguments").cloned().unwrap_or(Value::Null);
                    match self.handle_tools_call(name, args).await {
                        Ok(result) => JsonRpcResponse::success(id, result),
                        Err(err) => JsonRpcResponse::from_error(id, err),
                    }
                }
            }
            other => {
                self.logger.debug(
                    "Unknown JSON-RPC method",
                    Some(&serde_json::json!({"method": other})),
                );
                JsonRpcResponse::failure(
                    id,
                    ErrorCode::MethodNotFound.as_i32(),
                    "Method not found".to_string(),
                )
            }
        };
        Some(response)
    }

    /// Newline-delimited JSON-RPC loop; returns when the reader hits EOF.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ToolError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut writer = BufWriter::new(writer);

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|err| ToolError::internal(err.to_string()))?
        {
            if let Some(response) = self.handle_message(&line).await {
                writer.write_all(response.to_line().as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }
}

pub async fn run_stdio(config: GatewayConfig, logger: Logger) -> Result<(), ToolError> {
    let app = Arc::new(App::initialize(config, logger.clone())?);
    let server = McpServer::new(app.clone());
    logger.info("Ledger gateway listening on stdio", None);
    let outcome = server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await;
    app.shutdown();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_results_carry_meta_and_error_flag() {
        let payload = serde_json::json!({
            "result": {"success": false, "error": "boom"},
            "meta": {"tool": "ledger_resource", "trace_id": "t1", "duration_ms": 3},
        });
        let rendered = render_tool_result(payload);
        assert_eq!(rendered["isError"], true);
        let text = rendered["content"][0]["text"].as_str().expect("text");
        let document: Value = serde_json::from_str(text).expect("json");
        assert_eq!(document["error"], "boom");
        assert_eq!(document["meta"]["trace_id"], "t1");
    }

    #[test]
    fn successful_results_have_no_error_flag() {
        let payload = serde_json::json!({
            "result": {"success": true},
            "meta": {"tool": "gateway_status"},
        });
        let rendered = render_tool_result(payload);
        assert!(rendered.get("isError").is_none());
    }
}
