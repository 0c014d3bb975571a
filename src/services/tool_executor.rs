use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::utils::suggest::suggest;

use serde_json::Value;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<Value, ToolError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Runs a tool and wraps its result as `{result, meta}`.
    pub async fn execute(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        let handler = self.handlers.get(tool).cloned().ok_or_else(|| {
            let known = self.tool_names();
            let did_you_mean = suggest(tool, &known, 3);
            let mut err = ToolError::not_found(format!("Unknown tool: {}", tool))
                .with_details(serde_json::json!({"known_tools": known}));
            if !did_you_mean.is_empty() {
                err = err.with_hint(format!("Did you mean: {}?", did_you_mean.join(", ")));
            }
            err
        })?;

        let trace_id = args
            .get("trace_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let started = Instant::now();
        self.logger.debug(
            "Tool call started",
            Some(&serde_json::json!({"tool": tool, "trace_id": trace_id})),
        );

        let outcome = handler.handle(args).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                self.logger.debug(
                    "Tool call finished",
                    Some(&serde_json::json!({
                        "tool": tool,
                        "trace_id": trace_id,
                        "duration_ms": duration_ms,
                    })),
                );
                Ok(serde_json::json!({
                    "result": result,
                    "meta": {
                        "tool": tool,
                        "trace_id": trace_id,
                        "duration_ms": duration_ms,
                    },
                }))
            }
            Err(err) => {
                self.logger.warn(
                    "Tool call failed",
                    Some(&serde_json::json!({
                        "tool": tool,
                        "trace_id": trace_id,
                        "code": err.code,
                        "duration_ms": duration_ms,
                    })),
                );
                Err(err)
            }
        }
    }
}
