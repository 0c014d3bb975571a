use crate::constants::crypto::ALGORITHM;
use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::retry_executor::RetryExecutor;
use crate::services::token_manager::TokenManager;
use serde_json::Value;
use std::sync::Arc;

/// Read-only view of the gateway's runtime state. Never exposes secrets.
#[derive(Clone)]
pub struct GatewayStatus {
    logger: Logger,
    config_summary: Value,
    token_manager: Arc<TokenManager>,
    executor: Arc<RetryExecutor>,
}

impl GatewayStatus {
    pub fn new(
        logger: Logger,
        config_summary: Value,
        token_manager: Arc<TokenManager>,
        executor: Arc<RetryExecutor>,
    ) -> Self {
        Self {
            logger: logger.child("status"),
            config_summary,
            token_manager,
            executor,
        }
    }

    pub fn snapshot(&self) -> Value {
        let policy = self.executor.policy();
        serde_json::json!({
            "config": self.config_summary,
            "auth_mode": self.token_manager.auth_mode(),
            "token_cache": self.token_manager.cache().stats(),
            "token_cipher": ALGORITHM,
            "retry": {
                "max_retries": policy.max_retries,
                "base_delay_ms": policy.base_delay_ms,
                "max_delay_ms": policy.max_delay_ms,
            },
            "log": self.logger.stats(),
        })
    }
}

#[async_trait::async_trait]
impl crate::services::tool_executor::ToolHandler for GatewayStatus {
    async fn handle(&self, _args: Value) -> Result<Value, ToolError> {
        Ok(self.snapshot())
    }
}
