use crate::constants::cache::TOKEN_TTL_MS;
use crate::errors::ToolError;
use crate::managers::gateway::ResourceGateway;
use crate::managers::status::GatewayStatus;
use crate::mcp::catalog::tool_catalog;
use crate::services::config::GatewayConfig;
use crate::services::http_transport::{HttpTransport, ReqwestTransport};
use crate::services::logger::Logger;
use crate::services::retry_executor::{RetryExecutor, RetryPolicy};
use crate::services::token_cache::TokenCache;
use crate::services::token_cipher::TokenCipher;
use crate::services::token_manager::TokenManager;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Knobs that production leaves at their defaults and tests shrink.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub retry_policy: RetryPolicy,
    pub token_ttl: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            token_ttl: Duration::from_millis(TOKEN_TTL_MS),
        }
    }
}

pub struct App {
    pub logger: Logger,
    pub config: GatewayConfig,
    pub token_manager: Arc<TokenManager>,
    pub gateway: Arc<ResourceGateway>,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(handlers: &HashMap<String, Arc<dyn ToolHandler>>) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint("Every tool in tool_catalog.json must have a registered handler.")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize(config: GatewayConfig, logger: Logger) -> Result<Self, ToolError> {
        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestTransport::new(config.http_timeout_ms)?);
        Self::with_transport(config, logger, transport, AppOptions::default())
    }

    pub fn with_transport(
        config: GatewayConfig,
        logger: Logger,
        transport: Arc<dyn HttpTransport>,
        options: AppOptions,
    ) -> Result<Self, ToolError> {
        let routes = config.routes()?;

        let cipher = Arc::new(TokenCipher::new(
            config.cache_encryption_key.as_deref(),
            &logger,
        ));
        let cache = TokenCache::with_ttl(logger.clone(), options.token_ttl);
        let token_manager = Arc::new(TokenManager::new(
            logger.clone(),
            config.credentials.clone(),
            config.auth_token_url.clone(),
            cache,
            cipher,
            transport.clone(),
        ));
        let executor = Arc::new(RetryExecutor::new(
            logger.clone(),
            transport,
            options.retry_policy,
        ));

        let gateway = Arc::new(ResourceGateway::new(
            logger.clone(),
            routes,
            token_manager.clone(),
            executor.clone(),
        ));
        let status = Arc::new(GatewayStatus::new(
            logger.clone(),
            config.summary(),
            token_manager.clone(),
            executor,
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert("ledger_resource".to_string(), gateway.clone());
        handlers.insert("gateway_status".to_string(), status);
        Self::validate_tool_wiring(&handlers)?;

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));

        logger.info(
            "Ledger gateway initialized",
            Some(&serde_json::json!({
                "auth_mode": token_manager.auth_mode(),
                "tools": tool_executor.tool_names(),
            })),
        );

        Ok(Self {
            logger,
            config,
            token_manager,
            gateway,
            tool_executor,
        })
    }

    /// Drops cached credentials; the process keeps running.
    pub fn shutdown(&self) {
        self.token_manager.cache().clear();
        self.logger.info("Token cache cleared", None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wiring_check_names_missing_handlers() {
        let handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        let err = App::validate_tool_wiring(&handlers).expect_err("must fail");
        let missing = err
            .details
            .as_ref()
            .and_then(|d| d.get("missing_tools"))
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        assert!(missing.contains(&serde_json::json!("ledger_resource")));
        assert!(missing.contains(&serde_json::json!("gateway_status")));
    }
}
