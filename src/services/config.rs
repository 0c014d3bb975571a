use crate::constants::network::{
    DEFAULT_AUTH_TOKEN_URL, DEFAULT_ONBOARDING_URL, DEFAULT_TRANSACTION_URL,
    TIMEOUT_API_REQUEST_MS,
};
use crate::errors::ToolError;
use crate::ledger::routes::{parse_http_url, BackendRoutes};
use crate::services::logger::LogLevel;
use serde_json::Value;
use std::fmt;

/// How the gateway authenticates against the ledger API.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
    StaticKey(String),
    Missing,
}

impl Credentials {
    pub fn mode(&self) -> &'static str {
        match self {
            Credentials::ClientCredentials { .. } => "client_credentials",
            Credentials::StaticKey(_) => "static_key",
            Credentials::Missing => "none",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            Credentials::StaticKey(_) => f.write_str("StaticKey(<redacted>)"),
            Credentials::Missing => f.write_str("Missing"),
        }
    }
}

#[derive(Clone)]
pub struct GatewayConfig {
    pub onboarding_url: String,
    pub transaction_url: String,
    pub auth_token_url: String,
    pub credentials: Credentials,
    pub cache_encryption_key: Option<String>,
    pub http_timeout_ms: u64,
    pub log_level: LogLevel,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("onboarding_url", &self.onboarding_url)
            .field("transaction_url", &self.transaction_url)
            .field("auth_token_url", &self.auth_token_url)
            .field("credentials", &self.credentials)
            .field(
                "cache_encryption_key",
                &self.cache_encryption_key.as_ref().map(|_| "<redacted>"),
            )
            .field("http_timeout_ms", &self.http_timeout_ms)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ToolError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ToolError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let onboarding_url = read("LEDGER_ONBOARDING_URL")
            .unwrap_or_else(|| DEFAULT_ONBOARDING_URL.to_string());
        let transaction_url = read("LEDGER_TRANSACTION_URL")
            .unwrap_or_else(|| DEFAULT_TRANSACTION_URL.to_string());
        let auth_token_url = read("LEDGER_AUTH_TOKEN_URL")
            .unwrap_or_else(|| DEFAULT_AUTH_TOKEN_URL.to_string());
        parse_http_url(&auth_token_url, "LEDGER_AUTH_TOKEN_URL")?;

        let credentials = match (
            read("LEDGER_CLIENT_ID"),
            read("LEDGER_CLIENT_SECRET"),
            read("LEDGER_API_KEY"),
        ) {
            (Some(client_id), Some(client_secret), _) => Credentials::ClientCredentials {
                client_id,
                client_secret,
            },
            (_, _, Some(key)) => Credentials::StaticKey(key),
            _ => Credentials::Missing,
        };

        let http_timeout_ms = match read("LEDGER_HTTP_TIMEOUT_MS") {
            Some(raw) => raw.parse::<u64>().ok().filter(|v| *v > 0).ok_or_else(|| {
                ToolError::invalid_params("LEDGER_HTTP_TIMEOUT_MS must be a positive integer")
            })?,
            None => TIMEOUT_API_REQUEST_MS,
        };

        let log_level = match read("LOG_LEVEL") {
            Some(raw) => LogLevel::parse(&raw).ok_or_else(|| {
                ToolError::invalid_params(format!("Unknown LOG_LEVEL: {}", raw))
                    .with_hint("Use error, warn, info or debug.")
            })?,
            None => LogLevel::Info,
        };

        let config = Self {
            onboarding_url,
            transaction_url,
            auth_token_url,
            credentials,
            cache_encryption_key: read("LEDGER_CACHE_ENCRYPTION_KEY"),
            http_timeout_ms,
            log_level,
        };
        config.routes()?;
        Ok(config)
    }

    pub fn routes(&self) -> Result<BackendRoutes, ToolError> {
        BackendRoutes::new(&self.onboarding_url, &self.transaction_url)
    }

    /// Config view that is safe to hand back to a client.
    pub fn summary(&self) -> Value {
        serde_json::json!({
            "onboarding_url": self.onboarding_url,
            "transaction_url": self.transaction_url,
            "auth_token_url": self.auth_token_url,
            "auth_mode": self.credentials.mode(),
            "cache_key_supplied": self.cache_encryption_key.is_some(),
            "http_timeout_ms": self.http_timeout_ms,
            "log_level": self.log_level.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<GatewayConfig, ToolError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).expect("config");
        assert_eq!(config.onboarding_url, DEFAULT_ONBOARDING_URL);
        assert_eq!(config.transaction_url, DEFAULT_TRANSACTION_URL);
        assert_eq!(config.credentials, Credentials::Missing);
        assert_eq!(config.http_timeout_ms, TIMEOUT_API_REQUEST_MS);
        assert!(config.cache_encryption_key.is_none());
    }

    #[test]
    fn client_credentials_win_over_static_key() {
        let config = config_from(&[
            ("LEDGER_CLIENT_ID", "id"),
            ("LEDGER_CLIENT_SECRET", "secret"),
            ("LEDGER_API_KEY", "key"),
        ])
        .expect("config");
        assert_eq!(config.credentials.mode(), "client_credentials");
    }

    #[test]
    fn half_a_client_pair_falls_back_to_static_key() {
        let config = config_from(&[("LEDGER_CLIENT_ID", "id"), ("LEDGER_API_KEY", "key")])
            .expect("config");
        assert_eq!(config.credentials, Credentials::StaticKey("key".to_string()));
    }

    #[test]
    fn blank_values_are_unset() {
        let config = config_from(&[("LEDGER_API_KEY", "  "), ("LEDGER_CACHE_ENCRYPTION_KEY", "")])
            .expect("config");
        assert_eq!(config.credentials, Credentials::Missing);
        assert!(config.cache_encryption_key.is_none());
    }

    #[test]
    fn invalid_urls_and_timeouts_are_rejected() {
        assert!(config_from(&[("LEDGER_ONBOARDING_URL", "ftp://x")]).is_err());
        assert!(config_from(&[("LEDGER_AUTH_TOKEN_URL", "nope")]).is_err());
        assert!(config_from(&[("LEDGER_HTTP_TIMEOUT_MS", "0")]).is_err());
    }

    #[test]
    fn token_url_must_be_http() {
        let err = config_from(&[("LEDGER_AUTH_TOKEN_URL", "ftp://auth.example.com/token")])
            .expect_err("ftp token url");
        assert_eq!(err.message, "LEDGER_AUTH_TOKEN_URL must use http or https");
        let config = config_from(&[("LEDGER_AUTH_TOKEN_URL", "https://auth.example.com/token")])
            .expect("https token url");
        assert_eq!(config.auth_token_url, "https://auth.example.com/token");
    }

    #[test]
    fn log_level_is_parsed_or_rejected() {
        assert_eq!(config_from(&[]).expect("default").log_level, LogLevel::Info);
        let config = config_from(&[("LOG_LEVEL", "WARNING")]).expect("warning");
        assert_eq!(config.log_level, LogLevel::Warn);
        let err = config_from(&[("LOG_LEVEL", "verbose")]).expect_err("unknown level");
        assert_eq!(err.message, "Unknown LOG_LEVEL: verbose");
    }

    #[test]
    fn summary_and_debug_never_leak_secrets() {
        let config = config_from(&[
            ("LEDGER_CLIENT_ID", "id"),
            ("LEDGER_CLIENT_SECRET", "hunter2"),
            ("LEDGER_CACHE_ENCRYPTION_KEY", "topsecretkey"),
        ])
        .expect("config");
        let summary = config.summary().to_string();
        let debug = format!("{:?}", config);
        for rendered in [summary, debug] {
            assert!(!rendered.contains("hunter2"));
            assert!(!rendered.contains("topsecretkey"));
        }
    }
}
