mod common;
use common::ENV_LOCK;

use ledger_gateway::services::config::{Credentials, GatewayConfig};
use ledger_gateway::services::logger::LogLevel;

const KEYS: &[&str] = &[
    "LEDGER_ONBOARDING_URL",
    "LEDGER_TRANSACTION_URL",
    "LEDGER_AUTH_TOKEN_URL",
    "LEDGER_CLIENT_ID",
    "LEDGER_CLIENT_SECRET",
    "LEDGER_API_KEY",
    "LEDGER_CACHE_ENCRYPTION_KEY",
    "LEDGER_HTTP_TIMEOUT_MS",
    "LOG_LEVEL",
];

fn snapshot() -> Vec<(&'static str, Option<String>)> {
    KEYS.iter().map(|key| (*key, std::env::var(key).ok())).collect()
}

fn restore(previous: Vec<(&'static str, Option<String>)>) {
    for (key, value) in previous {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

#[tokio::test]
async fn from_env_reads_process_environment() {
    let _guard = ENV_LOCK.lock().await;
    let previous = snapshot();
    for key in KEYS {
        std::env::remove_var(key);
    }

    std::env::set_var("LEDGER_ONBOARDING_URL", "https://onboarding.example.com");
    std::env::set_var("LEDGER_API_KEY", "key-123");
    std::env::set_var("LEDGER_HTTP_TIMEOUT_MS", "1500");
    std::env::set_var("LOG_LEVEL", "debug");

    let config = GatewayConfig::from_env();
    restore(previous);

    let config = config.expect("config");
    assert_eq!(config.onboarding_url, "https://onboarding.example.com");
    assert_eq!(config.credentials, Credentials::StaticKey("key-123".to_string()));
    assert_eq!(config.http_timeout_ms, 1500);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(!format!("{:?}", config).contains("key-123"));
}

#[tokio::test]
async fn from_env_rejects_non_http_backends() {
    let _guard = ENV_LOCK.lock().await;
    let previous = snapshot();
    for key in KEYS {
        std::env::remove_var(key);
    }

    std::env::set_var("LEDGER_TRANSACTION_URL", "ftp://transaction.example.com");
    let result = GatewayConfig::from_env();
    restore(previous);

    let err = result.expect_err("ftp must be rejected");
    assert!(err.message.contains("http or https"));
}

#[tokio::test]
async fn from_env_rejects_bad_token_url_and_log_level() {
    let _guard = ENV_LOCK.lock().await;
    let previous = snapshot();
    for key in KEYS {
        std::env::remove_var(key);
    }

    std::env::set_var("LEDGER_AUTH_TOKEN_URL", "ftp://auth.example.com/token");
    let bad_url = GatewayConfig::from_env();
    std::env::remove_var("LEDGER_AUTH_TOKEN_URL");
    std::env::set_var("LOG_LEVEL", "loud");
    let bad_level = GatewayConfig::from_env();
    restore(previous);

    let err = bad_url.expect_err("ftp token url must be rejected");
    assert!(err.message.contains("LEDGER_AUTH_TOKEN_URL"));
    let err = bad_level.expect_err("unknown log level must be rejected");
    assert_eq!(err.message, "Unknown LOG_LEVEL: loud");
}
