use crate::constants::cache::TOKEN_CACHE_KEY;
use crate::errors::ToolError;
use crate::services::config::Credentials;
use crate::services::http_transport::{HttpRequest, HttpTransport, RequestBody};
use crate::services::logger::Logger;
use crate::services::token_cache::TokenCache;
use crate::services::token_cipher::TokenCipher;
use crate::utils::redact::redact_text;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

/// Hands out bearer tokens for backend calls.
///
/// Lookup order: a fresh cached token, then a static API key, then a
/// client-credentials exchange whose result is sealed into the cache. No
/// single-flight: concurrent misses may each run an exchange.
#[derive(Clone)]
pub struct TokenManager {
    logger: Logger,
    credentials: Credentials,
    token_url: String,
    cache: TokenCache,
    cipher: Arc<TokenCipher>,
    transport: Arc<dyn HttpTransport>,
}

impl TokenManager {
    pub fn new(
        logger: Logger,
        credentials: Credentials,
        token_url: String,
        cache: TokenCache,
        cipher: Arc<TokenCipher>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            logger: logger.child("token"),
            credentials,
            token_url,
            cache,
            cipher,
            transport,
        }
    }

    pub fn auth_mode(&self) -> &'static str {
        self.credentials.mode()
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    pub async fn get_token(&self) -> Result<String, ToolError> {
        if let Some(token) = self.read_cached() {
            return Ok(token);
        }

        match &self.credentials {
            Credentials::StaticKey(key) => Ok(key.clone()),
            Credentials::ClientCredentials {
                client_id,
                client_secret,
            } => {
                let token = self.exchange(client_id, client_secret).await?;
                self.write_cached(&token);
                Ok(token)
            }
            Credentials::Missing => Err(ToolError::auth("No ledger credentials configured")
                .with_hint(
                    "Set LEDGER_CLIENT_ID and LEDGER_CLIENT_SECRET, or LEDGER_API_KEY.",
                )),
        }
    }

    /// Decryption failures evict the entry and read as a miss.
    fn read_cached(&self) -> Option<String> {
        let sealed = self.cache.get(TOKEN_CACHE_KEY)?;
        match self.cipher.open(&sealed) {
            Ok(token) => Some(token),
            Err(err) => {
                self.cache.remove(TOKEN_CACHE_KEY);
                self.logger.warn(
                    "Discarded unreadable cached token",
                    Some(&serde_json::json!({"reason": err.to_string()})),
                );
                None
            }
        }
    }

    fn write_cached(&self, token: &str) {
        match self.cipher.seal(token) {
            Ok(sealed) => self.cache.set(TOKEN_CACHE_KEY, sealed),
            Err(err) => self.logger.warn(
                "Token not cached",
                Some(&serde_json::json!({"reason": err.to_string()})),
            ),
        }
    }

    async fn exchange(&self, client_id: &str, client_secret: &str) -> Result<String, ToolError> {
        let request = HttpRequest {
            method: Method::POST,
            url: self.token_url.clone(),
            bearer: None,
            body: Some(RequestBody::Form(vec![
                ("grant_type".to_string(), "client_credentials".to_string()),
                ("client_id".to_string(), client_id.to_string()),
                ("client_secret".to_string(), client_secret.to_string()),
            ])),
        };

        let response = self.transport.send(request).await.map_err(|err| {
            ToolError::auth(format!("Token exchange failed: {}", redact_text(&err.message)))
                .with_details(serde_json::json!({"cause": err.code}))
        })?;

        if !response.is_success() {
            self.logger.error(
                "Token exchange rejected",
                Some(&serde_json::json!({"status": response.status})),
            );
            return Err(ToolError::auth(format!(
                "Token exchange failed with status {}",
                response.status
            ))
            .with_details(serde_json::json!({"status": response.status})));
        }

        let payload: Value = serde_json::from_str(&response.body)
            .map_err(|_| ToolError::auth("Token endpoint returned invalid JSON"))?;
        let token = payload
            .get("access_token")
            .or_else(|| payload.get("accessToken"))
            .and_then(|v| v.as_str())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ToolError::auth("Token response did not include an access token"))?;

        self.logger.info("Obtained bearer token via client credentials", None);
        Ok(token.to_string())
    }
}
