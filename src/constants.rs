pub mod network {
    pub const DEFAULT_ONBOARDING_URL: &str = "http://localhost:3000";
    pub const DEFAULT_TRANSACTION_URL: &str = "http://localhost:3001";
    pub const DEFAULT_AUTH_TOKEN_URL: &str = "http://localhost:4000/v1/login/oauth/access_token";
    pub const API_VERSION_PREFIX: &str = "/v1";
    pub const TIMEOUT_API_REQUEST_MS: u64 = 30_000;
}

pub mod retry {
    pub const MAX_RETRIES: u32 = 3;
    pub const BASE_DELAY_MS: u64 = 1_000;
    pub const MAX_DELAY_MS: u64 = 10_000;
    pub const JITTER_MAX_MS: u64 = 200;
}

pub mod pagination {
    pub const MIN_LIMIT: u64 = 1;
    pub const MAX_LIMIT: u64 = 100;
}

pub mod cache {
    pub const TOKEN_TTL_MS: u64 = 5 * 60 * 1_000;
    pub const TOKEN_CACHE_KEY: &str = "ledger:bearer-token";
}

pub mod buffers {
    pub const CRYPTO_KEY_SIZE: usize = 32;
    pub const CRYPTO_IV_SIZE: usize = 12;
    pub const CRYPTO_TAG_SIZE: usize = 16;
}

pub mod crypto {
    pub const ALGORITHM: &str = "aes-256-gcm";
    pub const TOKEN_AAD: &str = "ledger-gateway:token-cache:v1";
}

pub mod identifiers {
    pub const ID_PATTERN: &str = r"^[A-Za-z0-9_-]{1,50}$";
}

pub mod protocols {
    pub const ALLOWED_HTTP: &[&str] = &["http:", "https:"];
}
