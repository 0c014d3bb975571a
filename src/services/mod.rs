pub mod config;
pub mod http_transport;
pub mod logger;
pub mod retry_executor;
pub mod token_cache;
pub mod token_cipher;
pub mod token_manager;
pub mod tool_executor;
