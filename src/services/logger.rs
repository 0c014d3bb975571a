use crate::utils::redact::redact_value;
use serde_json::Value;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    error: u64,
    warn: u64,
    info: u64,
    debug: u64,
}

/// Line-oriented stderr logger. stdout belongs to the JSON-RPC channel.
#[derive(Debug, Clone)]
pub struct Logger {
    context: String,
    level: LogLevel,
    counters: Arc<Mutex<Counters>>,
}

impl Logger {
    pub fn new(context: &str, level: LogLevel) -> Self {
        Self {
            context: context.to_string(),
            level,
            counters: Arc::new(Mutex::new(Counters::default())),
        }
    }

    /// Logger that drops everything below `error`; handy in tests.
    pub fn quiet(context: &str) -> Self {
        Self::new(context, LogLevel::Error)
    }

    pub fn child(&self, suffix: &str) -> Self {
        let context = if suffix.is_empty() {
            self.context.clone()
        } else {
            format!("{}:{}", self.context, suffix)
        };
        Self {
            context,
            level: self.level,
            counters: self.counters.clone(),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    fn log(&self, level: LogLevel, message: &str, meta: Option<&Value>) {
        if level > self.level {
            return;
        }
        if let Ok(mut counters) = self.counters.lock() {
            match level {
                LogLevel::Error => counters.error += 1,
                LogLevel::Warn => counters.warn += 1,
                LogLevel::Info => counters.info += 1,
                LogLevel::Debug => counters.debug += 1,
            }
        }
        let meta_suffix = meta
            .filter(|m| !m.is_null())
            .map(|m| format!(" {}", redact_value(m)))
            .unwrap_or_default();
        eprintln!(
            "[{}] {} [{}] {}{}",
            chrono::Utc::now().to_rfc3339(),
            level.as_str().to_uppercase(),
            self.context,
            message,
            meta_suffix
        );
    }

    pub fn error(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Error, message, meta);
    }

    pub fn warn(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Warn, message, meta);
    }

    pub fn info(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Info, message, meta);
    }

    pub fn debug(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Debug, message, meta);
    }

    pub fn stats(&self) -> Value {
        let counters = self.counters.lock().unwrap_or_else(|err| err.into_inner());
        serde_json::json!({
            "level": self.level.as_str(),
            "context": self.context,
            "error": counters.error,
            "warn": counters.warn,
            "info": counters.info,
            "debug": counters.debug,
        })
    }
}
