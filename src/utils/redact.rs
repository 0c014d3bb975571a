use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const REDACTED: &str = "***REDACTED***";

const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "secret",
    "token",
    "api_key",
    "apikey",
    "client_secret",
    "access_token",
    "refresh_token",
    "authorization",
    "encryption_key",
];

static INLINE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b")
                .expect("inline redaction regex"),
            REDACTED,
        ),
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~+/=-]{10,})").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r"(?i)\b(client_secret|access_token|api_key)=([^&\s]+)")
                .expect("inline redaction regex"),
            "$1=***REDACTED***",
        ),
    ]
});

fn is_sensitive_key(key: &str) -> bool {
    let normalized: String = key
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase();
    let snake = normalized.replace('_', "");
    SENSITIVE_KEYS
        .iter()
        .any(|candidate| normalized == *candidate || snake == candidate.replace('_', ""))
}

/// Masks bearer tokens, JWTs and credential query pairs inside free text.
pub fn redact_text(text: &str) -> String {
    let mut out = text.to_string();
    for (pattern, replacement) in INLINE_PATTERNS.iter() {
        out = pattern.replace_all(&out, *replacement).into_owned();
    }
    out
}

/// Masks values under credential-looking keys, recursively.
pub fn redact_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let masked = if is_sensitive_key(key) && !val.is_null() {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_value(val)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        Value::String(text) => Value::String(redact_text(text)),
        other => other.clone(),
    }
}
