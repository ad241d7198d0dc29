//! Secret redaction for structured log fields.
//!
//! Sign-in logs must never carry passwords, one-time codes, attempt codes or
//! tokens, whatever field name a call site happens to use for them.

use serde_json::{Map, Value};

pub(crate) const REDACTED: &str = "[REDACTED]";

const MAX_STRING_LEN: usize = 512;

/// Keys redacted when they contain one of these fragments.
const DENYLIST_FRAGMENTS: [&str; 7] = [
    "password",
    "token",
    "secret",
    "authorization",
    "cookie",
    "publishable_client_key",
    "private_key",
];

/// Keys redacted only on an exact match; as fragments they would hit
/// harmless names like `status_code`.
const DENYLIST_EXACT: [&str; 6] = ["code", "otp", "totp", "nonce", "attempt_code", "otp_buffer"];

pub(crate) fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST_EXACT.contains(&lower.as_str())
        || DENYLIST_FRAGMENTS.iter().any(|entry| lower.contains(entry))
}

pub(crate) fn sanitize_value(key: &str, value: Value) -> Value {
    if is_sensitive_key(key) {
        return Value::String(REDACTED.to_string());
    }

    match value {
        Value::String(s) => sanitize_string(s),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let v = sanitize_value(&k, v);
                    (k, v)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| sanitize_value(key, item))
                .collect(),
        ),
        other => other,
    }
}

fn sanitize_string(raw: String) -> Value {
    if looks_like_sensitive_value(&raw) {
        return Value::String(REDACTED.to_string());
    }
    if raw.len() > MAX_STRING_LEN {
        return Value::String(format!("[TRUNCATED:len={}]", raw.len()));
    }
    Value::String(raw)
}

fn looks_like_sensitive_value(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("bearer ") {
        return true;
    }
    // JWT shape
    if raw.matches('.').count() == 2 && raw.len() > 40 && !raw.contains(' ') {
        return true;
    }
    is_long_hex(raw) || is_long_base64(raw)
}

fn is_long_hex(value: &str) -> bool {
    value.len() > 48 && value.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_long_base64(value: &str) -> bool {
    value.len() > 48
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=' || c == '_')
}
