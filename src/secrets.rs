//! Credential values supplied by the host and log redaction helpers.

use std::fmt;

use serde::de::Deserializer;
use serde::Deserialize;
use serde_json::Value;

const SECRET_KEY_FIELD: &str = "secretKey";

/// A credential string that never appears in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(<redacted>)")
    }
}

/// Reads a credential given either as `{"secretKey": "..."}` or a plain
/// string. Any other shape counts as absent rather than failing the whole
/// connection payload.
pub fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|val| match val {
        Value::String(text) => Some(SecretString(text)),
        Value::Object(mut map) => match map.remove(SECRET_KEY_FIELD) {
            Some(Value::String(text)) => Some(SecretString(text)),
            _ => None,
        },
        _ => None,
    }))
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn shorten_for_log(value: &str, limit: usize) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() <= limit {
        return trimmed.to_string();
    }
    if limit <= 1 {
        return "…".to_string();
    }
    let mut truncated: String = trimmed.chars().take(limit - 1).collect();
    truncated.push('…');
    truncated
}

/// Shortens a log detail and hides it entirely when it looks like it may
/// contain credentials.
pub fn redact_log_details(value: &str) -> String {
    let collapsed = collapse_whitespace(value);
    let category = collapsed
        .split(':')
        .next()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .unwrap_or("error");
    let lowered = collapsed.to_lowercase();
    let has_sensitive_hint = [
        "access_token",
        "authorization:",
        "bearer ",
        "client_secret",
        "secretkey",
        "password",
        "set-cookie",
    ]
    .iter()
    .any(|hint| lowered.contains(hint));

    if has_sensitive_hint {
        return format!(
            "{}: <redacted-sensitive-details>",
            shorten_for_log(category, 64)
        );
    }

    shorten_for_log(&collapsed, 300)
}

/// Short prefix of an identifier, enough to tell configurations apart in logs.
pub fn mask_identifier(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{prefix}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_secret")]
        secret: Option<SecretString>,
    }

    fn parse(value: serde_json::Value) -> Option<SecretString> {
        serde_json::from_value::<Holder>(value).unwrap().secret
    }

    #[test]
    fn wrapped_and_plain_secrets_are_accepted() {
        assert_eq!(
            parse(json!({"secret": {"secretKey": "s3cr3t"}})).unwrap().expose(),
            "s3cr3t"
        );
        assert_eq!(parse(json!({"secret": "plain"})).unwrap().expose(), "plain");
    }

    #[test]
    fn other_shapes_are_treated_as_absent() {
        assert!(parse(json!({"secret": 42})).is_none());
        assert!(parse(json!({"secret": {"value": "x"}})).is_none());
        assert!(parse(json!({"secret": null})).is_none());
        assert!(parse(json!({})).is_none());
    }

    #[test]
    fn debug_never_prints_secret() {
        let secret = SecretString::new("hunter2");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    #[test]
    fn sensitive_details_are_redacted() {
        let redacted = redact_log_details("Token refresh failed: client_secret=abc rejected");
        assert_eq!(redacted, "Token refresh failed: <redacted-sensitive-details>");
        assert_eq!(redact_log_details("HTTP   404\n not found"), "HTTP 404 not found");
    }

    #[test]
    fn long_log_details_are_shortened_with_ellipsis() {
        assert_eq!(shorten_for_log("  short  ", 10), "short");
        assert_eq!(shorten_for_log("abcdefghij", 5), "abcd…");
        assert_eq!(shorten_for_log("abc", 1), "…");
        assert_eq!(redact_log_details(&"x".repeat(400)).chars().count(), 300);
    }

    #[test]
    fn identifiers_are_masked() {
        assert_eq!(mask_identifier("abcdef-1234"), "abcd…");
        assert_eq!(mask_identifier("abc"), "****");
    }
}
