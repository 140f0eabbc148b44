//! Redaction helpers for keeping secrets out of logs and error text.
//!
//! Dependency failures are logged before they propagate, so every message
//! that might embed an API key passes through [`sanitize`] first.

use std::sync::LazyLock;

use regex::Regex;

/// API-key shaped tokens that must never reach a log line verbatim.
static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sk-[A-Za-z0-9]{10,}").expect("valid redaction pattern"));

/// Masks a secret value, keeping at most the first and last two characters.
pub fn mask(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}****{tail}")
}

/// Scrubs key-shaped tokens and any known secret values from `message`.
pub fn sanitize(message: &str, secrets: &[&str]) -> String {
    let mut sanitized = KEY_PATTERN.replace_all(message, "sk-****").into_owned();
    for secret in secrets {
        if !secret.is_empty() {
            sanitized = sanitized.replace(secret, &mask(secret));
        }
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_short_values_completely() {
        assert_eq!(mask("abcd"), "****");
        assert_eq!(mask(""), "");
    }

    #[test]
    fn masks_long_values_keeping_edges() {
        assert_eq!(mask("supersecret"), "su****et");
    }

    #[test]
    fn sanitize_replaces_key_shaped_tokens() {
        let message = "request failed: key sk-ABCDEF1234567890 rejected";
        assert_eq!(
            sanitize(message, &[]),
            "request failed: key sk-**** rejected"
        );
    }

    #[test]
    fn sanitize_replaces_known_secrets() {
        let message = "auth header was topsecretvalue";
        assert_eq!(
            sanitize(message, &["topsecretvalue"]),
            "auth header was to****ue"
        );
    }

    #[test]
    fn sanitize_ignores_empty_secrets() {
        assert_eq!(sanitize("no change", &[""]), "no change");
    }
}
