//! Decoding of raw feed payloads into `DomainEvent`s.

use crate::core::DomainEvent;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("payload carries no usable domain")]
    MissingDomain,
}

/// Normalizes a hostname into its storage key.
///
/// Surrounding whitespace and any trailing dots are removed. The key is also
/// ASCII case-folded, since DNS names are case-insensitive, so `Example.COM.`
/// and `example.com` share one record and the stored domain is lowercase.
pub fn normalize_domain(raw: &str) -> String {
    raw.trim().trim_end_matches('.').trim_end().to_ascii_lowercase()
}

/// Parses a raw feed message into a validated `DomainEvent`.
///
/// # Arguments
/// * `raw` - The UTF-8 JSON text received from the feed
///
/// # Returns
/// * `Ok(DomainEvent)` with a non-empty, normalized domain
/// * `Err(DecodeError::MalformedPayload)` if the text is not a JSON object or
///   `domain` is not a string. Other fields are kept as raw JSON whatever
///   their type.
/// * `Err(DecodeError::MissingDomain)` if the domain is absent or empty
pub fn decode(raw: &str) -> Result<DomainEvent, DecodeError> {
    #[derive(Deserialize)]
    struct FeedMessage {
        #[serde(default)]
        domain: Option<String>,
        #[serde(default)]
        cert_index: Option<Value>,
        #[serde(default)]
        ct_name: Option<Value>,
        #[serde(default)]
        timestamp: Option<Value>,
        #[serde(default)]
        confidence: Option<Value>,
    }

    let value: Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;
    if !value.is_object() {
        return Err(DecodeError::MalformedPayload(
            "expected a JSON object".to_string(),
        ));
    }

    let message: FeedMessage =
        serde_json::from_value(value).map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;

    let domain = message
        .domain
        .as_deref()
        .map(normalize_domain)
        .filter(|d| !d.is_empty())
        .ok_or(DecodeError::MissingDomain)?;

    Ok(DomainEvent {
        domain,
        cert_index: message.cert_index,
        source_name: message.ct_name,
        observed_timestamp: message.timestamp,
        confidence: message.confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_message() {
        let raw = r#"{
            "domain": "example.com.",
            "cert_index": 918273,
            "ct_name": "Google 'Xenon2025h1' log",
            "timestamp": 1735689600,
            "confidence": 0.87
        }"#;

        let event = decode(raw).unwrap();
        assert_eq!(event.domain, "example.com");
        assert_eq!(event.cert_index, Some(json!(918273)));
        assert_eq!(event.source_name, Some(json!("Google 'Xenon2025h1' log")));
        assert_eq!(event.observed_timestamp, Some(json!(1735689600)));
        assert_eq!(event.confidence, Some(json!(0.87)));
    }

    #[test]
    fn test_decode_domain_only() {
        let event = decode(r#"{"domain": "example.org"}"#).unwrap();
        assert_eq!(event, DomainEvent::new("example.org"));
    }

    #[test]
    fn test_decode_null_optionals_are_absent() {
        let event =
            decode(r#"{"domain": "a.net", "cert_index": null, "ct_name": null}"#).unwrap();
        assert_eq!(event.cert_index, None);
        assert_eq!(event.source_name, None);
    }

    #[test]
    fn test_decode_keeps_domain_when_optionals_have_unexpected_types() {
        let event = decode(r#"{"domain": "kept.example", "confidence": "high"}"#).unwrap();
        assert_eq!(event.domain, "kept.example");
        assert_eq!(event.confidence, Some(json!("high")));

        let event = decode(
            r#"{"domain": "kept.example", "ct_name": 7, "timestamp": "yesterday", "cert_index": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(event.source_name, Some(json!(7)));
        assert_eq!(event.observed_timestamp, Some(json!("yesterday")));
        assert_eq!(event.cert_index, Some(json!([1, 2])));
    }

    #[test]
    fn test_decode_strips_repeated_trailing_dots() {
        let event = decode(r#"{"domain": "Example.COM..."}"#).unwrap();
        assert_eq!(event.domain, "example.com");
    }

    #[test]
    fn test_decode_missing_domain() {
        assert_eq!(
            decode(r#"{"cert_index": 1}"#),
            Err(DecodeError::MissingDomain)
        );
        assert_eq!(decode(r#"{"domain": null}"#), Err(DecodeError::MissingDomain));
    }

    #[test]
    fn test_decode_domain_of_only_dots_is_missing() {
        assert_eq!(decode(r#"{"domain": ".."}"#), Err(DecodeError::MissingDomain));
        assert_eq!(decode(r#"{"domain": "  "}"#), Err(DecodeError::MissingDomain));
    }

    #[test]
    fn test_decode_invalid_json() {
        let result = decode(r#"{"domain": "example.com""#);
        assert!(matches!(result, Err(DecodeError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(matches!(
            decode(r#"["example.com"]"#),
            Err(DecodeError::MalformedPayload(_))
        ));
        assert!(matches!(
            decode(r#""example.com""#),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_wrong_domain_type() {
        assert!(matches!(
            decode(r#"{"domain": 42}"#),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain(" Sub.Example.com. "), "sub.example.com");
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("."), "");
    }
}
