//! Verified token claims.
//!
//! Contains the claim set produced by successful token verification. The
//! `sub` and `preferred_username` fields identify a person and are redacted
//! in Debug output to keep them out of logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The `aud` claim: a single audience string or a list of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience value.
    Single(String),

    /// Multiple audience values.
    Multiple(Vec<String>),
}

impl Audience {
    /// Check whether the given audience is present among the claim's
    /// value(s).
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|a| a == audience),
        }
    }
}

/// Claim set extracted from a verified token.
///
/// Created only as the successful output of verification; consumed
/// read-only by handlers. Provider-specific claims that have no typed field
/// land in `extra`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user or client identifier) - redacted in Debug output.
    pub sub: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Issuer identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience value(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Provider-supplied username - redacted in Debug output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Remaining provider-specific claims.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Custom Debug implementation that redacts identifying fields.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field(
                "preferred_username",
                &self.preferred_username.as_ref().map(|_| "[REDACTED]"),
            )
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Claims {
    /// The provider username: `preferred_username`, falling back to the
    /// `upn` claim some providers send instead.
    pub fn username(&self) -> Option<&str> {
        self.preferred_username
            .as_deref()
            .or_else(|| self.extra.get("upn").and_then(|v| v.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn claims_with(sub: &str, username: Option<&str>) -> Claims {
        Claims {
            sub: sub.to_string(),
            exp: 1_234_567_890,
            iat: Some(1_234_567_800),
            iss: Some("https://login.example.com/tenant/v2.0".to_string()),
            aud: Some(Audience::Single("api-client-id".to_string())),
            preferred_username: username.map(ToString::to_string),
            name: Some("Test User".to_string()),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_audience_single_contains() {
        let aud = Audience::Single("api-client-id".to_string());
        assert!(aud.contains("api-client-id"));
        assert!(!aud.contains("other-client"));
    }

    #[test]
    fn test_audience_multiple_contains() {
        let aud = Audience::Multiple(vec![
            "first-client".to_string(),
            "api-client-id".to_string(),
        ]);
        assert!(aud.contains("api-client-id"));
        assert!(aud.contains("first-client"));
        assert!(!aud.contains("third-client"));
    }

    #[test]
    fn test_audience_deserializes_from_string_and_array() {
        let single: Audience = serde_json::from_str(r#""api-client-id""#).unwrap();
        assert_eq!(single, Audience::Single("api-client-id".to_string()));

        let multiple: Audience = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(
            multiple,
            Audience::Multiple(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_claims_debug_redacts_identity() {
        let claims = claims_with("secret-user-id", Some("secret@example.com"));

        let debug_str = format!("{:?}", claims);

        assert!(
            !debug_str.contains("secret-user-id"),
            "Debug output should not contain actual sub value"
        );
        assert!(
            !debug_str.contains("secret@example.com"),
            "Debug output should not contain the username"
        );
        assert!(
            debug_str.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
    }

    #[test]
    fn test_username_prefers_preferred_username() {
        let claims = claims_with("user", Some("alice@example.com"));
        assert_eq!(claims.username(), Some("alice@example.com"));
    }

    #[test]
    fn test_username_falls_back_to_upn() {
        let mut claims = claims_with("user", None);
        claims.extra.insert(
            "upn".to_string(),
            serde_json::Value::String("bob@example.com".to_string()),
        );
        assert_eq!(claims.username(), Some("bob@example.com"));
    }

    #[test]
    fn test_username_absent() {
        let claims = claims_with("user", None);
        assert!(claims.username().is_none());
    }

    #[test]
    fn test_claims_deserialization_collects_extra() {
        let json = r#"{
            "sub": "user123",
            "exp": 1234567890,
            "iat": 1234567800,
            "iss": "https://login.example.com/tenant/v2.0",
            "aud": "api-client-id",
            "preferred_username": "alice@example.com",
            "name": "Alice",
            "tid": "tenant-id",
            "roles": ["reader"]
        }"#;

        let claims: Claims = serde_json::from_str(json).unwrap();

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.exp, 1234567890);
        assert_eq!(
            claims.aud,
            Some(Audience::Single("api-client-id".to_string()))
        );
        assert_eq!(claims.extra.get("tid").and_then(|v| v.as_str()), Some("tenant-id"));
        assert!(claims.extra.contains_key("roles"));
    }

    #[test]
    fn test_claims_missing_exp_rejected() {
        let json = r#"{"sub": "user123", "iss": "x", "aud": "y"}"#;
        let result: Result<Claims, _> = serde_json::from_str(json);
        assert!(result.is_err(), "exp is required");
    }
}
