//! API service configuration.
//!
//! Configuration is loaded from environment variables, validated once at
//! startup, and immutable thereafter.

use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use jsonwebtoken::Algorithm;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default allow-listed token signature algorithm.
pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::RS256;

/// Default JWKS cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Default API instance ID prefix.
pub const DEFAULT_API_ID_PREFIX: &str = "api";

/// API service configuration.
///
/// Loaded from environment variables. The issuer, audience, and JWKS URL
/// have no defaults — they identify the trusted identity provider and must
/// be supplied explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Expected `iss` claim value (exact match).
    pub oidc_issuer: String,

    /// Expected `aud` claim value.
    pub oidc_audience: String,

    /// URL of the identity provider's JWKS endpoint.
    pub oidc_jwks_url: String,

    /// The single allow-listed signature algorithm. Tokens claiming any
    /// other algorithm are rejected before key resolution.
    pub allowed_algorithm: Algorithm,

    /// Clock skew tolerance in seconds for `exp`/`iat` validation
    /// (default: 0).
    pub jwt_clock_skew_seconds: u64,

    /// JWKS cache TTL in seconds (default: 300).
    pub jwks_cache_ttl_seconds: u64,

    /// JWKS fetch timeout in seconds (default: 10).
    pub jwks_fetch_timeout_seconds: u64,

    /// Unique identifier for this service instance.
    /// Used for log correlation and debugging.
    pub api_id: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid signature algorithm configuration: {0}")]
    InvalidAlgorithm(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidClockSkew(String),

    #[error("Invalid JWKS cache TTL configuration: {0}")]
    InvalidCacheTtl(String),

    #[error("Invalid JWKS fetch timeout configuration: {0}")]
    InvalidFetchTimeout(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is absent or a value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is absent or a value
    /// fails validation.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let oidc_issuer = require(vars, "OIDC_ISSUER")?;
        let oidc_audience = require(vars, "OIDC_AUDIENCE")?;
        let oidc_jwks_url = require(vars, "OIDC_JWKS_URL")?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        // Parse and validate the allow-listed algorithm. Symmetric
        // algorithms are refused outright: accepting one where an
        // asymmetric algorithm is expected is a known forgery vector
        // (the issuer's public key doubles as the HMAC secret).
        let allowed_algorithm = if let Some(value) = vars.get("OIDC_ALGORITHM") {
            let alg = Algorithm::from_str(value).map_err(|_| {
                ConfigError::InvalidAlgorithm(format!(
                    "OIDC_ALGORITHM is not a recognized algorithm: '{value}'"
                ))
            })?;

            if matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
                return Err(ConfigError::InvalidAlgorithm(format!(
                    "OIDC_ALGORITHM must be asymmetric, got symmetric '{value}'"
                )));
            }

            alg
        } else {
            DEFAULT_ALGORITHM
        };

        // Parse clock skew with validation. Zero is valid (and the
        // default): no tolerance beyond the token's own expiry.
        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a non-negative integer, got '{value_str}': {e}"
                ))
            })?;

            if value > MAX_CLOCK_SKEW.as_secs() {
                return Err(ConfigError::InvalidClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW.as_secs()
        };

        // Parse JWKS cache TTL with validation
        let jwks_cache_ttl_seconds = if let Some(value_str) = vars.get("JWKS_CACHE_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCacheTtl(format!(
                    "JWKS_CACHE_TTL_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidCacheTtl(
                    "JWKS_CACHE_TTL_SECONDS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_JWKS_CACHE_TTL_SECONDS
        };

        // Parse JWKS fetch timeout with validation
        let jwks_fetch_timeout_seconds =
            if let Some(value_str) = vars.get("JWKS_FETCH_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidFetchTimeout(format!(
                    "JWKS_FETCH_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidFetchTimeout(
                        "JWKS_FETCH_TIMEOUT_SECONDS must be greater than 0".to_string(),
                    ));
                }

                value
            } else {
                DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS
            };

        // Generate instance ID
        let api_id = vars.get("API_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_API_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            bind_address,
            oidc_issuer,
            oidc_audience,
            oidc_jwks_url,
            allowed_algorithm,
            jwt_clock_skew_seconds,
            jwks_cache_ttl_seconds,
            jwks_fetch_timeout_seconds,
            api_id,
        })
    }
}

fn require(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}
