//! JWT utilities shared across Perimeter services.
//!
//! This module provides the pieces of token handling that must happen
//! before (or independently of) signature verification:
//! - Size limits for DoS prevention
//! - Unverified header decoding (algorithm + key ID extraction)
//! - Deterministic `exp`/`iat` validation with clock-skew tolerance
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Header fields are never trusted as a verification result; they only
//!   select a candidate key and feed the algorithm allow-list gate
//! - Generic error messages prevent information leakage

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Maximum allowed JWT size in bytes (8KB).
///
/// Typical JWTs are 200-1500 bytes. Oversized tokens are rejected before
/// any base64 decoding or cryptographic work happens, bounding the resource
/// cost of a hostile request.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default clock-skew tolerance applied to `exp`/`iat` validation.
///
/// Zero: a token is rejected the instant its expiry timestamp is reached
/// unless the operator explicitly configures a tolerance.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::ZERO;

/// Maximum allowed clock-skew tolerance (10 minutes).
///
/// Prevents misconfiguration from silently extending token lifetimes.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Errors that can occur while decoding or time-validating a token.
///
/// Messages are intentionally generic; details are logged at debug level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    /// Token size exceeds `MAX_JWT_SIZE_BYTES`.
    #[error("The access token is invalid")]
    TokenTooLarge,

    /// Token is not a decodable three-segment JWT.
    #[error("The access token is invalid")]
    MalformedToken,

    /// Token `exp` claim is in the past (beyond skew tolerance).
    #[error("The access token has expired")]
    TokenExpired,

    /// Token `iat` claim is too far in the future.
    #[error("The access token is not yet valid")]
    IatTooFarInFuture,
}

/// Unverified JWT header metadata.
///
/// Extracted before signature verification solely to drive the algorithm
/// allow-list gate and key selection. Nothing in here is trusted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHeader {
    /// Algorithm identifier as claimed by the token.
    pub alg: String,

    /// Key ID for JWKS lookup, if present. Empty strings are normalized
    /// to `None`.
    #[serde(default)]
    pub kid: Option<String>,
}

/// Decode the header segment of a JWT without verifying the signature.
///
/// Checks the size cap, splits the token into its three segments, and
/// base64url/JSON-decodes the first one.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - wrong segment count, bad base64, invalid JSON, or
///   a header without a string `alg`
pub fn decode_header_unverified(token: &str) -> Result<RawHeader, JwtError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let mut segments = token.split('.');
    let header_segment = segments.next().ok_or(JwtError::MalformedToken)?;
    if segments.clone().count() != 2 {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(JwtError::MalformedToken);
    }

    let header_bytes = URL_SAFE_NO_PAD.decode(header_segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtError::MalformedToken
    })?;

    let mut header: RawHeader = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtError::MalformedToken
    })?;

    if header.alg.is_empty() {
        return Err(JwtError::MalformedToken);
    }

    // Empty kid is as useless as an absent one for key lookup.
    if header.kid.as_deref() == Some("") {
        header.kid = None;
    }

    Ok(header)
}

/// Validate the `exp` (expiry) claim with clock-skew tolerance.
///
/// A token is expired once the current time reaches `exp + skew`.
///
/// # Errors
///
/// Returns `JwtError::TokenExpired` if the token is past its expiry.
pub fn validate_exp(exp: i64, clock_skew: Duration) -> Result<(), JwtError> {
    let now = chrono::Utc::now().timestamp();
    validate_exp_at(exp, clock_skew, now)
}

/// Deterministic `exp` validation against an explicit `now` timestamp.
///
/// Prefer [`validate_exp`] in production code. This variant exists so that
/// boundary conditions can be unit-tested without wall-clock dependence.
pub(crate) fn validate_exp_at(exp: i64, clock_skew: Duration, now: i64) -> Result<(), JwtError> {
    // Safe cast: clock_skew is bounded to MAX_CLOCK_SKEW (600 seconds)
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;

    if now >= exp.saturating_add(clock_skew_secs) {
        tracing::debug!(
            target: "common.jwt",
            exp = exp,
            now = now,
            clock_skew_secs = clock_skew_secs,
            "Token rejected: past expiry"
        );
        return Err(JwtError::TokenExpired);
    }

    Ok(())
}

/// Validate the `iat` (issued-at) claim with clock-skew tolerance.
///
/// Rejects tokens with `iat` too far in the future, which could indicate
/// token pre-generation, clock desynchronization, or manipulation.
///
/// # Errors
///
/// Returns `JwtError::IatTooFarInFuture` if `iat` is more than `clock_skew`
/// in the future.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
pub(crate) fn validate_iat_at(iat: i64, clock_skew: Duration, now: i64) -> Result<(), JwtError> {
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;

    if iat > now.saturating_add(clock_skew_secs) {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            clock_skew_secs = clock_skew_secs,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtError::IatTooFarInFuture);
    }

    Ok(())
}
