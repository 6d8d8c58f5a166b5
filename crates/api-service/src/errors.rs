//! API service error types.
//!
//! Every token-verification failure has its own variant so that logging and
//! metrics can distinguish them, while the HTTP mapping stays uniform: all
//! verification-path errors become 401 Unauthorized. Client-facing messages
//! are derived from the error kind but never include key material, key IDs,
//! or transport-level detail — those are logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API service error type.
///
/// Maps to HTTP status codes:
/// - All credential/verification failures: 401 Unauthorized
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum ApiError {
    /// No Authorization header, or not in `Bearer <token>` form.
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Token is not a structurally valid JWT.
    #[error("Malformed token")]
    MalformedToken,

    /// Token header claims an algorithm outside the allow-list.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The issuer's key set could not be fetched.
    #[error("Key fetch failed: {0}")]
    KeyFetch(String),

    /// No published key matches the token's key ID, even after refresh.
    #[error("Unknown signing key: {0}")]
    UnknownKey(String),

    /// Signature verification failed against the resolved key.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Token is past its expiry (beyond the configured skew tolerance).
    #[error("Token expired")]
    ExpiredToken,

    /// Token audience does not include the configured audience.
    #[error("Invalid audience")]
    InvalidAudience,

    /// Token issuer does not match the configured issuer.
    #[error("Invalid issuer")]
    InvalidIssuer,

    /// Token issued-at is too far in the future.
    #[error("Token not yet valid")]
    NotYetValid,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Internal => 500,
            _ => 401,
        }
    }

    /// Machine-distinguishable error code, also used as the metrics label
    /// for rejection counters.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingCredential(_) => "MISSING_CREDENTIAL",
            ApiError::MalformedToken => "MALFORMED_TOKEN",
            ApiError::UnsupportedAlgorithm(_) => "UNSUPPORTED_ALGORITHM",
            ApiError::KeyFetch(_) => "KEY_FETCH_FAILED",
            ApiError::UnknownKey(_) => "UNKNOWN_KEY",
            ApiError::InvalidSignature => "INVALID_SIGNATURE",
            ApiError::ExpiredToken => "TOKEN_EXPIRED",
            ApiError::InvalidAudience => "INVALID_AUDIENCE",
            ApiError::InvalidIssuer => "INVALID_ISSUER",
            ApiError::NotYetValid => "TOKEN_NOT_YET_VALID",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MissingCredential(reason) => (StatusCode::UNAUTHORIZED, reason.clone()),
            ApiError::MalformedToken => (
                StatusCode::UNAUTHORIZED,
                "The access token is malformed".to_string(),
            ),
            ApiError::UnsupportedAlgorithm(alg) => {
                // Log the claimed algorithm server-side; a wrong algorithm
                // is a likely forgery attempt.
                tracing::warn!(target: "api.auth", alg = %alg, "Token rejected: algorithm not allow-listed");
                (
                    StatusCode::UNAUTHORIZED,
                    "The access token uses an unsupported signing algorithm".to_string(),
                )
            }
            ApiError::KeyFetch(reason) => {
                // Log actual cause server-side, return generic message
                tracing::warn!(target: "api.auth.jwks", reason = %reason, "Signing key fetch failed");
                (
                    StatusCode::UNAUTHORIZED,
                    "The access token could not be verified".to_string(),
                )
            }
            ApiError::UnknownKey(kid) => {
                tracing::warn!(target: "api.auth.jwks", kid = %kid, "No published key matches token key ID");
                (
                    StatusCode::UNAUTHORIZED,
                    "The access token signing key is not recognized".to_string(),
                )
            }
            ApiError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "The access token signature is invalid".to_string(),
            ),
            ApiError::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                "The access token has expired".to_string(),
            ),
            ApiError::InvalidAudience => (
                StatusCode::UNAUTHORIZED,
                "The access token audience is not accepted".to_string(),
            ),
            ApiError::InvalidIssuer => (
                StatusCode::UNAUTHORIZED,
                "The access token issuer is not accepted".to_string(),
            ),
            ApiError::NotYetValid => (
                StatusCode::UNAUTHORIZED,
                "The access token is not yet valid".to_string(),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                "Bearer realm=\"perimeter-api\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

impl From<common::jwt::JwtError> for ApiError {
    fn from(err: common::jwt::JwtError) -> Self {
        match err {
            common::jwt::JwtError::TokenTooLarge | common::jwt::JwtError::MalformedToken => {
                ApiError::MalformedToken
            }
            common::jwt::JwtError::TokenExpired => ApiError::ExpiredToken,
            common::jwt::JwtError::IatTooFarInFuture => ApiError::NotYetValid,
        }
    }
}
