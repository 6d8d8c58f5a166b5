//! Current user handler.
//!
//! Returns information about the authenticated caller from the verified
//! token claims.

use crate::auth::Claims;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Response for the `/api/v1/me` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// Subject (user or client ID).
    pub sub: String,

    /// Provider username (`preferred_username`, or `upn` as fallback).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Token expiration timestamp.
    pub exp: i64,

    /// Token issued-at timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Handler for GET /api/v1/me
///
/// Returns the authenticated caller's claims. Requires valid
/// authentication via the auth middleware.
///
/// ## Response
///
/// ```json
/// {
///   "sub": "user-abc123",
///   "username": "alice@example.com",
///   "name": "Alice Example",
///   "exp": 1234567890,
///   "iat": 1234567800
/// }
/// ```
#[instrument(skip_all, name = "api.handlers.me")]
pub async fn get_me(Extension(claims): Extension<Claims>) -> Json<MeResponse> {
    tracing::debug!(target: "api.handlers.me", "Returning caller claims");

    let username = claims.username().map(ToString::to_string);

    Json(MeResponse {
        sub: claims.sub,
        username,
        name: claims.name,
        exp: claims.exp,
        iat: claims.iat,
    })
}
