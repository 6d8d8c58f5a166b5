//! Authentication middleware for protected routes.
//!
//! Extracts the Bearer token from the Authorization header, verifies it
//! through the token verifier, and injects the claims into request
//! extensions. Every rejection is counted by error kind before the 401 is
//! produced.

use crate::auth::TokenVerifier;
use crate::errors::ApiError;
use crate::observability::metrics::record_auth_rejection;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Token verifier with its JWKS cache.
    pub verifier: Arc<TokenVerifier>,
}

/// Authentication middleware guarding protected routes.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - Returns 401 Unauthorized with a WWW-Authenticate header and a
///   per-kind error code if the credential is missing or invalid
/// - Continues to the next handler with [`crate::auth::Claims`] in
///   extensions if the token is valid
#[instrument(skip_all, name = "api.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    match authenticate(&state, &mut req).await {
        Ok(()) => Ok(next.run(req).await),
        Err(err) => {
            record_auth_rejection(err.code());
            Err(err)
        }
    }
}

/// Extract and verify the bearer credential, storing the claims in the
/// request extensions on success.
async fn authenticate(state: &AuthState, req: &mut Request) -> Result<(), ApiError> {
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "api.middleware.auth", "Missing Authorization header");
            ApiError::MissingCredential("Missing Authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!(target: "api.middleware.auth", "Authorization header is not a Bearer credential");
        ApiError::MissingCredential("Authorization header is not a Bearer credential".to_string())
    })?;

    let claims = state.verifier.verify(token).await?;

    // Store claims in request extensions for downstream handlers
    req.extensions_mut().insert(claims);

    Ok(())
}
