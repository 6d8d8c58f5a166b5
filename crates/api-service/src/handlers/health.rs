//! Health check handler.
//!
//! Liveness probe for orchestrators and load balancers. Bypasses
//! authentication entirely and checks no dependencies: a failure means the
//! process itself is hung, and the JWKS endpoint being down must not take
//! the probe down with it.

use crate::models::HealthResponse;
use axum::Json;

/// Handler for GET /health
///
/// Returns a fixed liveness payload.
///
/// ## Example Response
///
/// ```json
/// {
///   "status": "healthy"
/// }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
