//! HTTP routes for the API service.
//!
//! Defines the Axum router and application state.

use crate::auth::{JwksCache, JwksFetcher, TokenVerifier};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_auth, AuthState};
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe - public, bypasses authentication
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/api/v1/me` - Current caller endpoint - requires authentication
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    // Wire the token verification pipeline from configuration
    let fetcher = JwksFetcher::new(
        state.config.oidc_jwks_url.clone(),
        Duration::from_secs(state.config.jwks_fetch_timeout_seconds),
    );
    let jwks_cache = Arc::new(JwksCache::new(
        fetcher,
        Duration::from_secs(state.config.jwks_cache_ttl_seconds),
    ));
    let verifier = Arc::new(TokenVerifier::new(
        jwks_cache,
        state.config.oidc_issuer.clone(),
        state.config.oidc_audience.clone(),
        state.config.allowed_algorithm,
        Duration::from_secs(state.config.jwt_clock_skew_seconds),
    ));
    let auth_state = Arc::new(AuthState { verifier });

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/api/v1/me", get(handlers::get_me))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
