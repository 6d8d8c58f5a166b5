//! Perimeter API Service Library
//!
//! This library provides the core functionality for the Perimeter API
//! service - a stateless HTTP API protected by OIDC bearer-token
//! authentication:
//!
//! - Bearer-token verification against the identity provider's JWKS
//! - Signing-key caching with TTL, rotation-aware refresh, and fetch
//!   coalescing
//! - Claim validation (expiry, audience, issuer) with a per-kind error
//!   taxonomy
//!
//! # Architecture
//!
//! Requests flow through the auth middleware before reaching handlers:
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> auth/verifier.rs -> auth/jwks.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - JWKS client, token verifier, and claims types
//! - `config` - Service configuration from environment
//! - `errors` - Error taxonomy with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication and metrics middleware
//! - `models` - Data models
//! - `observability` - Metrics definitions
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
