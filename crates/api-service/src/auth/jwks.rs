//! JWKS fetching and caching for the identity provider's signing keys.
//!
//! Two components live here:
//!
//! - [`JwksFetcher`] performs a single bounded HTTP GET against the
//!   provider's JWKS endpoint and parses the document. No retries.
//! - [`JwksCache`] memoizes the fetched key set with a TTL, refreshes it
//!   once when a token references a key ID the cached set does not contain
//!   (the key-rotation signal), and coalesces concurrent refreshes so a
//!   cold or stale cache produces exactly one network fetch.
//!
//! # Security
//!
//! - Keys are cached to keep verification off the network per request
//! - A key-ID miss triggers one forced refetch so freshly rotated issuer
//!   keys are picked up without waiting for TTL expiry
//! - The cached set is swapped atomically; readers always observe a
//!   complete pre- or post-refresh set

use crate::errors::ApiError;
use crate::observability::metrics::record_jwks_fetch;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for the keys this service accepts).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Algorithm hint (e.g. "RS256").
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,
}

/// JWKS document as published by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksDocument {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

/// A signing key ready for verification.
#[derive(Clone)]
pub struct SigningKey {
    /// Key ID this key was published under.
    pub kid: String,

    /// Prepared verification key.
    pub decoding_key: DecodingKey,
}

/// Fetches the JWKS document from the identity provider.
///
/// One outbound network call per invocation, bounded by the configured
/// timeout. Retry policy belongs to the caller.
pub struct JwksFetcher {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client with the fetch timeout applied.
    http_client: reqwest::Client,
}

impl JwksFetcher {
    /// Create a new fetcher for the given JWKS endpoint.
    pub fn new(jwks_url: String, fetch_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "api.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
        }
    }

    /// Fetch and parse the JWKS document.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::KeyFetch` on network failure (including timeout),
    /// a non-2xx response, or a malformed document.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<JwksDocument, ApiError> {
        tracing::debug!(target: "api.auth.jwks", url = %self.jwks_url, "Fetching JWKS from identity provider");

        let started = Instant::now();
        let result = self.fetch_inner().await;

        let outcome = if result.is_ok() { "success" } else { "error" };
        record_jwks_fetch(outcome, started.elapsed());

        result
    }

    async fn fetch_inner(&self) -> Result<JwksDocument, ApiError> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| ApiError::KeyFetch(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ApiError::KeyFetch(format!(
                "JWKS endpoint returned status {}",
                response.status()
            )));
        }

        let document: JwksDocument = response
            .json()
            .await
            .map_err(|e| ApiError::KeyFetch(format!("malformed JWKS document: {e}")))?;

        Ok(document)
    }
}

/// Cached key set with its fetch timestamp.
struct CachedJwks {
    /// Map of key ID to prepared signing key.
    keys: HashMap<String, SigningKey>,

    /// When this set was fetched; drives TTL expiry and refresh coalescing.
    fetched_at: Instant,
}

/// Caching layer over [`JwksFetcher`].
///
/// Shared by all concurrent verifications. Refreshes are serialized through
/// an async mutex; callers that queued behind an in-flight refresh consume
/// its result instead of fetching again.
pub struct JwksCache {
    fetcher: JwksFetcher,

    /// Current key set snapshot, swapped whole on refresh.
    cache: RwLock<Option<Arc<CachedJwks>>>,

    /// Serializes refreshes; the coalescing point for concurrent misses.
    refresh_lock: Mutex<()>,

    /// How long a fetched set stays fresh.
    cache_ttl: Duration,
}

impl JwksCache {
    /// Create a new cache over the given fetcher.
    pub fn new(fetcher: JwksFetcher, cache_ttl: Duration) -> Self {
        Self {
            fetcher,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            cache_ttl,
        }
    }

    /// Get the signing key for a key ID.
    ///
    /// Serves from the cached set when it is fresh and contains the key.
    /// Otherwise performs exactly one (coalesced) refetch before deciding:
    /// a key ID that is still absent from a freshly fetched set is unknown.
    ///
    /// # Errors
    ///
    /// - `ApiError::KeyFetch` if the key set had to be fetched and the
    ///   fetch failed
    /// - `ApiError::UnknownKey` if no published key matches after refresh
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<SigningKey, ApiError> {
        // Fast path: fresh cache with a matching key.
        let seen = {
            let cache = self.cache.read().await;
            match cache.as_ref() {
                Some(cached) => {
                    if cached.fetched_at.elapsed() < self.cache_ttl {
                        if let Some(key) = cached.keys.get(kid) {
                            tracing::debug!(target: "api.auth.jwks", kid = %kid, "JWKS cache hit");
                            return Ok(key.clone());
                        }
                        // Fresh set without this kid: likely key rotation
                        // on the issuer side. Fall through to the forced
                        // refetch.
                        tracing::debug!(target: "api.auth.jwks", kid = %kid, "Key not in cached JWKS, forcing refetch");
                    }
                    Some(cached.fetched_at)
                }
                None => None,
            }
        };

        self.refresh(seen).await?;

        let cache = self.cache.read().await;
        if let Some(cached) = cache.as_ref() {
            if let Some(key) = cached.keys.get(kid) {
                return Ok(key.clone());
            }
        }

        // Key not found even after refresh
        tracing::warn!(target: "api.auth.jwks", kid = %kid, "Key not found in JWKS after refresh");
        Err(ApiError::UnknownKey(kid.to_string()))
    }

    /// Refresh the cached key set, coalescing concurrent callers.
    ///
    /// `seen` is the fetch timestamp the caller observed before deciding to
    /// refresh. If the cache has been replaced by the time the refresh lock
    /// is acquired, another caller already fetched and this call returns
    /// without touching the network.
    async fn refresh(&self, seen: Option<Instant>) -> Result<(), ApiError> {
        let _guard = self.refresh_lock.lock().await;

        {
            let cache = self.cache.read().await;
            if cache.as_ref().map(|cached| cached.fetched_at) != seen {
                tracing::debug!(target: "api.auth.jwks", "JWKS already refreshed by concurrent caller");
                return Ok(());
            }
        }

        let document = self.fetcher.fetch().await?;
        let keys = build_key_map(document);

        tracing::info!(
            target: "api.auth.jwks",
            key_count = keys.len(),
            "JWKS cache refreshed"
        );

        let mut cache = self.cache.write().await;
        *cache = Some(Arc::new(CachedJwks {
            keys,
            fetched_at: Instant::now(),
        }));

        Ok(())
    }
}

/// Convert a JWKS document into a kid-indexed map of prepared keys.
///
/// Entries that are not usable RSA verification keys are skipped with a
/// warning rather than failing the whole set.
fn build_key_map(document: JwksDocument) -> HashMap<String, SigningKey> {
    let mut keys = HashMap::new();

    for jwk in document.keys {
        if jwk.kty != "RSA" {
            tracing::warn!(target: "api.auth.jwks", kid = %jwk.kid, kty = %jwk.kty, "Skipping non-RSA JWK");
            continue;
        }

        let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
            tracing::warn!(target: "api.auth.jwks", kid = %jwk.kid, "Skipping RSA JWK without modulus/exponent");
            continue;
        };

        match DecodingKey::from_rsa_components(n, e) {
            Ok(decoding_key) => {
                keys.insert(
                    jwk.kid.clone(),
                    SigningKey {
                        kid: jwk.kid,
                        decoding_key,
                    },
                );
            }
            Err(e) => {
                tracing::warn!(target: "api.auth.jwks", kid = %jwk.kid, error = %e, "Skipping JWK with invalid key material");
            }
        }
    }

    keys
}
