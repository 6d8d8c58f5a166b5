//! Token verification pipeline.
//!
//! Validates incoming bearer tokens using public keys fetched from the
//! identity provider's JWKS endpoint.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - The algorithm allow-list is a hard gate on the unverified header,
//!   enforced before any key resolution: a token claiming "none" or a
//!   symmetric algorithm never reaches signature verification
//! - Claims are validated only after the signature has been verified, in a
//!   fixed order: expiry, audience, issuer
//! - A failed verification is terminal; nothing here retries

use crate::auth::claims::Claims;
use crate::auth::jwks::{JwksCache, SigningKey};
use crate::errors::ApiError;
use common::jwt::{decode_header_unverified, validate_exp, validate_iat};
use jsonwebtoken::{decode, Algorithm, Validation};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Verifies bearer tokens against the configured identity provider.
pub struct TokenVerifier {
    /// Cache of the provider's signing keys.
    jwks_cache: Arc<JwksCache>,

    /// Expected `iss` claim value (exact match).
    issuer: String,

    /// Audience that must be present in the `aud` claim.
    audience: String,

    /// The single allow-listed signature algorithm.
    allowed_algorithm: Algorithm,

    /// Clock skew tolerance for `exp`/`iat` validation.
    clock_skew: Duration,
}

impl TokenVerifier {
    /// Create a new verifier.
    pub fn new(
        jwks_cache: Arc<JwksCache>,
        issuer: String,
        audience: String,
        allowed_algorithm: Algorithm,
        clock_skew: Duration,
    ) -> Self {
        Self {
            jwks_cache,
            issuer,
            audience,
            allowed_algorithm,
            clock_skew,
        }
    }

    /// Verify a raw bearer token and return its claims.
    ///
    /// Pipeline, failing fast at each step:
    /// 1. Decode the unverified header (size cap, structure)
    /// 2. Algorithm allow-list gate
    /// 3. Resolve the signing key by key ID via the JWKS cache
    /// 4. Verify the signature
    /// 5. Validate claims: expiry, audience, issuer, issued-at
    ///
    /// # Errors
    ///
    /// Returns the `ApiError` kind matching the first failed step; see the
    /// error taxonomy in [`crate::errors`].
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let header = decode_header_unverified(token)?;

        // Hard gate: the header's algorithm must parse to, and equal, the
        // single allow-listed algorithm. "none" and symmetric algorithms
        // fail here no matter what the rest of the token looks like.
        let alg = Algorithm::from_str(&header.alg)
            .map_err(|_| ApiError::UnsupportedAlgorithm(header.alg.clone()))?;
        if alg != self.allowed_algorithm {
            return Err(ApiError::UnsupportedAlgorithm(header.alg));
        }

        let kid = header.kid.ok_or_else(|| {
            tracing::debug!(target: "api.auth", "Token rejected: no key ID in header");
            ApiError::MalformedToken
        })?;

        let key = self.jwks_cache.get_key(&kid).await?;

        let claims = verify_signature(token, &key, self.allowed_algorithm)?;

        self.validate_claims(&claims)?;

        tracing::debug!(target: "api.auth", "Token validated successfully");
        Ok(claims)
    }

    /// Validate the claim set of a signature-verified token.
    ///
    /// Order is fixed: expiry, audience, issuer, then issued-at. An absent
    /// audience or issuer claim fails the corresponding check.
    fn validate_claims(&self, claims: &Claims) -> Result<(), ApiError> {
        validate_exp(claims.exp, self.clock_skew)?;

        match &claims.aud {
            Some(aud) if aud.contains(&self.audience) => {}
            _ => return Err(ApiError::InvalidAudience),
        }

        if claims.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err(ApiError::InvalidIssuer);
        }

        if let Some(iat) = claims.iat {
            validate_iat(iat, self.clock_skew)?;
        }

        Ok(())
    }
}

/// Verify the token signature against the resolved key and decode the
/// payload claims.
///
/// Claim validation is deliberately disabled here; it happens afterwards in
/// a defined order so each failure maps to its own error kind.
fn verify_signature(
    token: &str,
    key: &SigningKey,
    algorithm: Algorithm,
) -> Result<Claims, ApiError> {
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = std::collections::HashSet::new();

    let token_data = decode::<Claims>(token, &key.decoding_key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature
            | jsonwebtoken::errors::ErrorKind::Crypto(_) => ApiError::InvalidSignature,
            _ => {
                tracing::debug!(target: "api.auth", error = %e, "Token payload rejected");
                ApiError::MalformedToken
            }
        }
    })?;

    Ok(token_data.claims)
}
