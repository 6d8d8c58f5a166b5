//! Bearer-token authentication.
//!
//! # Components
//!
//! - `claims` - Verified claim set and audience handling
//! - `jwks` - Signing-key fetching and caching
//! - `verifier` - The token verification pipeline

pub mod claims;
pub mod jwks;
pub mod verifier;

pub use claims::{Audience, Claims};
pub use jwks::{JwksCache, JwksFetcher};
pub use verifier::TokenVerifier;
