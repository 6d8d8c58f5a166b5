//! API service models.
//!
//! Contains data types shared across handlers.

use serde::{Deserialize, Serialize};

/// Health check response.
///
/// Returned by the `/health` endpoint. Fixed payload: the probe asserts
/// that the process is up, nothing more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status.
    pub status: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"status":"healthy"}"#);
    }
}
