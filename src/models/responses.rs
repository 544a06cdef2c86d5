//! Response DTOs for the order API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the health endpoint (GET /healthz)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status, always "ok" while the server is serving
    pub status: String,
    /// Number of orders currently cached
    pub cache_size: usize,
    /// Cache hits since startup
    pub cache_hits: u64,
    /// Cache misses since startup
    pub cache_misses: u64,
    /// Crate version
    pub version: String,
    /// Request id echoed back to the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl HealthResponse {
    /// Creates a new HealthResponse from cache statistics
    pub fn ok(stats: &CacheStats, version: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            status: "ok".to_string(),
            cache_size: stats.total_entries,
            cache_hits: stats.hits,
            cache_misses: stats.misses,
            version: version.into(),
            request_id,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "not_found")
    pub error: String,
    /// Human-readable description
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Request id of the failed request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(
        error: impl Into<String>,
        message: impl Into<String>,
        request_id: Option<String>,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            request_id,
        }
    }
}
