//! `/api/health` endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"OK"` when the server is running.
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

pub fn health_check() -> HealthResponse {
    HealthResponse {
        status: "OK",
        message: "Server is running",
        timestamp: Utc::now(),
    }
}
