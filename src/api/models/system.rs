use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    /// Unix timestamp of the check
    pub timestamp: i64,
    pub database: DatabaseHealth,
}

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Unhealthy,
}

/// Database probe result with pool statistics
#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub pool_size: u32,
    pub idle_connections: u32,
}
