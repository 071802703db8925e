//! Error type system for the sweet shop backend
//!
//! This module provides a single error type with:
//! - Domain error classification (not found, conflict, out of stock, ...)
//! - HTTP status code mapping
//! - JSON error bodies carrying a trace ID

use crate::api::middleware::current_trace_id;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Main error type for the sweet shop backend
#[derive(Debug, thiserror::Error)]
pub enum ShopError {
    // System-level errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Task error: {0}")]
    TaskError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // Request errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Inventory errors
    #[error("Out of stock: {0}")]
    OutOfStock(String),
}

impl ShopError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            ShopError::ValidationError(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            ShopError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            ShopError::PermissionDenied(_) => StatusCode::FORBIDDEN,

            // 404 Not Found
            ShopError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            ShopError::Conflict(_) | ShopError::OutOfStock(_) => StatusCode::CONFLICT,

            // 500 Internal Server Error
            ShopError::DatabaseError(_)
            | ShopError::PoolError(_)
            | ShopError::TaskError(_)
            | ShopError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ShopError::DatabaseError(_) => "DatabaseError",
            ShopError::PoolError(_) => "PoolError",
            ShopError::TaskError(_) => "TaskError",
            ShopError::IoError(_) => "IoError",
            ShopError::ValidationError(_) => "ValidationError",
            ShopError::AuthenticationError(_) => "UnauthorizedError",
            ShopError::PermissionDenied(_) => "ForbiddenError",
            ShopError::NotFound(_) => "NotFoundError",
            ShopError::Conflict(_) => "ConflictError",
            ShopError::OutOfStock(_) => "OutOfStockError",
        }
    }

    /// True for errors caused by the caller rather than the server
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response
    ///
    /// Inside a request the trace ID is the request's own; elsewhere a fresh
    /// one is generated.
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            trace_id: current_trace_id().unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }

    /// Create an error response from a ShopError
    pub fn from_error(error: &ShopError) -> Self {
        Self::new(error.error_type().to_string(), error.to_string())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (trace_id: {})", self.error, self.message, self.trace_id)
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if self.is_client_error() {
            tracing::warn!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        } else {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with ShopError
pub type Result<T> = std::result::Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ShopError::ValidationError("name".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ShopError::AuthenticationError("test".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ShopError::PermissionDenied("test".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ShopError::NotFound("sweet 1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ShopError::Conflict("alice".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ShopError::OutOfStock("sweet 1".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ShopError::DatabaseError(rusqlite::Error::InvalidQuery).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_types() {
        assert_eq!(ShopError::OutOfStock("x".into()).error_type(), "OutOfStockError");
        assert_eq!(ShopError::Conflict("x".into()).error_type(), "ConflictError");
        assert_eq!(
            ShopError::AuthenticationError("x".into()).error_type(),
            "UnauthorizedError"
        );
        assert_eq!(
            ShopError::PermissionDenied("x".into()).error_type(),
            "ForbiddenError"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(ShopError::NotFound("x".into()).is_client_error());
        assert!(ShopError::OutOfStock("x".into()).is_client_error());
        assert!(!ShopError::TaskError("x".into()).is_client_error());
        assert!(!ShopError::DatabaseError(rusqlite::Error::InvalidQuery).is_client_error());
    }

    #[test]
    fn test_error_response_creation() {
        let error = ShopError::NotFound("Sweet 42 not found".into());
        let response = ErrorResponse::from_error(&error);

        assert_eq!(response.error, "NotFoundError");
        assert!(response.message.contains("Sweet 42"));
        assert!(Uuid::parse_str(&response.trace_id).is_ok());
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = ShopError::OutOfStock("Ladoo".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.error, "OutOfStockError");
        assert!(parsed.message.contains("Ladoo"));
    }
}
