// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Comprehensive error enum for all possible failures
/// Each variant maps to an HTTP status code plus a `retryable` hint so
/// clients know whether to offer a retry affordance
#[derive(Error, Debug)]
pub enum TrailsError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden access")]
    Forbidden,

    #[error("No photos with location data found: {0}")]
    NoLocatableContent(String),

    #[error("Malformed stored record: {0}")]
    DecodeError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Object storage error: {0}")]
    StorageError(String),

    #[error("Video generation failed: {0}")]
    VideoGeneration(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl TrailsError {
    /// Whether the failed operation is safe to re-invoke with the same
    /// arguments. Ambiguous partial mutations (e.g. a half-applied rank
    /// reassignment) must report false.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TrailsError::DatabaseError(_)
                | TrailsError::ExternalApiError(_)
                | TrailsError::StorageError(_)
                | TrailsError::VideoGeneration(_)
                | TrailsError::RateLimitExceeded
        )
    }
}

/// Convert TrailsError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for TrailsError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = match self {
            TrailsError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            TrailsError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            TrailsError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            TrailsError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            TrailsError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            TrailsError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            TrailsError::NoLocatableContent(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_LOCATABLE_CONTENT")
            }
            TrailsError::DecodeError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DECODE_ERROR"),
            TrailsError::ExternalApiError(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR"),
            TrailsError::StorageError(_) => (StatusCode::BAD_GATEWAY, "STORAGE_ERROR"),
            TrailsError::VideoGeneration(_) => (StatusCode::BAD_GATEWAY, "VIDEO_GENERATION_ERROR"),
            TrailsError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
        };

        let body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
                "retryable": self.is_retryable(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            TrailsError::NotFound(_) => StatusCode::NOT_FOUND,
            TrailsError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TrailsError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TrailsError::ValidationError(_) => StatusCode::BAD_REQUEST,
            TrailsError::Unauthorized => StatusCode::UNAUTHORIZED,
            TrailsError::Forbidden => StatusCode::FORBIDDEN,
            TrailsError::NoLocatableContent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TrailsError::DecodeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TrailsError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            TrailsError::StorageError(_) => StatusCode::BAD_GATEWAY,
            TrailsError::VideoGeneration(_) => StatusCode::BAD_GATEWAY,
            TrailsError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TrailsError::VideoGeneration("timeout".into()).is_retryable());
        assert!(TrailsError::DatabaseError("down".into()).is_retryable());
        assert!(!TrailsError::NoLocatableContent("no gps".into()).is_retryable());
        assert!(!TrailsError::Forbidden.is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            TrailsError::NoLocatableContent("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            TrailsError::VideoGeneration("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
