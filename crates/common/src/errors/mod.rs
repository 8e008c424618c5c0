//! Error types for Shelfmark services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned whenever the owner-or-staff check denies a mutation
pub const PERMISSION_DENIED_MESSAGE: &str =
    "You do not have permission to perform this action.";

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidChoice,

    // Authentication errors (2xxx)
    Unauthorized,
    InvalidCredentials,
    ExpiredToken,
    InvalidToken,

    // Authorization errors (3xxx)
    PermissionDenied,

    // Resource errors (4xxx)
    NotFound,
    BookNotFound,

    // Conflict errors (5xxx)
    Conflict,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidChoice => 1002,

            // Auth (2xxx)
            ErrorCode::Unauthorized => 2001,
            ErrorCode::InvalidCredentials => 2002,
            ErrorCode::ExpiredToken => 2003,
            ErrorCode::InvalidToken => 2004,

            // Authz (3xxx)
            ErrorCode::PermissionDenied => 3001,

            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::BookNotFound => 4002,

            // Conflicts (5xxx)
            ErrorCode::Conflict => 5001,

            // Database (7xxx)
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("\"{value}\" is not a valid choice.")]
    InvalidChoice { field: String, value: String },

    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid token")]
    InvalidToken,

    // Authorization errors
    #[error("{message}")]
    PermissionDenied { message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Book not found: {id}")]
    BookNotFound { id: i64 },

    // Conflict errors
    #[error("Duplicate resource: {message}")]
    Duplicate { message: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Validation failure keyed to a specific request field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// The fixed owner-or-staff denial
    pub fn permission_denied() -> Self {
        AppError::PermissionDenied {
            message: PERMISSION_DENIED_MESSAGE.to_string(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidChoice { .. } => ErrorCode::InvalidChoice,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::InvalidToken => ErrorCode::InvalidToken,
            AppError::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::BookNotFound { .. } => ErrorCode::BookNotFound,
            AppError::Duplicate { .. } => ErrorCode::Conflict,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } | AppError::InvalidChoice { .. } => {
                StatusCode::BAD_REQUEST
            }

            // 401 Unauthorized
            AppError::Unauthorized { .. }
            | AppError::InvalidCredentials
            | AppError::ExpiredToken
            | AppError::InvalidToken => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            AppError::PermissionDenied { .. } => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::NotFound { .. } | AppError::BookNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Duplicate { .. } => StatusCode::CONFLICT,

            // 500 Internal Server Error
            AppError::Database(_)
            | AppError::DatabaseConnection { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Field-keyed message map for validation failures, e.g.
    /// `{"rate": ["\"8\" is not a valid choice."]}`
    pub fn field_errors(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation {
                message,
                field: Some(field),
            } => Some(serde_json::json!({ field: [message] })),
            AppError::InvalidChoice { field, .. } => {
                Some(serde_json::json!({ field: [self.to_string()] }))
            }
            _ => None,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let details = self.field_errors();
        let message = self.to_string();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details,
                request_id: None, // Filled by middleware when propagated
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::BookNotFound { id: 17 };
        assert_eq!(err.code(), ErrorCode::BookNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_choice_message() {
        let err = AppError::InvalidChoice {
            field: "rate".into(),
            value: "8".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "\"8\" is not a valid choice.");
        assert_eq!(
            err.field_errors(),
            Some(serde_json::json!({"rate": ["\"8\" is not a valid choice."]}))
        );
    }

    #[test]
    fn test_permission_denied_fixed_message() {
        let err = AppError::permission_denied();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.to_string(),
            "You do not have permission to perform this action."
        );
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_error() {
        let err = AppError::Internal {
            message: "Something went wrong".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());
    }
}
