// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::{GateRejection, HashingError, ValidationError};
use crate::storage::StoreError;
use crate::validation::InputError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// Request turned away by the access gate
    #[error("Authentication error: {0}")]
    Gate(#[from] GateRejection),

    /// Unknown user or wrong password, deliberately indistinguishable
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Token refresh failed: {0}")]
    Refresh(ValidationError),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] HashingError),

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Request body that is not the expected JSON document
    #[error("JSON error: {0}")]
    Json(#[from] JsonRejection),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(name) => AppError::DuplicateUsername(name),
            other => AppError::Storage(other),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Background task failed: {err}"))
    }
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Gate(_) | AppError::InvalidCredentials | AppError::Refresh(_) => {
                StatusCode::UNAUTHORIZED
            },
            AppError::DuplicateUsername(_) => StatusCode::CONFLICT,
            AppError::InvalidInput(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Hashing(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Gate(GateRejection::MissingCredential) => "AUTH_001",
            AppError::Gate(GateRejection::MalformedCredential) => "AUTH_002",
            AppError::Gate(GateRejection::InvalidCredential(_)) => "AUTH_003",
            AppError::InvalidCredentials => "AUTH_004",
            AppError::Refresh(_) => "AUTH_005",
            AppError::DuplicateUsername(_) => "USER_001",
            AppError::NotFound(_) => "NF_001",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Json(_) => "JSON_001",
            AppError::Hashing(_) => "INT_002",
            AppError::Storage(_) => "INT_003",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Gate(rejection) => rejection.to_string(),
            AppError::InvalidCredentials => "Invalid username or password".to_string(),
            AppError::Refresh(_) => "Token refresh failed".to_string(),
            AppError::DuplicateUsername(_) => "Username already exists".to_string(),
            AppError::InvalidInput(e) => e.to_string(),
            AppError::Json(_) => "Invalid request format".to_string(),
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::Hashing(_) | AppError::Storage(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "request failed");
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
