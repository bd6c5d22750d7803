//! API error type and its JSON rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::task::{FieldError, TaskError, ValidationError};

/// Error body returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code: `INVALID_INPUT`, `NOT_FOUND` or `INTERNAL_ERROR`.
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug)]
pub enum ApiError {
    /// Malformed or out-of-range request data (400).
    InvalidInput(Vec<FieldError>),
    /// Referenced task does not exist (404).
    NotFound(String),
    /// Storage or other unexpected failure (500). The message is logged,
    /// never returned.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::InvalidInput(vec![FieldError::new(field, message)])
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::InvalidInput(err.errors)
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound(_) => ApiError::NotFound(err.to_string()),
            TaskError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::InvalidInput(details) => ErrorBody {
                code: "INVALID_INPUT".to_string(),
                message: "Validation failed".to_string(),
                details: Some(details),
            },
            ApiError::NotFound(message) => ErrorBody {
                code: "NOT_FOUND".to_string(),
                message,
                details: None,
            },
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal error while handling request");
                ErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal error occurred".to_string(),
                    details: None,
                }
            }
        };
        (status, Json(body)).into_response()
    }
}
