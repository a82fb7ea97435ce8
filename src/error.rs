use serde_json::json;
use std::fmt::Display;

use anyhow::Error as anyhowError;
use axum::{http::StatusCode, response::IntoResponse};

#[derive(Debug)]
pub enum AppError {
    // 400 malformed input: bad enum values, missing fields, reminder times in the past
    Validation(anyhowError),
    // 401 missing/expired bearer token
    Unauthorized(anyhowError),
    // 404 unknown (or not owned) event, contact, invitation or reminder
    NotFound(anyhowError),
    // 409 mutation of a reminder that already reached a terminal status
    InvalidState(anyhowError),
    // 500 internal server error
    InternalServerError(anyhowError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "Validation: {}", e),
            AppError::Unauthorized(e) => write!(f, "Unauthorized: {}", e),
            AppError::NotFound(e) => write!(f, "NotFound: {}", e),
            AppError::InvalidState(e) => write!(f, "InvalidState: {}", e),
            AppError::InternalServerError(e) => write!(f, "InternalServerError: {}", e),
        }
    }
}

impl From<anyhowError> for AppError {
    fn from(e: anyhowError) -> Self {
        AppError::InternalServerError(e)
    }
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::InvalidState(_) => "invalid_state",
            Self::InternalServerError(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match &self {
            Self::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            Self::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::InvalidState(err) => (StatusCode::CONFLICT, err.to_string()),
            Self::InternalServerError(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        // The kind is stable so the frontend can branch on it; the message is
        // only detailed in debug builds.
        #[cfg(debug_assertions)]
        let error_response = json!({
            "error": {
                "kind": self.kind(),
                "message": error_message,
            }
        });

        #[cfg(not(debug_assertions))]
        let error_response = json!({
            "error": {
                "kind": self.kind(),
                "message": status.canonical_reason().unwrap_or("An error occurred"),
            }
        });
        (status, axum::Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
