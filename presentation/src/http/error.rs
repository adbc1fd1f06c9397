//! API error responses
//!
//! Every error renders as `{"error": code, "message": text}` with the
//! matching status. Persistence failures also carry the computed result.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use council_application::{AccessError, DeliberateError};
use council_domain::DeliberationResult;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{message}")]
    Persistence {
        message: String,
        result: Option<Box<DeliberationResult>>,
    },

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a DeliberationResult>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) | ApiError::Persistence { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "invalid_request",
            ApiError::Unavailable(_) => "unavailable",
            ApiError::Persistence { .. } => "persistence_failed",
            ApiError::Internal(_) => "deliberation_failed",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}: {}", self.code(), self);
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
            result: match &self {
                ApiError::Persistence { result, .. } => result.as_deref(),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<DeliberateError> for ApiError {
    fn from(e: DeliberateError) -> Self {
        match e {
            DeliberateError::InvalidRequest(inner) => ApiError::BadRequest(inner.to_string()),
            DeliberateError::Persistence { source, result } => ApiError::Persistence {
                message: format!("Failed to store deliberation: {}", source),
                result,
            },
            DeliberateError::Internal(message) => ApiError::Internal(message),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::NotFound(_) => ApiError::NotFound(e.to_string()),
            AccessError::Forbidden(_) => ApiError::Forbidden(e.to_string()),
            AccessError::InvalidRequest(inner) => ApiError::BadRequest(inner.to_string()),
            AccessError::Repository(inner) if inner.is_transient() => {
                ApiError::Unavailable(inner.to_string())
            }
            AccessError::Repository(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}
