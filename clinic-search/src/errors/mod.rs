//! Error types for the clinic search service.
//!
//! `AppError` covers startup and configuration failures returned from `main`.
//! `ApiError` is what HTTP handlers return; it renders the JSON error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use clinic_search_repository::SearchEngineError;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::server::response;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The primary store could not be reached.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// The HTTP server failed to bind or stopped with an error.
    #[error("Server error: {0}")]
    ServerError(#[from] std::io::Error),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Errors returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed request input.
    #[error("{0}")]
    BadRequest(String),

    /// A destructive route was called without a valid operator token.
    #[error("{0}")]
    Forbidden(String),

    /// A search layer operation failed.
    #[error(transparent)]
    Engine(#[from] SearchEngineError),
}

impl ApiError {
    /// Create a bad request error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Create a forbidden error.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Engine(err) => match err {
                SearchEngineError::ValidationError(_)
                | SearchEngineError::BatchSizeExceeded { .. }
                | SearchEngineError::SchemaViolation { .. } => StatusCode::BAD_REQUEST,
                SearchEngineError::DocumentNotFound(_) => StatusCode::NOT_FOUND,
                SearchEngineError::ServiceDisabled
                | SearchEngineError::ConnectionError(_)
                | SearchEngineError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Short machine-readable error kind for the envelope's `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Engine(err) => match err {
                SearchEngineError::ServiceDisabled => "service_disabled",
                SearchEngineError::ConnectionError(_) | SearchEngineError::Timeout(_) => {
                    "engine_unavailable"
                }
                SearchEngineError::ValidationError(_)
                | SearchEngineError::BatchSizeExceeded { .. } => "validation_error",
                SearchEngineError::SchemaViolation { .. } => "schema_violation",
                SearchEngineError::DocumentNotFound(_) => "not_found",
                _ => "internal_error",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        match &self {
            ApiError::Engine(err) if err.is_disabled() => {
                debug!(error = %message, "Request rejected: search service disabled");
            }
            _ if status.is_server_error() => error!(status = %status, error = %message, "Request failed"),
            _ => warn!(status = %status, error = %message, "Request rejected"),
        }

        response::error(status, message, self.kind())
    }
}
