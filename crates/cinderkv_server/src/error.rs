//! Server error types and their HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cinderkv_core::CoreError;
use cinderkv_types::TypeError;
use serde_json::json;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors produced while serving requests or booting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Engine failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Typed payload conversion failure.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Malformed request body.
    #[error("bad request: {message}")]
    BadRequest {
        /// Description of the problem.
        message: String,
    },

    /// Invalid configuration, caught at boot.
    #[error("config error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// Listener or connection failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal failure (e.g. a cancelled worker task).
    #[error("internal error: {message}")]
    Internal {
        /// Description of the problem.
        message: String,
    },
}

impl ServerError {
    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Core(CoreError::NotFound) => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Core(CoreError::NotFound) => "key data not found.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "message": self.message() }));
        (status, body).into_response()
    }
}
