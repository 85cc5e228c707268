//! Error types for the dotsOCR gateway

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::engine::EngineError;
use crate::upload::UploadError;
use crate::workspace::WorkspaceError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Gateway error type
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("Parser error: {0}")]
    Parser(#[from] EngineError),

    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Upload(e) => e.status_code(),
            GatewayError::Workspace(_) | GatewayError::Parser(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", detail);
        } else {
            tracing::debug!(status = status.as_u16(), "Rejected request: {}", detail);
        }

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// Converts a handler panic into a 500 response with the panic message.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown internal error".to_string()
    };

    GatewayError::Internal(message).into_response()
}
