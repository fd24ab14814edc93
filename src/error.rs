use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::gateway::GatewayError;
use crate::subscriptions::StoreError;
use crate::validation::ValidationError;

/// The main error type for the service.
///
/// Validation, gateway and store failures are client-visible and map to
/// `400 {success: false, message, error}`. Configuration and internal errors
/// map to `500` with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    BadRequest(String),

    /// The server request timeout elapsed before a response was ready.
    #[error("Request timed out")]
    Timeout(std::time::Duration),

    /// A failure re-labelled for the caller; the source's message becomes
    /// the `error` field.
    #[error("{message}")]
    WithMessage {
        message: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Failure body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Replace the caller-facing message, keeping this error as the detail.
    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self::WithMessage {
            message: message.into(),
            source: Box::new(self),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::Gateway(_)
            | Self::Store(_)
            | Self::BadRequest(_)
            | Self::Timeout(_) => StatusCode::BAD_REQUEST,
            Self::WithMessage { source, .. } => source.status_code(),
            Self::Config(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Value for the `error` field of the response body.
    fn details(&self) -> Option<Value> {
        match self {
            Self::Validation(e) => e.details(),
            Self::Gateway(e) => Some(e.details()),
            Self::Store(e) => Some(Value::String(e.detail())),
            Self::WithMessage { source, .. } => Some(Value::String(source.to_string())),
            Self::Timeout(limit) => Some(Value::String(format!(
                "Request exceeded {} seconds",
                limit.as_secs()
            ))),
            Self::BadRequest(_) | Self::Config(_) | Self::Anyhow(_) => None,
        }
    }

    /// Build the response body without logging.
    pub fn to_error_response(&self) -> ErrorResponse {
        let status = self.status_code();
        if status.is_server_error() {
            return ErrorResponse {
                success: false,
                message: "Internal server error".to_string(),
                error: None,
            };
        }

        ErrorResponse {
            success: false,
            message: self.to_string(),
            error: self.details(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, error_debug = ?self, "Request failed");
        } else {
            tracing::warn!(
                error = %self,
                detail = ?self.details(),
                status = status.as_u16(),
                "Request rejected"
            );
        }

        (status, Json(self.to_error_response())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
