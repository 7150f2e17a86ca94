//! API error types.
//!
//! Every failure renders as `{ message, error }`. All request failures use
//! HTTP 500 except rate limiting, which uses 429.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use storyreel_pipeline::PipelineError;

pub type ApiResult<T> = Result<T, ApiError>;

const HIDDEN_DETAIL: &str = "An internal error occurred";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body missing, malformed or lacking a required field
    #[error("{0}")]
    BadRequest(String),

    #[error("Server configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Story(#[source] PipelineError),

    #[error("{0}")]
    Image(#[source] PipelineError),

    #[error("{0}")]
    Upload(#[source] PipelineError),

    #[error("Too many requests, please try again later")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Top-level message shown to clients.
    pub fn message(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Invalid request",
            ApiError::Config(_) => "Server configuration error",
            ApiError::Story(_) => "Error processing story",
            ApiError::Image(_) => "Error generating image",
            ApiError::Upload(_) => "Error uploading video",
            ApiError::RateLimited => "Rate limit exceeded",
            ApiError::Internal(_) => "Something broke!",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether `error` would leak server internals.
    fn is_internal(&self) -> bool {
        match self {
            ApiError::Story(e) | ApiError::Image(e) | ApiError::Upload(e) => !e.is_precondition(),
            ApiError::Internal(_) => true,
            _ => false,
        }
    }

    /// Response body; internal details are replaced in production.
    pub fn body(&self, production: bool) -> ErrorResponse {
        let error = if production && self.is_internal() {
            HIDDEN_DETAIL.to_string()
        } else {
            self.to_string()
        };
        ErrorResponse {
            message: self.message().to_string(),
            error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let production = std::env::var("ENVIRONMENT")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        if status.is_server_error() {
            tracing::error!(error = %self, "{}", self.message());
        }

        let body = Json(self.body(production));
        if matches!(self, ApiError::RateLimited) {
            return (status, [(header::RETRY_AFTER, "1")], body).into_response();
        }
        (status, body).into_response()
    }
}
