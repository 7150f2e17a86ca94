//! Axum HTTP API server for the story-to-reel pipeline.
//!
//! This crate provides:
//! - Story, single-image and re-upload endpoints
//! - Per-IP rate limiting, request ids and CORS
//! - Health checks and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
