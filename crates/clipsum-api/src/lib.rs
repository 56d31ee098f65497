//! Axum HTTP API server for the clip summary service.
//!
//! This crate provides:
//! - `POST /v1/process`, mapping pipeline errors to status codes
//! - SSRF-safe URL validation and security headers
//! - Liveness, readiness and Prometheus metrics endpoints
//! - Static serving of captured frames

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
