//! Request body limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size (10 MiB by default)
//!
//! # Design Decisions
//! - A `Content-Length` over the limit is refused with 413 before any byte
//!   of the body is read
//! - Chunked bodies are counted while streaming and cut off at the limit,
//!   so nothing larger is ever buffered

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::LimitsConfig;

pub fn with_body_limit(router: Router, limits: &LimitsConfig) -> Router {
    router
        .layer(DefaultBodyLimit::max(limits.max_memory_upload_bytes))
        .layer(RequestBodyLimitLayer::new(limits.max_body_bytes))
}
