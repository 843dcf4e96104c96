//! Security response headers.
//!
//! # Responsibilities
//! - Deny framing (`X-Frame-Options: DENY`)
//! - Disable MIME sniffing (`X-Content-Type-Options: nosniff`)
//! - Restrict referrers to same origin
//!
//! # Design Decisions
//! - Headers already set by a collaborator are left untouched

use axum::{
    http::{header, HeaderValue},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

pub fn with_security_headers(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("same-origin"),
        ))
}
