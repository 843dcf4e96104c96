//! Client-facing error responses.
//!
//! Bodies are JSON `{ "error": <code>, "message": <text> }`. Internal causes
//! are logged, never returned.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message for every authentication failure, whatever the cause.
pub const UNAUTHENTICATED_MESSAGE: &str =
    "Authentication credentials were not provided or are invalid.";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed { allow: String },

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("invalid host header")]
    DisallowedHost,

    #[error("{0} is not available")]
    Unavailable(&'static str),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            GatewayError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Not found.".to_string()),
            GatewayError::MethodNotAllowed { .. } => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                "Method not allowed.".to_string(),
            ),
            GatewayError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "not_authenticated",
                UNAUTHENTICATED_MESSAGE.to_string(),
            ),
            GatewayError::DisallowedHost => (
                StatusCode::BAD_REQUEST,
                "bad_request",
                "Bad request.".to_string(),
            ),
            GatewayError::Unavailable(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "unavailable",
                format!("The {what} is not available."),
            ),
            GatewayError::Upstream(e) => {
                tracing::error!(error = %e, "Upstream failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "bad_gateway",
                    "Upstream request failed.".to_string(),
                )
            }
            GatewayError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error.".to_string(),
                )
            }
        };

        let mut response = (status, Json(ErrorBody { error: code, message })).into_response();
        match self {
            GatewayError::MethodNotAllowed { allow } => {
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
            }
            GatewayError::Unauthenticated => {
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Bearer realm=\"api\""),
                );
            }
            _ => {}
        }
        response
    }
}
