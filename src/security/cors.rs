//! Cross-origin policy enforcement.
//!
//! # Responsibilities
//! - Compare `Origin` against the allow-list (exact string match)
//! - Answer preflight requests before any other stage
//! - Add permissive headers only for listed origins
//!
//! # Design Decisions
//! - Unlisted origins get no `Access-Control-Allow-*` header at all, not even
//!   on preflight; the browser then blocks script access
//! - Methods and headers are fixed lists, never mirrored from the request
//! - CORS headers a collaborator sets are dropped, then re-derived here

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::CorsConfig;

/// Methods listed in `Access-Control-Allow-Methods`.
pub const ALLOWED_METHODS: [&str; 6] = ["DELETE", "GET", "OPTIONS", "PATCH", "POST", "PUT"];

/// Headers listed in `Access-Control-Allow-Headers`.
pub const ALLOWED_HEADERS: [&str; 9] = [
    "accept",
    "accept-encoding",
    "authorization",
    "content-type",
    "dnt",
    "origin",
    "user-agent",
    "x-csrftoken",
    "x-requested-with",
];

/// Compiled CORS policy.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Vec<String>,
    allow_credentials: bool,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsPolicy {
    pub fn new(config: &CorsConfig) -> Self {
        Self {
            origins: config.allowed_origins.clone(),
            allow_credentials: config.allow_credentials,
            allow_methods: HeaderValue::from_static("DELETE, GET, OPTIONS, PATCH, POST, PUT"),
            allow_headers: HeaderValue::from_static(
                "accept, accept-encoding, authorization, content-type, dnt, origin, \
                 user-agent, x-csrftoken, x-requested-with",
            ),
            max_age: HeaderValue::from(config.preflight_max_age_secs),
        }
    }

    /// Exact match against the allow-list.
    pub fn allows(&self, origin: &str) -> bool {
        self.origins.iter().any(|allowed| allowed == origin)
    }

    fn allowed_origin<'a>(&self, headers: &'a HeaderMap) -> Option<&'a HeaderValue> {
        headers
            .get(header::ORIGIN)
            .filter(|value| value.to_str().map(|o| self.allows(o)).unwrap_or(false))
    }

    fn apply(&self, headers: &mut HeaderMap, origin: &HeaderValue) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        if self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
    }

    fn apply_preflight(&self, headers: &mut HeaderMap, origin: &HeaderValue) {
        self.apply(headers, origin);
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
    }
}

fn is_preflight(request: &Request<Body>) -> bool {
    request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Drop CORS headers set downstream; only this policy decides them.
fn strip_cors_headers(headers: &mut HeaderMap) {
    let downstream: Vec<_> = headers
        .keys()
        .filter(|name| {
            let name = name.as_str();
            name.starts_with("access-control-allow-")
                || name == "access-control-max-age"
                || name == "access-control-expose-headers"
        })
        .cloned()
        .collect();
    for name in downstream {
        headers.remove(name);
    }
}

pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = policy.allowed_origin(request.headers()).cloned();

    if is_preflight(&request) {
        let mut response = StatusCode::OK.into_response();
        if let Some(origin) = &origin {
            policy.apply_preflight(response.headers_mut(), origin);
        }
        response
            .headers_mut()
            .append(header::VARY, HeaderValue::from_static("origin"));
        return response;
    }

    let mut response = next.run(request).await;
    strip_cors_headers(response.headers_mut());
    if let Some(origin) = &origin {
        policy.apply(response.headers_mut(), origin);
    }
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("origin"));
    response
}
