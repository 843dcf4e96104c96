//! Forwarding to remote collaborators.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the collaborator's base address
//! - Strip hop-by-hop headers and any client-supplied identity header
//! - Pass the authenticated user id downstream
//! - Map connection failures to 502
//!
//! # Design Decisions
//! - Bodies are streamed, never buffered; the body limit still applies
//! - No retries: non-idempotent API calls must not be replayed

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{
        header,
        uri::{Authority, PathAndQuery, Scheme},
        HeaderName, HeaderValue, Uri,
    },
    response::{IntoResponse, Response},
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use url::Url;

use crate::auth::AuthenticatedUser;
use crate::http::error::GatewayError;

/// Header carrying the authenticated user id to collaborators.
pub const X_AUTHENTICATED_USER_ID: HeaderName = HeaderName::from_static("x-authenticated-user-id");

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream URL {0:?}")]
    InvalidUrl(String),
}

/// A remote collaborator reachable over plain HTTP.
pub struct Upstream {
    name: &'static str,
    authority: Authority,
    client: Client<HttpConnector, Body>,
}

impl Upstream {
    pub fn new(name: &'static str, base_url: &str) -> Result<Self, UpstreamError> {
        let url = Url::parse(base_url).map_err(|_| UpstreamError::InvalidUrl(base_url.into()))?;
        let host = url
            .host_str()
            .ok_or_else(|| UpstreamError::InvalidUrl(base_url.into()))?;
        let authority = match url.port_or_known_default() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority)
            .map_err(|_| UpstreamError::InvalidUrl(base_url.into()))?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            name,
            authority,
            client,
        })
    }

    /// Router that forwards every request it receives.
    pub fn into_router(self) -> Router {
        Router::new().fallback(forward).with_state(Arc::new(self))
    }

    fn target_uri(&self, original: &Uri) -> Result<Uri, GatewayError> {
        let mut parts = original.clone().into_parts();
        parts.scheme = Some(Scheme::HTTP);
        parts.authority = Some(self.authority.clone());
        if parts.path_and_query.is_none() {
            parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        Uri::from_parts(parts).map_err(|e| GatewayError::Internal(e.to_string()))
    }
}

async fn forward(State(upstream): State<Arc<Upstream>>, request: Request) -> Response {
    match forward_inner(&upstream, request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn forward_inner(upstream: &Upstream, request: Request) -> Result<Response, GatewayError> {
    let (mut parts, body) = request.into_parts();

    let client_ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let user = parts.extensions.get::<AuthenticatedUser>().cloned();
    let original_host = parts.headers.get(header::HOST).cloned();

    for name in HOP_BY_HOP {
        parts.headers.remove(name);
    }
    parts.headers.remove(&X_AUTHENTICATED_USER_ID);

    if let Some(user) = user {
        let value = HeaderValue::from_str(&user.user_id)
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        parts.headers.insert(X_AUTHENTICATED_USER_ID, value);
    }
    if let Some(ip) = client_ip {
        if let Ok(value) = HeaderValue::from_str(&ip.to_string()) {
            parts.headers.insert("x-forwarded-for", value);
        }
    }
    if let Some(host) = original_host {
        parts.headers.insert("x-forwarded-host", host);
    }
    parts
        .headers
        .insert("x-forwarded-proto", HeaderValue::from_static("http"));
    parts.headers.remove(header::HOST);

    parts.uri = upstream.target_uri(&parts.uri)?;

    tracing::debug!(upstream = upstream.name, uri = %parts.uri, "Forwarding request");

    let request = axum::http::Request::from_parts(parts, body);
    match upstream.client.request(request).await {
        Ok(response) => {
            let (mut parts, body) = response.into_parts();
            for name in HOP_BY_HOP {
                parts.headers.remove(name);
            }
            Ok(Response::from_parts(parts, Body::new(body)))
        }
        Err(e) => Err(GatewayError::Upstream(format!("{}: {e}", upstream.name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_uri_keeps_path_and_query() {
        let upstream = Upstream::new("equipment", "http://10.0.0.5:9000").unwrap();
        let uri: Uri = "/api/datasets/?page=2".parse().unwrap();
        assert_eq!(
            upstream.target_uri(&uri).unwrap().to_string(),
            "http://10.0.0.5:9000/api/datasets/?page=2"
        );
    }

    #[test]
    fn test_default_port() {
        let upstream = Upstream::new("auth", "http://auth.internal").unwrap();
        let uri: Uri = "/api/auth/login/".parse().unwrap();
        assert_eq!(
            upstream.target_uri(&uri).unwrap().to_string(),
            "http://auth.internal:80/api/auth/login/"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(Upstream::new("admin", "not a url").is_err());
    }
}
