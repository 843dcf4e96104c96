//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    Json, Router,
};
use equipment_gateway::auth::{AuthenticatedUser, TokenService};
use equipment_gateway::config::{GatewayConfig, Secret};
use equipment_gateway::store::MemoryBlacklist;
use equipment_gateway::{Collaborators, HttpServer, Shutdown};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret";

/// Production-like configuration: debug off, known secret.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.secret_key = Secret::new(SECRET);
    config.debug = false;
    config
}

pub fn token_service(config: &GatewayConfig) -> Arc<TokenService> {
    Arc::new(TokenService::new(
        &config.secret_key,
        &config.jwt,
        Arc::new(MemoryBlacklist::new()),
    ))
}

/// Equipment collaborator that echoes who called it and counts hits.
pub fn echo_router(hits: Arc<AtomicUsize>) -> Router {
    Router::new().fallback(echo).with_state(hits)
}

async fn echo(State(hits): State<Arc<AtomicUsize>>, request: Request) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    let path = request.uri().path().to_string();
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.user_id.clone());
    let body_len = to_bytes(request.into_body(), usize::MAX)
        .await
        .map(|b| b.len())
        .ok();
    Json(json!({ "path": path, "user_id": user, "body_len": body_len }))
}

pub struct TestGateway {
    pub router: Router,
    pub tokens: Arc<TokenService>,
    pub hits: Arc<AtomicUsize>,
}

impl TestGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_collaborators(config, Collaborators::new())
    }

    /// The echo equipment collaborator is always mounted on top of `collaborators`.
    pub fn with_collaborators(config: GatewayConfig, collaborators: Collaborators) -> Self {
        let tokens = token_service(&config);
        let hits = Arc::new(AtomicUsize::new(0));
        let collaborators = collaborators.with_equipment(echo_router(hits.clone()));
        let server = HttpServer::new(Arc::new(config), tokens.clone(), collaborators).unwrap();
        Self {
            router: server.router(),
            tokens,
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub async fn send(&self, request: axum::http::Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// True if any `access-control-allow-*` header is present.
    pub fn has_cors_headers(&self) -> bool {
        self.headers
            .keys()
            .any(|name| name.as_str().starts_with("access-control-allow-"))
    }
}

/// Request builder with an allowed Host header already set.
pub fn request(method: &str, path: &str) -> axum::http::request::Builder {
    axum::http::Request::builder()
        .method(method)
        .uri(path)
        .header("host", "localhost")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Start the gateway on an ephemeral port. Returns its address.
pub async fn spawn_gateway(
    config: GatewayConfig,
    tokens: Arc<TokenService>,
    collaborators: Collaborators,
    shutdown: &Shutdown,
) -> (SocketAddr, tokio::task::JoinHandle<Result<(), std::io::Error>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(Arc::new(config), tokens, collaborators).unwrap();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    (addr, handle)
}

/// Start a mock upstream that echoes the request headers it received.
pub async fn start_header_echo_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(|request: Request| async move {
        let headers: serde_json::Map<String, Value> = request
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    Value::String(v.to_str().unwrap_or_default().to_string()),
                )
            })
            .collect();
        Json(json!({
            "path": request.uri().path(),
            "query": request.uri().query(),
            "headers": headers,
        }))
    });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
