//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Assemble the request pipeline (outermost first):
//!   request id → trace → CORS → security headers → body limit → host guard
//!   → dispatch
//! - Dispatch: route lookup → method check → bearer stage → group handler
//! - Serve with graceful shutdown

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::auth::{authenticate_request, handlers::token_routes, TokenService};
use crate::config::GatewayConfig;
use crate::health::health_routes;
use crate::http::error::GatewayError;
use crate::http::request::{request_id, with_request_tracing};
use crate::observability::metrics;
use crate::routing::{AuthPolicy, RouteGroup, RouteTable};
use crate::security::{
    cors_middleware, host_guard, with_body_limit, with_security_headers, AllowedHosts, CorsPolicy,
};
use crate::upstream::{Upstream, UpstreamError};

/// In-process collaborators mounted behind the gateway.
///
/// A group left empty falls back to its configured upstream URL, and to a
/// 503 when there is none. Collaborator routers see the full request path.
#[derive(Clone, Default)]
pub struct Collaborators {
    admin: Option<Router>,
    auth: Option<Router>,
    equipment: Option<Router>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin(mut self, router: Router) -> Self {
        self.admin = Some(router);
        self
    }

    /// Auth endpoints besides the built-in token refresh/verify/logout.
    pub fn with_auth(mut self, router: Router) -> Self {
        self.auth = Some(router);
        self
    }

    pub fn with_equipment(mut self, router: Router) -> Self {
        self.equipment = Some(router);
        self
    }
}

/// Application state injected into the dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub tokens: Arc<TokenService>,
    pub groups: Arc<HashMap<RouteGroup, Router>>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(
        config: Arc<GatewayConfig>,
        tokens: Arc<TokenService>,
        collaborators: Collaborators,
    ) -> Result<Self, UpstreamError> {
        let groups = Self::build_groups(&config, &tokens, collaborators)?;
        let state = AppState {
            routes: Arc::new(RouteTable::standard(config.debug)),
            tokens,
            groups: Arc::new(groups),
        };
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    fn build_groups(
        config: &GatewayConfig,
        tokens: &Arc<TokenService>,
        collaborators: Collaborators,
    ) -> Result<HashMap<RouteGroup, Router>, UpstreamError> {
        let upstreams = &config.upstreams;

        let admin = mount(
            "admin interface",
            collaborators.admin,
            upstreams.admin.as_deref(),
        )?;
        let auth_fallback = mount(
            "authentication service",
            collaborators.auth,
            upstreams.auth.as_deref(),
        )?;
        let equipment = mount(
            "equipment service",
            collaborators.equipment,
            upstreams.equipment.as_deref(),
        )?;
        let auth = token_routes(Arc::clone(tokens)).fallback_service(auth_fallback);

        let statics = Router::new()
            .nest_service("/static", ServeDir::new(&config.static_files.static_root))
            .nest_service("/media", ServeDir::new(&config.static_files.media_root));

        Ok(HashMap::from([
            (RouteGroup::Health, health_routes()),
            (RouteGroup::Admin, admin),
            (RouteGroup::Auth, auth),
            (RouteGroup::Equipment, equipment),
            (RouteGroup::Static, statics),
        ]))
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let hosts = Arc::new(AllowedHosts::new(&config.allowed_hosts));
        let cors = Arc::new(CorsPolicy::new(&config.cors));

        let router = Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(middleware::from_fn_with_state(hosts, host_guard));
        let router = with_body_limit(router, &config.limits);
        let router = with_security_headers(router);
        let router = router.layer(middleware::from_fn_with_state(cors, cors_middleware));
        with_request_tracing(router)
    }

    /// The assembled router, for driving the gateway without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, debug = self.config.debug, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Pick the router for a collaborator group: in-process first, then remote.
fn mount(
    what: &'static str,
    local: Option<Router>,
    upstream: Option<&str>,
) -> Result<Router, UpstreamError> {
    if let Some(router) = local {
        return Ok(router);
    }
    if let Some(url) = upstream {
        tracing::info!(group = what, upstream = url, "Forwarding group to upstream");
        return Ok(Upstream::new(what, url)?.into_router());
    }
    tracing::warn!(group = what, "No collaborator mounted");
    Ok(Router::new().fallback(move || async move { GatewayError::Unavailable(what) }))
}

/// Final pipeline stage: route metadata is consulted, then the group runs.
async fn dispatch(State(state): State<AppState>, mut request: Request) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(route) = state.routes.match_path(&path) else {
        tracing::debug!(request_id = %request_id(&request), path = %path, "No route matched");
        metrics::record_request(method.as_str(), "none", 404, start);
        return GatewayError::NotFound.into_response();
    };

    if !route.allows_method(&method) {
        metrics::record_request(method.as_str(), route.name, 405, start);
        return GatewayError::MethodNotAllowed {
            allow: route.allow_header(),
        }
        .into_response();
    }

    if route.auth == AuthPolicy::Bearer {
        match authenticate_request(&state.tokens, request.headers()).await {
            Ok(user) => {
                tracing::debug!(user_id = %user.user_id, route = route.name, "Request authenticated");
                request.extensions_mut().insert(user);
            }
            Err(_) => {
                metrics::record_request(method.as_str(), route.name, 401, start);
                return GatewayError::Unauthenticated.into_response();
            }
        }
    }

    let Some(group) = state.groups.get(&route.group).cloned() else {
        return GatewayError::Internal(format!("no router for group {:?}", route.group))
            .into_response();
    };

    let response = group
        .oneshot(request)
        .await
        .unwrap_or_else(|never: Infallible| match never {});
    metrics::record_request(method.as_str(), route.name, response.status().as_u16(), start);
    response
}
