//! Route table and lookup.
//!
//! # Responsibilities
//! - Hold the declarative route table (prefix, group, methods, auth policy)
//! - Look up the first route whose prefix matches
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for a handful of routes)
//! - More specific prefixes are listed first (`/api/auth/` before `/api/`)

use axum::http::Method;

use crate::routing::matcher::PathPrefixMatcher;

/// Handler group a route dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteGroup {
    Health,
    Admin,
    Auth,
    Equipment,
    Static,
}

/// What the gateway checks before handing a request to the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// No credentials required.
    Public,
    /// The group authenticates on its own (admin sessions, login endpoints).
    Delegated,
    /// A valid access token is required.
    Bearer,
}

/// One entry of the route table.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    /// Route identifier for logging/metrics.
    pub name: &'static str,
    pub matcher: PathPrefixMatcher,
    pub group: RouteGroup,
    /// Accepted methods; `None` accepts any method.
    pub methods: Option<Vec<Method>>,
    pub auth: AuthPolicy,
    /// Match the prefix as a whole path only.
    pub exact: bool,
}

impl RouteSpec {
    pub fn new(name: &'static str, prefix: &str, group: RouteGroup, auth: AuthPolicy) -> Self {
        Self {
            name,
            matcher: PathPrefixMatcher::new(prefix),
            group,
            methods: None,
            auth,
            exact: false,
        }
    }

    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.exact {
            path == self.matcher.prefix()
        } else {
            self.matcher.matches(path)
        }
    }

    pub fn methods(mut self, methods: &[Method]) -> Self {
        self.methods = Some(methods.to_vec());
        self
    }

    pub fn allows_method(&self, method: &Method) -> bool {
        self.methods
            .as_ref()
            .map_or(true, |allowed| allowed.contains(method))
    }

    /// Value for the `Allow` header on a 405.
    pub fn allow_header(&self) -> String {
        self.methods
            .as_ref()
            .map(|allowed| {
                allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }
}

/// Ordered, immutable route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteSpec>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteSpec>) -> Self {
        Self { routes }
    }

    /// The gateway's routes. Static and media are only served in debug.
    pub fn standard(debug: bool) -> Self {
        let mut routes = vec![
            RouteSpec::new("health", "/health/", RouteGroup::Health, AuthPolicy::Public)
                .methods(&[Method::GET])
                .exact(),
            RouteSpec::new("admin", "/admin/", RouteGroup::Admin, AuthPolicy::Delegated),
            RouteSpec::new("auth", "/api/auth/", RouteGroup::Auth, AuthPolicy::Delegated),
            RouteSpec::new("equipment", "/api/", RouteGroup::Equipment, AuthPolicy::Bearer),
        ];
        if debug {
            routes.push(
                RouteSpec::new("static", "/static/", RouteGroup::Static, AuthPolicy::Public)
                    .methods(&[Method::GET, Method::HEAD]),
            );
            routes.push(
                RouteSpec::new("media", "/media/", RouteGroup::Static, AuthPolicy::Public)
                    .methods(&[Method::GET, Method::HEAD]),
            );
        }
        Self::new(routes)
    }

    /// First route whose prefix matches, in table order.
    pub fn match_path(&self, path: &str) -> Option<&RouteSpec> {
        self.routes.iter().find(|route| route.matches(path))
    }

    pub fn routes(&self) -> &[RouteSpec] {
        &self.routes
    }
}
