//! `Host` header validation against `ALLOWED_HOSTS`.
//!
//! Patterns: `*` matches anything, a leading dot (`.example.com`) matches the
//! domain and every subdomain, anything else is an exact, case-insensitive
//! match. The port is ignored.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::GatewayError;

#[derive(Debug, Clone)]
pub struct AllowedHosts {
    patterns: Vec<String>,
}

impl AllowedHosts {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_ascii_lowercase()).collect(),
        }
    }

    pub fn allows(&self, host: &str) -> bool {
        let host = strip_port(host).to_ascii_lowercase();
        if host.is_empty() {
            return false;
        }
        self.patterns.iter().any(|pattern| {
            if pattern == "*" {
                true
            } else if let Some(domain) = pattern.strip_prefix('.') {
                host == domain || host.ends_with(pattern.as_str())
            } else {
                host == *pattern
            }
        })
    }
}

/// `example.com:8000` → `example.com`, `[::1]:8000` → `[::1]`.
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

pub async fn host_guard(
    State(hosts): State<Arc<AllowedHosts>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
        .map(str::to_string);

    match host {
        Some(ref host) if hosts.allows(host) => next.run(request).await,
        other => {
            tracing::warn!(host = ?other, "Rejected request with disallowed Host header");
            GatewayError::DisallowedHost.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(patterns: &[&str]) -> AllowedHosts {
        let patterns: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
        AllowedHosts::new(&patterns)
    }

    #[test]
    fn test_exact_hosts_ignore_port_and_case() {
        let allowed = hosts(&["localhost", "127.0.0.1"]);
        assert!(allowed.allows("localhost"));
        assert!(allowed.allows("LOCALHOST:8000"));
        assert!(allowed.allows("127.0.0.1:8000"));
        assert!(!allowed.allows("evil.com"));
        assert!(!allowed.allows("localhost.evil.com"));
        assert!(!allowed.allows(""));
    }

    #[test]
    fn test_subdomain_pattern() {
        let allowed = hosts(&[".example.com"]);
        assert!(allowed.allows("example.com"));
        assert!(allowed.allows("api.example.com:443"));
        assert!(!allowed.allows("badexample.com"));
    }

    #[test]
    fn test_wildcard_and_ipv6() {
        assert!(hosts(&["*"]).allows("anything.test"));
        assert!(hosts(&["[::1]"]).allows("[::1]:8000"));
    }
}
