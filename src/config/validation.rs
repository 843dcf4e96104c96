//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of values loaded from the environment
//! - Validate CORS origins are exact `scheme://host[:port]` values
//! - Validate upstream URLs are plain HTTP base URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("SECRET_KEY must not be empty")]
    EmptySecretKey,

    #[error("ALLOWED_HOSTS must list at least one host")]
    NoAllowedHosts,

    #[error("invalid CORS origin {0:?}: expected scheme://host[:port]")]
    InvalidOrigin(String),

    #[error("invalid upstream URL for {name}: {value:?}")]
    InvalidUpstream { name: &'static str, value: String },

    #[error("token lifetimes must be positive")]
    InvalidLifetime,
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.secret_key.is_empty() {
        errors.push(ValidationError::EmptySecretKey);
    }

    if config.allowed_hosts.is_empty() {
        errors.push(ValidationError::NoAllowedHosts);
    }

    for origin in &config.cors.allowed_origins {
        if !is_valid_origin(origin) {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    let upstreams = [
        ("ADMIN_UPSTREAM_URL", &config.upstreams.admin),
        ("AUTH_UPSTREAM_URL", &config.upstreams.auth),
        ("EQUIPMENT_UPSTREAM_URL", &config.upstreams.equipment),
    ];
    for (name, value) in upstreams {
        if let Some(value) = value {
            if !is_valid_upstream(value) {
                errors.push(ValidationError::InvalidUpstream {
                    name,
                    value: value.clone(),
                });
            }
        }
    }

    if config.jwt.access_lifetime_secs <= 0 || config.jwt.refresh_lifetime_secs <= 0 {
        errors.push(ValidationError::InvalidLifetime);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An origin is a scheme and authority with no path, query or fragment.
fn is_valid_origin(origin: &str) -> bool {
    match Url::parse(origin) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some()
                && url.path() == "/"
                && !origin.ends_with('/')
                && url.query().is_none()
                && url.fragment().is_none()
                && url.username().is_empty()
        }
        Err(_) => false,
    }
}

/// Upstreams are reached through a plain HTTP connector.
fn is_valid_upstream(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => url.scheme() == "http" && url.host_str().is_some(),
        Err(_) => false,
    }
}
