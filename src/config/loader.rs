//! Configuration loading from the environment.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::schema::{
    DatabaseConfig, GatewayConfig, Secret, StaticFilesConfig, UpstreamsConfig,
};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported DATABASE_URL {0:?}: only SQLite paths and sqlite:// URLs are accepted")]
    UnsupportedDatabase(String),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from the process environment.
///
/// A `.env` file in the working directory is read first; variables already
/// present in the environment win.
pub fn load_config() -> Result<GatewayConfig, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }
    load_from(|key| std::env::var(key).ok())
}

/// Load and validate configuration from an arbitrary variable source.
pub fn load_from<F>(lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = GatewayConfig::default();
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let base_dir = var("BASE_DIR").map(PathBuf::from).unwrap_or(defaults.base_dir);

    let database = match var("DATABASE_URL") {
        Some(url) => DatabaseConfig {
            path: database_path(&url)?,
        },
        None => DatabaseConfig::under(&base_dir),
    };

    let mut google_oauth = defaults.google_oauth;
    if let Some(id) = var("GOOGLE_OAUTH_CLIENT_ID") {
        google_oauth.client_id = id;
    }
    if let Some(secret) = lookup("GOOGLE_OAUTH_CLIENT_SECRET") {
        google_oauth.client_secret = Secret::new(secret);
    }
    if let Some(uri) = var("GOOGLE_OAUTH_REDIRECT_URI") {
        google_oauth.redirect_uri = uri;
    }

    let mut cors = defaults.cors;
    if let Some(origins) = var("CORS_ALLOWED_ORIGINS") {
        cors.allowed_origins = split_list(&origins);
    }

    let mut listener = defaults.listener;
    if let Some(addr) = var("BIND_ADDRESS") {
        listener.bind_address = addr;
    }

    let config = GatewayConfig {
        // Set-but-empty must reach validation, not fall back to the placeholder.
        secret_key: lookup("SECRET_KEY")
            .map(|key| Secret::new(key.trim()))
            .unwrap_or(defaults.secret_key),
        debug: lookup("DEBUG").map_or(defaults.debug, |v| v == "True"),
        allowed_hosts: var("ALLOWED_HOSTS")
            .map(|hosts| split_list(&hosts))
            .unwrap_or(defaults.allowed_hosts),
        database,
        cors,
        jwt: defaults.jwt,
        limits: defaults.limits,
        otp_service_url: var("OTP_SERVICE_URL").unwrap_or(defaults.otp_service_url),
        google_oauth,
        listener,
        upstreams: UpstreamsConfig {
            admin: var("ADMIN_UPSTREAM_URL"),
            auth: var("AUTH_UPSTREAM_URL"),
            equipment: var("EQUIPMENT_UPSTREAM_URL"),
        },
        static_files: StaticFilesConfig::under(&base_dir),
        observability: crate::config::schema::ObservabilityConfig {
            metrics_address: var("METRICS_ADDRESS"),
        },
        base_dir,
    };

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Comma-separated list with surrounding whitespace and empty items dropped.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve `DATABASE_URL` to a SQLite file path.
fn database_path(raw: &str) -> Result<PathBuf, ConfigError> {
    if let Some(rest) = raw.strip_prefix("sqlite://") {
        if rest.is_empty() {
            return Err(ConfigError::UnsupportedDatabase(raw.to_string()));
        }
        return Ok(PathBuf::from(rest));
    }
    if raw.contains("://") {
        return Err(ConfigError::UnsupportedDatabase(raw.to_string()));
    }
    Ok(PathBuf::from(raw))
}
