//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! Every struct carries development defaults; production deployments override
//! them through the environment (see `loader.rs`).

use std::fmt;
use std::path::{Path, PathBuf};

/// Placeholder signing key used when `SECRET_KEY` is not set.
pub const INSECURE_SECRET_KEY: &str = "gateway-insecure-dev-key-change-in-production-@#$%^&*()";

/// Upper bound for request bodies and in-memory uploads (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10_485_760;

/// A string that must never show up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Root configuration for the gateway.
///
/// Built once at startup and shared read-only (behind an `Arc`) with every
/// component that needs it.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Key used to sign and verify tokens.
    pub secret_key: Secret,

    /// Debug mode. Enables static/media serving and human-readable logs.
    /// Never reported to clients.
    pub debug: bool,

    /// Host names accepted in the `Host` header.
    pub allowed_hosts: Vec<String>,

    /// Project root used to derive default paths.
    pub base_dir: PathBuf,

    /// Relational store location.
    pub database: DatabaseConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Token lifetimes.
    pub jwt: JwtConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// OTP delivery endpoint used by the auth collaborator.
    pub otp_service_url: String,

    /// Google OAuth client credentials used by the auth collaborator.
    pub google_oauth: GoogleOAuthConfig,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Remote collaborators the gateway forwards to.
    pub upstreams: UpstreamsConfig,

    /// Static and media file locations (served in debug only).
    pub static_files: StaticFilesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let base_dir = PathBuf::from(".");
        Self {
            secret_key: Secret::new(INSECURE_SECRET_KEY),
            debug: true,
            allowed_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            database: DatabaseConfig::under(&base_dir),
            cors: CorsConfig::default(),
            jwt: JwtConfig::default(),
            limits: LimitsConfig::default(),
            otp_service_url: "http://localhost:5000/api/otp/send".to_string(),
            google_oauth: GoogleOAuthConfig::default(),
            listener: ListenerConfig::default(),
            upstreams: UpstreamsConfig::default(),
            static_files: StaticFilesConfig::under(&base_dir),
            observability: ObservabilityConfig::default(),
            base_dir,
        }
    }
}

impl GatewayConfig {
    /// True when the signing key is still the development placeholder.
    pub fn uses_insecure_secret(&self) -> bool {
        self.secret_key.expose() == INSECURE_SECRET_KEY
    }
}

/// Database location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Path to the SQLite file.
    pub path: PathBuf,
}

impl DatabaseConfig {
    pub fn under(base_dir: &Path) -> Self {
        Self {
            path: base_dir.join("db.sqlite3"),
        }
    }
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Origins allowed to read responses (exact match).
    pub allowed_origins: Vec<String>,

    /// Whether listed origins may send credentials.
    pub allow_credentials: bool,

    /// `Access-Control-Max-Age` for preflight responses.
    pub preflight_max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            allow_credentials: true,
            preflight_max_age_secs: 86_400,
        }
    }
}

/// Token lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Access token lifetime in seconds.
    pub access_lifetime_secs: i64,

    /// Refresh token lifetime in seconds.
    pub refresh_lifetime_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_lifetime_secs: 5 * 60 * 60,
            refresh_lifetime_secs: 24 * 60 * 60,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Maximum size of an upload held in memory before spooling.
    pub max_memory_upload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: MAX_UPLOAD_BYTES,
            max_memory_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

/// Google OAuth client settings.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: Secret,
    pub redirect_uri: String,
}

impl Default for GoogleOAuthConfig {
    fn default() -> Self {
        Self {
            client_id: "local-dev-client.apps.googleusercontent.com".to_string(),
            client_secret: Secret::new(""),
            redirect_uri: "http://localhost:3000/auth/google/callback".to_string(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Base URLs of remote collaborators. `None` means nothing is mounted.
#[derive(Debug, Clone, Default)]
pub struct UpstreamsConfig {
    pub admin: Option<String>,
    pub auth: Option<String>,
    pub equipment: Option<String>,
}

/// Static and media file roots.
#[derive(Debug, Clone)]
pub struct StaticFilesConfig {
    pub static_root: PathBuf,
    pub media_root: PathBuf,
}

impl StaticFilesConfig {
    pub fn under(base_dir: &Path) -> Self {
        Self {
            static_root: base_dir.join("staticfiles"),
            media_root: base_dir.join("media"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Prometheus exporter bind address. Disabled when `None`.
    pub metrics_address: Option<String>,
}
