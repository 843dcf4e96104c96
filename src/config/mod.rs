//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment (+ optional .env)
//!     → loader.rs (read variables, apply defaults)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Every setting has a development default
//! - Secrets are wrapped so `Debug` output never contains them

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from, ConfigError};
pub use schema::{
    CorsConfig, DatabaseConfig, GatewayConfig, JwtConfig, LimitsConfig, Secret,
    UpstreamsConfig, MAX_UPLOAD_BYTES,
};
