//! Equipment Gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   GATEWAY                        │
//!   Client Request        │                                                  │
//!   ──────────────────────┼─▶ request id → trace → CORS → headers → limits   │
//!                         │                  → host guard → dispatch         │
//!                         │                                    │             │
//!                         │            ┌───────────────┬───────┴──────┐      │
//!                         │            ▼               ▼              ▼      │
//!                         │       /health/      /api/auth/, /admin/  /api/   │
//!                         │        (public)        (delegated)     (bearer)  │
//!                         │                            │              │      │
//!                         │                   token endpoints   auth stage   │
//!                         │                   + collaborator  + collaborator │
//!                         │                                                  │
//!                         │  config (env) │ store (SQLite blacklist) │ logs  │
//!                         └──────────────────────────────────────────────────┘
//! ```

use equipment_gateway::config::load_config;
use equipment_gateway::lifecycle;
use equipment_gateway::observability::logging::init_logging;
use equipment_gateway::Collaborators;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    init_logging(config.debug);

    tracing::info!("equipment-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        allowed_hosts = ?config.allowed_hosts,
        cors_origins = ?config.cors.allowed_origins,
        database = %config.database.path.display(),
        "Configuration loaded"
    );

    lifecycle::run(config, Collaborators::new()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
