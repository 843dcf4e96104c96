//! Startup orchestration.
//!
//! # Responsibilities
//! - Prepare the database directory and open the blacklist
//! - Build the token service and HTTP server
//! - Start background tasks (blacklist janitor, metrics exporter)
//! - Bind the listener and serve until a signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::auth::TokenService;
use crate::config::GatewayConfig;
use crate::http::{Collaborators, HttpServer};
use crate::lifecycle::shutdown::{drain, DRAIN_GRACE};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::store::{prepare_database_dir, BlacklistJanitor, SqliteBlacklist, StoreError};
use crate::upstream::UpstreamError;

const JANITOR_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Open the shared blacklist and build the token service.
pub fn open_token_service(config: &GatewayConfig) -> Result<Arc<TokenService>, StoreError> {
    prepare_database_dir(&config.database.path)?;
    let blacklist = Arc::new(SqliteBlacklist::open(&config.database.path)?);
    tracing::info!(path = %config.database.path.display(), "Token blacklist opened");
    Ok(Arc::new(TokenService::new(
        &config.secret_key,
        &config.jwt,
        blacklist,
    )))
}

/// Run the gateway until a termination signal.
pub async fn run(config: GatewayConfig, collaborators: Collaborators) -> Result<(), StartupError> {
    if config.uses_insecure_secret() && !config.debug {
        tracing::warn!("SECRET_KEY is the development placeholder; set it before going to production");
    }

    let config = Arc::new(config);
    let tokens = open_token_service(&config)?;

    if let Some(address) = &config.observability.metrics_address {
        match address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(metrics_address = %address, "Failed to parse metrics address"),
        }
    }

    let server = HttpServer::new(Arc::clone(&config), Arc::clone(&tokens), collaborators)?;

    let shutdown = Shutdown::new();
    let janitor = BlacklistJanitor::new(tokens.blacklist(), JANITOR_INTERVAL);
    let janitor_shutdown = shutdown.subscribe();
    let janitor_task = tokio::spawn(janitor.run(janitor_shutdown));

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    signals::wait_for_signal().await;
    shutdown.trigger();

    let served = match drain(server_task, "http server", DRAIN_GRACE).await {
        Some(result) => result.map_err(StartupError::Serve),
        None => Err(StartupError::Serve(std::io::Error::other(
            "http server did not stop cleanly",
        ))),
    };
    drain(janitor_task, "blacklist janitor", DRAIN_GRACE).await;
    served
}
