//! Periodic removal of expired blacklist entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::store::TokenBlacklist;

pub struct BlacklistJanitor {
    blacklist: Arc<dyn TokenBlacklist>,
    interval: Duration,
}

impl BlacklistJanitor {
    pub fn new(blacklist: Arc<dyn TokenBlacklist>, interval: Duration) -> Self {
        Self {
            blacklist,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Blacklist janitor starting");

        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.purge_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Blacklist janitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn purge_once(&self) {
        let blacklist = Arc::clone(&self.blacklist);
        let now = chrono::Utc::now().timestamp();
        match tokio::task::spawn_blocking(move || blacklist.purge_expired(now)).await {
            Ok(Ok(0)) => {}
            Ok(Ok(removed)) => tracing::info!(removed, "Purged expired blacklist entries"),
            Ok(Err(e)) => tracing::error!(error = %e, "Blacklist purge failed"),
            Err(e) => tracing::error!(error = %e, "Blacklist purge task panicked"),
        }
    }
}
