//! Shutdown coordination.
//!
//! One broadcast fires once; the HTTP server and the blacklist janitor each
//! hold a receiver. After firing, `drain` waits a bounded time for each task.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// How long a task may take to stop after the signal.
pub const DRAIN_GRACE: Duration = Duration::from_secs(30);

pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Firing with no subscribers left is not an error.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Await a task for at most `grace`. `None` if it panicked or overran.
pub async fn drain<T>(task: JoinHandle<T>, what: &'static str, grace: Duration) -> Option<T> {
    match tokio::time::timeout(grace, task).await {
        Ok(Ok(output)) => {
            tracing::debug!(task = what, "Task stopped");
            Some(output)
        }
        Ok(Err(e)) => {
            tracing::error!(task = what, error = %e, "Task panicked during shutdown");
            None
        }
        Err(_) => {
            tracing::warn!(task = what, grace_secs = grace.as_secs(), "Task did not stop in time");
            None
        }
    }
}
