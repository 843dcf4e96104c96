//! Persistent store binding.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     DatabaseConfig.path
//!     → prepare_database_dir (create parent, fatal on failure)
//!     → SqliteBlacklist::open (schema bootstrap)
//!
//! Request time:
//!     auth middleware → TokenBlacklist::is_blacklisted (spawn_blocking)
//! ```
//!
//! # Design Decisions
//! - The database directory is created at startup; failure aborts startup
//! - Blacklist lookups fail closed: a store error rejects the token
//! - Expired entries are purged in the background (`janitor.rs`)

pub mod blacklist;
pub mod janitor;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use blacklist::{BlacklistEntry, MemoryBlacklist, SqliteBlacklist, TokenBlacklist};
pub use janitor::BlacklistJanitor;

/// Errors raised by the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Ensure the directory containing the database file exists.
pub fn prepare_database_dir(db_path: &Path) -> Result<(), StoreError> {
    let Some(parent) = db_path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
        path: parent.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %parent.display(), "Database directory ready");
    Ok(())
}
