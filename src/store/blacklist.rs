//! Token revocation blacklist.

use std::path::Path;
use std::sync::Mutex;

use dashmap::DashMap;
use rusqlite::{params, Connection, OptionalExtension};

use crate::store::StoreError;

/// A revoked token, keyed by its `jti` claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistEntry {
    pub jti: String,
    pub user_id: String,
    pub token_type: String,
    /// Unix timestamp after which the token is expired anyway.
    pub expires_at: i64,
}

/// Storage for revoked token ids.
///
/// Implementations are synchronous; async callers go through
/// `tokio::task::spawn_blocking`.
pub trait TokenBlacklist: Send + Sync {
    /// True if the token id has been revoked.
    fn is_blacklisted(&self, jti: &str) -> Result<bool, StoreError>;

    /// Revoke a token. Revoking twice is not an error.
    fn blacklist(&self, entry: &BlacklistEntry) -> Result<(), StoreError>;

    /// Drop entries whose token expired before `now`. Returns the number removed.
    fn purge_expired(&self, now: i64) -> Result<usize, StoreError>;
}

/// SQLite-backed blacklist shared by every gateway process using the same file.
pub struct SqliteBlacklist {
    connection: Mutex<Connection>,
}

impl SqliteBlacklist {
    /// Opens the blacklist at the provided database path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             CREATE TABLE IF NOT EXISTS token_blacklist (\
                 jti TEXT PRIMARY KEY,\
                 user_id TEXT NOT NULL,\
                 token_type TEXT NOT NULL,\
                 expires_at INTEGER NOT NULL,\
                 blacklisted_at INTEGER NOT NULL);\
             CREATE INDEX IF NOT EXISTS idx_token_blacklist_expires \
                 ON token_blacklist(expires_at);",
        )?;
        Ok(Self {
            connection: Mutex::new(conn),
        })
    }
}

impl TokenBlacklist for SqliteBlacklist {
    fn is_blacklisted(&self, jti: &str) -> Result<bool, StoreError> {
        let conn = self.connection.lock().map_err(|_| StoreError::Poisoned)?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM token_blacklist WHERE jti = ?1",
                params![jti],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn blacklist(&self, entry: &BlacklistEntry) -> Result<(), StoreError> {
        let conn = self.connection.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute(
            "INSERT OR IGNORE INTO token_blacklist \
             (jti, user_id, token_type, expires_at, blacklisted_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.jti,
                entry.user_id,
                entry.token_type,
                entry.expires_at,
                chrono::Utc::now().timestamp(),
            ],
        )?;
        Ok(())
    }

    fn purge_expired(&self, now: i64) -> Result<usize, StoreError> {
        let conn = self.connection.lock().map_err(|_| StoreError::Poisoned)?;
        let removed = conn.execute(
            "DELETE FROM token_blacklist WHERE expires_at < ?1",
            params![now],
        )?;
        Ok(removed)
    }
}

/// Process-local blacklist. Not shared across instances.
#[derive(Default)]
pub struct MemoryBlacklist {
    entries: DashMap<String, i64>,
}

impl MemoryBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TokenBlacklist for MemoryBlacklist {
    fn is_blacklisted(&self, jti: &str) -> Result<bool, StoreError> {
        Ok(self.entries.contains_key(jti))
    }

    fn blacklist(&self, entry: &BlacklistEntry) -> Result<(), StoreError> {
        self.entries.insert(entry.jti.clone(), entry.expires_at);
        Ok(())
    }

    fn purge_expired(&self, now: i64) -> Result<usize, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at >= now);
        Ok(before - self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(jti: &str, expires_at: i64) -> BlacklistEntry {
        BlacklistEntry {
            jti: jti.to_string(),
            user_id: "42".to_string(),
            token_type: "refresh".to_string(),
            expires_at,
        }
    }

    fn exercise(store: &dyn TokenBlacklist) {
        assert!(!store.is_blacklisted("a").unwrap());

        store.blacklist(&entry("a", 100)).unwrap();
        store.blacklist(&entry("b", 300)).unwrap();
        // Second revocation of the same id is a no-op.
        store.blacklist(&entry("a", 100)).unwrap();

        assert!(store.is_blacklisted("a").unwrap());
        assert!(store.is_blacklisted("b").unwrap());

        assert_eq!(store.purge_expired(200).unwrap(), 1);
        assert!(!store.is_blacklisted("a").unwrap());
        assert!(store.is_blacklisted("b").unwrap());
    }

    #[test]
    fn test_sqlite_blacklist() {
        exercise(&SqliteBlacklist::open_in_memory().unwrap());
    }

    #[test]
    fn test_memory_blacklist() {
        exercise(&MemoryBlacklist::new());
    }

    #[test]
    fn test_sqlite_blacklist_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.sqlite3");

        SqliteBlacklist::open(&path)
            .unwrap()
            .blacklist(&entry("persisted", i64::MAX))
            .unwrap();

        let reopened = SqliteBlacklist::open(&path).unwrap();
        assert!(reopened.is_blacklisted("persisted").unwrap());
    }
}
