//! Session token storage.
//!
//! A token store is a small key-value capability with per-key expiry. The
//! authenticator never caches what it reads here: every lookup goes to the
//! store so that expiry and revocation take effect on the next request.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::db::DbPool;
use crate::{DepotError, Result};

/// Key-value store for session tokens with time-to-live.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;

    /// Get the user id bound to `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<i64>>;

    /// Bind `key` to `user_id` for `ttl`, replacing any previous binding.
    async fn set(&self, key: &str, user_id: i64, ttl: Duration) -> Result<()>;

    /// Remove `key`. Returns `false` if it was absent or already expired.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Whether the store is reachable.
    async fn is_alive(&self) -> bool;

    /// Drop expired entries. Returns the number removed.
    async fn cleanup_expired(&self) -> Result<u64>;
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    user_id: i64,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-local token store.
///
/// Expiry uses the tokio clock, so tests can drive it with
/// `tokio::time::pause` and `advance`.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<i64>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.user_id)),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: evict lazily
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, user_id: i64, ttl: Duration) -> Result<()> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| DepotError::Config(format!("token ttl out of range: {ttl:?}")))?;
        let entry = Entry {
            user_id,
            expires_at,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let removed = self.entries.write().await.remove(key);
        Ok(removed.is_some_and(|e| e.is_live(Instant::now())))
    }

    async fn is_alive(&self) -> bool {
        true
    }

    async fn cleanup_expired(&self) -> Result<u64> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        Ok((before - entries.len()) as u64)
    }
}

/// Token store backed by the `sessions` table.
///
/// Expired rows are invisible to reads and are purged by
/// [`TokenStore::cleanup_expired`].
#[derive(Debug, Clone)]
pub struct SqliteTokenStore {
    pool: DbPool,
}

impl SqliteTokenStore {
    /// Create a store over an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn unavailable(e: sqlx::Error) -> DepotError {
    DepotError::StoreUnavailable(e.to_string())
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    fn backend_name(&self) -> &'static str {
        "database"
    }

    async fn get(&self, key: &str) -> Result<Option<i64>> {
        sqlx::query_scalar(
            "SELECT user_id FROM sessions WHERE token = ? AND expires_at > datetime('now')",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)
    }

    async fn set(&self, key: &str, user_id: i64, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| DepotError::Config(format!("token ttl out of range: {e}")))?;
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| DepotError::Config(format!("token ttl out of range: {ttl}")))?
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        sqlx::query("INSERT OR REPLACE INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(user_id)
            .bind(&expires_at)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE token = ? AND expires_at > datetime('now')")
                .bind(key)
                .execute(&self.pool)
                .await
                .map_err(unavailable)?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_alive(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    async fn cleanup_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= datetime('now')")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        let removed = result.rows_affected();
        debug!(removed, "Purged expired session rows");
        Ok(removed)
    }
}
