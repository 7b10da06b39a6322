//! # Local Store
//!
//! Persistent key/value storage for everything the client keeps between
//! runs: the session token, the cached account, the offline ledger and the
//! question snapshot.
//!
//! Values are JSON documents stored in a single SQLite table. Every value
//! carries a `version` that is bumped on each write, which lets
//! read-modify-write callers detect a concurrent writer (another client
//! process sharing the same file) with [`LocalStore::compare_and_swap`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trivia_offline::client::local_store::{keys, LocalStore};
//!
//! # async fn demo() -> Result<(), trivia_offline::client::local_store::StoreError> {
//! let store = LocalStore::in_memory().await?;
//! store.put(keys::SESSION_TOKEN, &"token".to_string()).await?;
//! let token = store.get::<String>(keys::SESSION_TOKEN).await?;
//! assert_eq!(token.map(|v| v.value).as_deref(), Some("token"));
//! # Ok(())
//! # }
//! ```

pub mod session;

pub use session::SessionStore;

use crate::shared::storage;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error};

/// Well-known keys
pub mod keys {
    pub const SESSION_TOKEN: &str = "session_token";
    pub const ACCOUNT_SNAPSHOT: &str = "account_snapshot";
    pub const OFFLINE_PROGRESS: &str = "offline_progress";
    pub const QUESTION_SNAPSHOT: &str = "question_snapshot";
}

/// Local store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored value for '{key}' is not valid JSON: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A stored value together with its write version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: i64,
}

/// Handle to the local SQLite store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Open or create the store at `path`
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        debug!("Opening local store at {}", path.display());
        let pool = storage::open_file_pool(path).await?;
        Self::init(pool).await
    }

    /// Private, non-persistent store
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = storage::open_memory_pool().await?;
        Self::init(pool).await
    }

    async fn init(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(include_str!("schema.sql"))
            .execute(&pool)
            .await
            .map_err(|e| {
                error!("Failed to initialise local store schema: {}", e);
                e
            })?;
        Ok(Self { pool })
    }

    /// Read and decode the value stored under `key`
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<Versioned<T>>, StoreError> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT value, version FROM local_store WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(raw, version)| {
            serde_json::from_str(&raw)
                .map(|value| Versioned { value, version })
                .map_err(|source| StoreError::Serialization {
                    key: key.to_string(),
                    source,
                })
        })
        .transpose()
    }

    /// Unconditionally write `value`, returning the new version
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<i64, StoreError> {
        let raw = encode(key, value)?;
        let (version,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO local_store (key, value, version, updated_at)
            VALUES (?, ?, 1, ?)
            ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                version = local_store.version + 1,
                updated_at = excluded.updated_at
            RETURNING version
            "#,
        )
        .bind(key)
        .bind(raw)
        .bind(chrono::Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(version)
    }

    /// Write `value` only if the stored version still equals `expected`.
    ///
    /// `expected = None` means "only if the key is absent". Returns whether
    /// the write happened.
    pub async fn compare_and_swap<T: Serialize>(
        &self,
        key: &str,
        expected: Option<i64>,
        value: &T,
    ) -> Result<bool, StoreError> {
        let raw = encode(key, value)?;
        let now = chrono::Utc::now().to_rfc3339();

        let result = match expected {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO local_store (key, value, version, updated_at)
                    VALUES (?, ?, 1, ?)
                    ON CONFLICT (key) DO NOTHING
                    "#,
                )
                .bind(key)
                .bind(raw)
                .bind(now)
                .execute(&self.pool)
                .await?
            }
            Some(version) => {
                sqlx::query(
                    r#"
                    UPDATE local_store
                    SET value = ?, version = version + 1, updated_at = ?
                    WHERE key = ? AND version = ?
                    "#,
                )
                .bind(raw)
                .bind(now)
                .bind(key)
                .bind(version)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected() == 1)
    }

    /// Delete `key`. Returns whether anything was removed.
    pub async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM local_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })
}
