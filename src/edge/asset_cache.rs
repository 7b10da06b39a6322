//! # Asset Cache
//!
//! Named, persistent cache of static responses keyed by path and query.
//!
//! ## Lifecycle
//!
//! - **install**: fetch the precache list from the origin and store it in
//!   one transaction. Any failed asset aborts the whole install.
//! - **activate**: drop every entry stored under another cache name, so
//!   bumping the name retires the previous generation.
//! - **match/put**: read-through for cache-first requests.

use super::error::EdgeError;
use super::upstream::Upstream;
use crate::shared::storage;
use axum::http::StatusCode;
use bytes::Bytes;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info};

/// A stored response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAsset {
    pub path: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct AssetCache {
    pool: SqlitePool,
    cache_name: String,
}

impl AssetCache {
    pub async fn open(path: &Path, cache_name: impl Into<String>) -> Result<Self, EdgeError> {
        let pool = storage::open_file_pool(path).await?;
        Self::init(pool, cache_name.into()).await
    }

    pub async fn in_memory(cache_name: impl Into<String>) -> Result<Self, EdgeError> {
        let pool = storage::open_memory_pool().await?;
        Self::init(pool, cache_name.into()).await
    }

    async fn init(pool: SqlitePool, cache_name: String) -> Result<Self, EdgeError> {
        sqlx::raw_sql(include_str!("schema.sql")).execute(&pool).await?;
        Ok(Self { pool, cache_name })
    }

    pub fn name(&self) -> &str {
        &self.cache_name
    }

    pub async fn match_path(&self, path: &str) -> Result<Option<CachedAsset>, EdgeError> {
        let row: Option<(i64, Option<String>, Vec<u8>)> = sqlx::query_as(
            "SELECT status, content_type, body FROM asset_cache WHERE cache_name = ? AND path = ?",
        )
        .bind(&self.cache_name)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(status, content_type, body)| CachedAsset {
            path: path.to_string(),
            status: u16::try_from(status).unwrap_or(200),
            content_type,
            body: Bytes::from(body),
        }))
    }

    pub async fn put(&self, asset: &CachedAsset) -> Result<(), EdgeError> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert(&mut conn, &self.cache_name, asset).await
    }

    /// Store every asset or none
    pub async fn put_all(&self, assets: &[CachedAsset]) -> Result<(), EdgeError> {
        let mut tx = self.pool.begin().await?;
        for asset in assets {
            Self::upsert(&mut tx, &self.cache_name, asset).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn upsert(
        conn: &mut sqlx::SqliteConnection,
        cache_name: &str,
        asset: &CachedAsset,
    ) -> Result<(), EdgeError> {
        sqlx::query(
            r#"
            INSERT INTO asset_cache (cache_name, path, status, content_type, body, stored_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (cache_name, path) DO UPDATE SET
                status = excluded.status,
                content_type = excluded.content_type,
                body = excluded.body,
                stored_at = excluded.stored_at
            "#,
        )
        .bind(cache_name)
        .bind(&asset.path)
        .bind(i64::from(asset.status))
        .bind(&asset.content_type)
        .bind(asset.body.as_ref())
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Delete entries of other cache generations; returns their names
    pub async fn activate(&self) -> Result<Vec<String>, EdgeError> {
        let stale: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT cache_name FROM asset_cache WHERE cache_name != ?")
                .bind(&self.cache_name)
                .fetch_all(&self.pool)
                .await?;

        if !stale.is_empty() {
            sqlx::query("DELETE FROM asset_cache WHERE cache_name != ?")
                .bind(&self.cache_name)
                .execute(&self.pool)
                .await?;
        }

        let stale: Vec<String> = stale.into_iter().map(|(name,)| name).collect();
        for name in &stale {
            info!("Cleared old cache {}", name);
        }
        Ok(stale)
    }

    /// Precache `paths` from the origin, all or nothing
    pub async fn install(&self, upstream: &Upstream, paths: &[String]) -> Result<usize, EdgeError> {
        let mut assets = Vec::with_capacity(paths.len());
        for path in paths {
            let response = upstream.get(path).await.map_err(|e| EdgeError::Install {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            if response.status != StatusCode::OK {
                return Err(EdgeError::Install {
                    path: path.clone(),
                    reason: format!("origin answered {}", response.status),
                });
            }
            debug!("Fetched {} for precache", path);
            assets.push(CachedAsset {
                path: path.clone(),
                status: response.status.as_u16(),
                content_type: response.content_type().map(str::to_string),
                body: response.body,
            });
        }

        self.put_all(&assets).await?;
        info!("Cached {} static asset(s) in {}", assets.len(), self.cache_name);
        Ok(assets.len())
    }
}
