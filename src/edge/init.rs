/**
 * Edge Initialization
 *
 * # Initialization Process
 *
 * 1. Build the origin client
 * 2. Open the asset cache under the configured cache name
 * 3. Install: precache the static asset list (all or nothing)
 * 4. Activate: delete every other cache generation
 * 5. Create the router
 *
 * A failed install is logged and startup continues; requests are then
 * cached as they come in.
 */
use super::asset_cache::AssetCache;
use super::config::EdgeConfig;
use super::error::EdgeError;
use super::router::create_router;
use super::state::EdgeState;
use super::upstream::Upstream;
use axum::Router;

/// Create and configure the edge application
pub async fn create_app(config: &EdgeConfig) -> Result<Router, EdgeError> {
    tracing::info!("Initializing trivia edge for {}", config.upstream_url);

    let upstream = Upstream::new(config.upstream_url.clone(), config.upstream_timeout)?;

    let cache = match &config.cache_path {
        Some(path) => AssetCache::open(path, config.cache_name.clone()).await?,
        None => AssetCache::in_memory(config.cache_name.clone()).await?,
    };

    match cache.install(&upstream, &config.precache).await {
        Ok(count) => tracing::info!("Install complete: {} asset(s)", count),
        Err(e) => tracing::warn!("Install failed, continuing without precache: {}", e),
    }

    let cleared = cache.activate().await?;
    tracing::info!(
        "Cache {} active ({} old generation(s) cleared)",
        cache.name(),
        cleared.len()
    );

    Ok(create_router(EdgeState::new(upstream, cache)))
}
