/**
 * Edge State
 *
 * Shared by every request: the origin client and the current asset cache
 * generation. Both are cheap to clone.
 *
 * # Example
 *
 * ```rust,no_run
 * use trivia_offline::edge::state::EdgeState;
 * use axum::extract::State;
 *
 * async fn handler(State(state): State<EdgeState>) {
 *     let _origin = state.upstream.base_url();
 * }
 * ```
 */
use super::asset_cache::AssetCache;
use super::upstream::Upstream;

#[derive(Debug, Clone)]
pub struct EdgeState {
    pub upstream: Upstream,
    pub cache: AssetCache,
}

impl EdgeState {
    pub fn new(upstream: Upstream, cache: AssetCache) -> Self {
        Self { upstream, cache }
    }
}
