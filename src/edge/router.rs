/**
 * Router Configuration
 *
 * The edge has no routes of its own: every path goes to the interceptor,
 * which decides between the origin, the asset cache and a fallback.
 */
use super::handlers::intercept;
use super::state::EdgeState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the edge router
pub fn create_router(state: EdgeState) -> Router {
    Router::new()
        .fallback(intercept)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
