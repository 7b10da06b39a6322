//! # Request Interception
//!
//! Every request lands in [`intercept`] and is routed by path:
//!
//! - `/api/` and `/auth/`: network-first. Whatever the origin answers is
//!   passed through, error statuses included. Only an unreachable origin
//!   produces a fallback.
//! - everything else, `GET` only: cache-first. Hits are served from the
//!   asset cache; misses are fetched, and `200` responses stored.
//! - other methods are forwarded untouched.

use super::asset_cache::CachedAsset;
use super::error::EdgeError;
use super::fallback::{api_fallback, asset_response, static_fallback, Destination};
use super::state::EdgeState;
use super::upstream::{strip_hop_by_hop, UpstreamResponse};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use tracing::{debug, warn};

/// Largest request body forwarded to the origin
const MAX_BODY_BYTES: usize = 1024 * 1024;

fn is_network_first(path: &str) -> bool {
    path.starts_with("/api/") || path.starts_with("/auth/")
}

pub async fn intercept(
    State(state): State<EdgeState>,
    request: Request,
) -> Result<Response, EdgeError> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    if is_network_first(parts.uri.path()) {
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| EdgeError::BadRequest(format!("unreadable body: {}", e)))?;

        return match state
            .upstream
            .forward(parts.method, &path_and_query, parts.headers.clone(), body)
            .await
        {
            Ok(response) => Ok(into_response(response)),
            Err(e) => {
                warn!("Origin unreachable for {}: {}", path_and_query, e);
                Ok(api_fallback(&parts.uri, &parts.headers))
            }
        };
    }

    if parts.method != Method::GET {
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| EdgeError::BadRequest(format!("unreadable body: {}", e)))?;
        let response = state
            .upstream
            .forward(parts.method, &path_and_query, parts.headers, body)
            .await?;
        return Ok(into_response(response));
    }

    if let Some(asset) = state.cache.match_path(&path_and_query).await? {
        debug!("Cache hit {}", path_and_query);
        return Ok(asset_response(asset));
    }

    match state
        .upstream
        .forward(Method::GET, &path_and_query, parts.headers.clone(), Default::default())
        .await
    {
        Ok(response) => {
            if response.status == StatusCode::OK {
                let asset = CachedAsset {
                    path: path_and_query.clone(),
                    status: response.status.as_u16(),
                    content_type: response.content_type().map(str::to_string),
                    body: response.body.clone(),
                };
                // A failed store must not cost the caller the response
                if let Err(e) = state.cache.put(&asset).await {
                    warn!("Failed to cache {}: {}", path_and_query, e);
                }
            }
            Ok(into_response(response))
        }
        Err(e) => {
            debug!("Origin unreachable for {}: {}", path_and_query, e);
            let destination = Destination::classify(&parts.headers, parts.uri.path());
            static_fallback(&state.cache, destination).await
        }
    }
}

fn into_response(upstream: UpstreamResponse) -> Response {
    let UpstreamResponse {
        status,
        mut headers,
        body,
    } = upstream;
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_first_paths() {
        assert!(is_network_first("/api/questions"));
        assert!(is_network_first("/auth/user"));
        assert!(!is_network_first("/api"));
        assert!(!is_network_first("/css/main.css"));
        assert!(!is_network_first("/"));
    }
}
