//! # Offline Fallbacks
//!
//! Responses the edge builds when the origin cannot be reached.
//!
//! API calls get JSON: `/api/questions` is answered from the bundled question
//! set (correct answers stripped), anything else gets an offline notice with
//! status 503. Static requests get a fallback picked by destination:
//!
//! | Destination | Fallback                          |
//! |-------------|-----------------------------------|
//! | document    | cached `/`                        |
//! | image       | cached placeholder image          |
//! | style       | empty stylesheet                  |
//! | script      | no-op script                      |
//! | other       | plain-text offline message, 503   |
//!
//! Every fallback carries `x-offline-fallback: 1`.

use super::asset_cache::{AssetCache, CachedAsset};
use super::config::IMAGE_PLACEHOLDER;
use super::error::EdgeError;
use crate::client::questions::{bundled_snapshot, select_questions};
use crate::shared::api_types::{OfflineNotice, OFFLINE_FALLBACK_HEADER};
use crate::shared::question::{Difficulty, Question};
use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{debug, warn};

pub const OFFLINE_MESSAGE: &str =
    "You are currently offline. Please try again when your connection is restored.";
const OFFLINE_STYLESHEET: &str = "/* Offline stylesheet */";
const OFFLINE_SCRIPT: &str = "console.log(\"Offline script\");";
const OFFLINE_CONTENT: &str = "Offline content not available";
const DEFAULT_FALLBACK_LIMIT: usize = 10;

/// What kind of resource a request is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Image,
    Style,
    Script,
    Other,
}

impl Destination {
    /// Classify from `Sec-Fetch-*`/`Accept` headers, then the file extension
    pub fn classify(headers: &HeaderMap, path: &str) -> Self {
        let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        match header_str("sec-fetch-dest") {
            Some("document") => return Destination::Document,
            Some("image") => return Destination::Image,
            Some("style") => return Destination::Style,
            Some("script") => return Destination::Script,
            _ => {}
        }
        if header_str("sec-fetch-mode") == Some("navigate") {
            return Destination::Document;
        }

        let extension = path
            .rsplit('/')
            .next()
            .and_then(|file| file.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico") => Destination::Image,
            Some("css") => Destination::Style,
            Some("js" | "mjs") => Destination::Script,
            Some("html" | "htm") => Destination::Document,
            Some(_) => Destination::Other,
            None if accepts_html(headers) => Destination::Document,
            None => Destination::Other,
        }
    }
}

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Whether the caller expects JSON back
pub fn wants_json(headers: &HeaderMap, path: &str) -> bool {
    if path.starts_with("/api/") {
        return true;
    }
    let header_has = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"))
    };
    header_has(header::ACCEPT) || header_has(header::CONTENT_TYPE)
}

#[derive(Debug, Default, Deserialize)]
struct QuestionQuery {
    difficulty: Option<String>,
    category: Option<String>,
    limit: Option<usize>,
}

/// Fallback for an unreachable `/api/` or `/auth/` request
pub fn api_fallback(uri: &Uri, headers: &HeaderMap) -> Response {
    if uri.path() == "/api/questions" {
        let questions = offline_questions(uri);
        debug!("Serving {} bundled question(s) for {}", questions.len(), uri);
        return mark_fallback((StatusCode::OK, Json(questions)).into_response());
    }

    let response = if wants_json(headers, uri.path()) {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(OfflineNotice::network_failed()),
        )
            .into_response()
    } else {
        plain(StatusCode::SERVICE_UNAVAILABLE, OFFLINE_MESSAGE)
    };
    mark_fallback(response)
}

/// Bundled questions for the tier named in the query, answers stripped.
/// Unknown or missing tiers fall back to Beginner.
fn offline_questions(uri: &Uri) -> Vec<Question> {
    let query = Query::<QuestionQuery>::try_from_uri(uri)
        .map(|Query(query)| query)
        .unwrap_or_else(|e| {
            warn!("Unreadable question query {:?}: {}", uri.query(), e);
            QuestionQuery::default()
        });

    let difficulty = query
        .difficulty
        .as_deref()
        .and_then(|raw| raw.parse::<Difficulty>().ok())
        .unwrap_or(Difficulty::Beginner);
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let limit = query.limit.unwrap_or(DEFAULT_FALLBACK_LIMIT);

    select_questions(
        &bundled_snapshot(),
        difficulty,
        category,
        limit,
        &mut rand::thread_rng(),
    )
    .iter()
    .map(Question::without_answer)
    .collect()
}

/// Fallback for an unreachable, uncached static request
pub async fn static_fallback(
    cache: &AssetCache,
    destination: Destination,
) -> Result<Response, EdgeError> {
    let response = match destination {
        Destination::Document => cached_or_unavailable(cache.match_path("/").await?),
        Destination::Image => cached_or_unavailable(cache.match_path(IMAGE_PLACEHOLDER).await?),
        Destination::Style => with_content_type(OFFLINE_STYLESHEET, "text/css"),
        Destination::Script => with_content_type(OFFLINE_SCRIPT, "application/javascript"),
        Destination::Other => plain(StatusCode::SERVICE_UNAVAILABLE, OFFLINE_CONTENT),
    };
    Ok(mark_fallback(response))
}

fn cached_or_unavailable(asset: Option<CachedAsset>) -> Response {
    match asset {
        Some(asset) => asset_response(asset),
        None => plain(StatusCode::SERVICE_UNAVAILABLE, OFFLINE_CONTENT),
    }
}

/// Turn a cached asset back into a response
pub fn asset_response(asset: CachedAsset) -> Response {
    let status = StatusCode::from_u16(asset.status).unwrap_or(StatusCode::OK);
    let mut response = Response::new(Body::from(asset.body));
    *response.status_mut() = status;
    if let Some(value) = asset
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

fn with_content_type(body: &'static str, content_type: &'static str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        body,
    )
        .into_response()
}

fn plain(status: StatusCode, body: &'static str) -> Response {
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

fn mark_fallback(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(OFFLINE_FALLBACK_HEADER, HeaderValue::from_static("1"));
    response
}
