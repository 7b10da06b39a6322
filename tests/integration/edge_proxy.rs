//! Edge routing against a live and an unreachable origin
#![cfg(feature = "edge")]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use std::time::Duration;
use tower::ServiceExt;
use trivia_offline::edge::asset_cache::{AssetCache, CachedAsset};
use trivia_offline::edge::router::create_router;
use trivia_offline::edge::state::EdgeState;
use trivia_offline::edge::upstream::Upstream;
use trivia_offline::edge::{create_app, EdgeConfig};
use trivia_offline::shared::api_types::{OfflineNotice, OFFLINE_FALLBACK_HEADER};
use trivia_offline::shared::{Difficulty, Question};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Nothing listens on the discard port
const UNREACHABLE: &str = "http://127.0.0.1:9";

async fn edge(origin: &str) -> (Router, AssetCache) {
    let upstream = Upstream::new(origin, Duration::from_secs(2)).unwrap();
    let cache = AssetCache::in_memory("test-v1").await.unwrap();
    (create_router(EdgeState::new(upstream, cache.clone())), cache)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn static_assets_are_cache_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/css/main.css"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/css")
                .set_body_string("body { color: gold; }"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (app, _) = edge(&server.uri()).await;
    for _ in 0..2 {
        let (status, headers, body) = send(&app, get("/css/main.css")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/css");
        assert_eq!(&body[..], b"body { color: gold; }");
        assert!(headers.get(OFFLINE_FALLBACK_HEADER).is_none());
    }
}

#[tokio::test]
async fn api_errors_pass_through_uncached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/leaderboard"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .expect(2)
        .mount(&server)
        .await;

    let (app, _) = edge(&server.uri()).await;
    for _ in 0..2 {
        let (status, headers, body) = send(&app, get("/api/leaderboard")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(&body[..], b"nope");
        assert!(headers.get(OFFLINE_FALLBACK_HEADER).is_none());
    }
}

#[tokio::test]
async fn unreachable_question_endpoint_serves_bundled_tier() {
    let (app, _) = edge(UNREACHABLE).await;

    let (status, headers, body) =
        send(&app, get("/api/questions?difficulty=Hard&limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[OFFLINE_FALLBACK_HEADER], "1");

    let questions: Vec<Question> = serde_json::from_slice(&body).unwrap();
    assert!(!questions.is_empty());
    assert!(questions.iter().all(|q| q.difficulty == Difficulty::Hard));
    assert!(questions.iter().all(|q| q.correct_answer.is_none()));
}

#[tokio::test]
async fn unreachable_api_answers_with_offline_notice() {
    let (app, _) = edge(UNREACHABLE).await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/check-answer")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"questionId":"local1","answer":"30"}"#))
        .unwrap();

    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(headers[OFFLINE_FALLBACK_HEADER], "1");
    let notice: OfflineNotice = serde_json::from_slice(&body).unwrap();
    assert!(notice.offline);
}

#[tokio::test]
async fn unreachable_navigation_serves_cached_home() {
    let (app, cache) = edge(UNREACHABLE).await;
    cache
        .put(&CachedAsset {
            path: "/".to_string(),
            status: 200,
            content_type: Some("text/html".to_string()),
            body: Bytes::from_static(b"<h1>Trivia</h1>"),
        })
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/leaderboard")
        .header("sec-fetch-mode", "navigate")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[OFFLINE_FALLBACK_HEADER], "1");
    assert_eq!(&body[..], b"<h1>Trivia</h1>");

    let (status, _, body) = send(&app, get("/js/game.js")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], br#"console.log("Offline script");"#);

    let (status, _, _) = send(&app, get("/fonts/runescape.woff2")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn create_app_precaches_configured_assets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<h1>Home</h1>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = EdgeConfig::new(server.uri());
    config.precache = vec!["/".to_string()];
    let app = create_app(&config).await.unwrap();

    // Served from the install-time copy; the origin sees only the precache fetch
    let (status, _, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"<h1>Home</h1>");
}

#[tokio::test]
async fn failed_install_does_not_block_startup() {
    let mut config = EdgeConfig::new(UNREACHABLE);
    config.precache = vec!["/".to_string(), "/css/main.css".to_string()];
    let app = create_app(&config).await.unwrap();

    let (status, _, body) = send(&app, get("/css/main.css")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"/* Offline stylesheet */");
}
