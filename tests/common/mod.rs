//! Common test utilities and helpers
//!
//! - Fully wired clients against a `wiremock` origin
//! - Question fixtures in the server's JSON shape
//! - Mock helpers for the endpoints most tests need

use serde_json::{json, Value};
use trivia_offline::client::config::Config;
use trivia_offline::client::local_store::LocalStore;
use trivia_offline::client::TriviaClient;
use trivia_offline::shared::AppConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client with an in-memory store, talking to `server`
pub async fn client_for(server: &MockServer) -> TriviaClient {
    let config = Config::with_builder(AppConfig::builder().server_url(server.uri()))
        .expect("valid test config");
    let store = LocalStore::in_memory().await.expect("in-memory store");
    TriviaClient::with_store(config, store)
        .await
        .expect("client assembles")
}

/// A Medium question as `/api/offline-questions` serves it
pub fn medium_question(n: usize) -> Value {
    json!({
        "_id": format!("m{}", n),
        "text": format!("Medium question {}", n),
        "answers": [format!("right {}", n), "wrong a", "wrong b", "wrong c"],
        "correctAnswer": format!("right {}", n),
        "difficulty": "Medium",
        "category": "Quests",
        "explanation": format!("Because {}.", n)
    })
}

/// The same question as the public endpoint serves it
pub fn public_copy(question: &Value) -> Value {
    let mut question = question.clone();
    if let Some(object) = question.as_object_mut() {
        object.remove("correctAnswer");
    }
    question
}

pub async fn mount_user(server: &MockServer, xp: u64, level: u32) {
    Mock::given(method("GET"))
        .and(path("/auth/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "zezima", "xp": xp, "level": level
        })))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, verb: &str, route: &str, status: u16) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
