//! # Local Question Cache
//!
//! Fallback questions per difficulty tier for play without the server.
//!
//! ## Sources
//!
//! 1. The snapshot persisted by the last [`QuestionCache::refresh_snapshot`].
//! 2. The bundled default set, used when no snapshot exists or the stored
//!    one cannot be decoded.
//!
//! Every cached question carries its correct answer. Refresh goes through
//! the authenticated offline-questions endpoint, which is allowed to return
//! answers; questions that arrive without one are dropped rather than
//! guessed.

pub mod shuffle;

pub use shuffle::shuffle;

use crate::client::api::{ApiClient, ApiError};
use crate::client::local_store::{keys, LocalStore, StoreError};
use crate::shared::question::{parse_snapshot, Difficulty, Question, QuestionSnapshot};
use futures_util::future::join_all;
use rand::Rng;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

const BUNDLED_QUESTIONS: &str = include_str!("defaults.json");

/// Errors raised while refreshing the snapshot
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("snapshot refresh failed: {0}")]
    Api(#[from] ApiError),

    #[error("failed to persist snapshot: {0}")]
    Store(#[from] StoreError),
}

/// Where the questions currently served came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Bundled,
    Refreshed,
}

/// Outcome of a snapshot refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Tiers replaced with fresh questions
    pub updated: Vec<Difficulty>,
    /// Tiers kept as they were (fetch failed or nothing gradable came back)
    pub kept: Vec<Difficulty>,
}

impl RefreshSummary {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty()
    }
}

#[derive(Debug)]
struct CachedQuestions {
    questions: QuestionSnapshot,
    source: SnapshotSource,
}

/// The bundled default set, grouped by tier
pub fn bundled_snapshot() -> QuestionSnapshot {
    parse_snapshot(BUNDLED_QUESTIONS).unwrap_or_else(|e| {
        error!("Bundled question set is invalid: {}", e);
        QuestionSnapshot::new()
    })
}

/// Filter by tier (and category, if given), shuffle, truncate to `count`.
///
/// An empty result is returned as-is; callers surface it to the player.
pub fn select_questions<R: Rng + ?Sized>(
    snapshot: &QuestionSnapshot,
    difficulty: Difficulty,
    category: Option<&str>,
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut matching: Vec<Question> = snapshot
        .get(&difficulty)
        .into_iter()
        .flatten()
        .filter(|q| q.difficulty == difficulty)
        .filter(|q| category.map_or(true, |c| q.category == c))
        .cloned()
        .collect();

    shuffle(&mut matching, rng);
    matching.truncate(count);
    matching
}

/// Local question cache backed by the local store
#[derive(Debug)]
pub struct QuestionCache {
    store: LocalStore,
    state: RwLock<CachedQuestions>,
}

impl QuestionCache {
    /// Load the persisted snapshot, falling back to the bundled set
    pub async fn load(store: LocalStore) -> Self {
        let cached = match store.get::<QuestionSnapshot>(keys::QUESTION_SNAPSHOT).await {
            Ok(Some(stored)) if !stored.value.is_empty() => {
                debug!("Loaded question snapshot (version {})", stored.version);
                CachedQuestions {
                    questions: stored.value,
                    source: SnapshotSource::Refreshed,
                }
            }
            Ok(_) => CachedQuestions {
                questions: bundled_snapshot(),
                source: SnapshotSource::Bundled,
            },
            Err(e) => {
                warn!("Stored question snapshot unusable, using bundled set: {}", e);
                CachedQuestions {
                    questions: bundled_snapshot(),
                    source: SnapshotSource::Bundled,
                }
            }
        };

        Self {
            store,
            state: RwLock::new(cached),
        }
    }

    pub async fn source(&self) -> SnapshotSource {
        self.state.read().await.source
    }

    /// Random selection of up to `count` questions; an empty category means
    /// "any category"
    pub async fn get_questions(
        &self,
        difficulty: Difficulty,
        category: Option<&str>,
        count: usize,
    ) -> Vec<Question> {
        let category = category.filter(|c| !c.is_empty());
        let state = self.state.read().await;
        select_questions(
            &state.questions,
            difficulty,
            category,
            count,
            &mut rand::thread_rng(),
        )
    }

    /// Cached copy of a question by id
    pub async fn find(&self, id: &str) -> Option<Question> {
        let state = self.state.read().await;
        state
            .questions
            .values()
            .flatten()
            .find(|q| q.id == id)
            .cloned()
    }

    /// Replace tiers with a fresh authenticated sample of `per_tier`
    /// questions each.
    ///
    /// A tier is only replaced when at least one question with a correct
    /// answer came back. An unauthorized response aborts the refresh; other
    /// per-tier failures keep that tier and continue.
    pub async fn refresh_snapshot(
        &self,
        api: &ApiClient,
        token: &str,
        per_tier: usize,
    ) -> Result<RefreshSummary, CacheError> {
        let mut summary = RefreshSummary::default();
        let mut fresh = QuestionSnapshot::new();

        let responses = join_all(
            Difficulty::ALL
                .into_iter()
                .map(|tier| api.fetch_offline_questions(token, tier, per_tier)),
        )
        .await;

        for (tier, response) in Difficulty::ALL.into_iter().zip(responses) {
            match response {
                Ok(questions) => {
                    let fetched = questions.len();
                    let gradable: Vec<Question> = questions
                        .into_iter()
                        .filter(|q| q.difficulty == tier && q.is_gradable_offline())
                        .take(per_tier)
                        .collect();
                    if gradable.len() < fetched {
                        warn!(
                            "Dropped {} {} question(s) without a correct answer",
                            fetched - gradable.len(),
                            tier
                        );
                    }
                    if gradable.is_empty() {
                        summary.kept.push(tier);
                    } else {
                        fresh.insert(tier, gradable);
                        summary.updated.push(tier);
                    }
                }
                Err(e @ ApiError::Unauthorized(_)) => return Err(e.into()),
                Err(e) => {
                    debug!("Could not refresh {} questions: {}", tier, e);
                    summary.kept.push(tier);
                }
            }
        }

        if summary.is_empty() {
            return Ok(summary);
        }

        let mut state = self.state.write().await;
        let mut merged = state.questions.clone();
        merged.extend(fresh);
        self.store.put(keys::QUESTION_SNAPSHOT, &merged).await?;
        state.questions = merged;
        state.source = SnapshotSource::Refreshed;

        info!("Question snapshot refreshed for {} tier(s)", summary.updated.len());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_bundled_covers_every_tier() {
        let bundled = bundled_snapshot();
        for tier in Difficulty::ALL {
            let questions = bundled.get(&tier).expect("tier missing");
            assert!(!questions.is_empty());
            assert!(questions.iter().all(|q| q.is_gradable_offline()));
            assert!(questions.iter().all(|q| q.explanation.is_some()));
        }
    }

    #[test]
    fn test_select_filters_and_truncates() {
        let bundled = bundled_snapshot();
        let mut rng = StdRng::seed_from_u64(3);

        let beginner = select_questions(&bundled, Difficulty::Beginner, None, 3, &mut rng);
        assert_eq!(beginner.len(), 3);
        assert!(beginner.iter().all(|q| q.difficulty == Difficulty::Beginner));

        let skills =
            select_questions(&bundled, Difficulty::Beginner, Some("Skills"), 10, &mut rng);
        assert_eq!(skills.len(), 2);
        assert!(skills.iter().all(|q| q.category == "Skills"));
    }

    #[test]
    fn test_select_empty_when_nothing_matches() {
        let bundled = bundled_snapshot();
        let mut rng = StdRng::seed_from_u64(3);
        let none = select_questions(&bundled, Difficulty::Master, Some("Quests"), 5, &mut rng);
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_load_falls_back_to_bundled_on_corrupt_snapshot() {
        let store = LocalStore::in_memory().await.unwrap();
        store
            .put(keys::QUESTION_SNAPSHOT, &json!({"Hard": "not a list"}))
            .await
            .unwrap();

        let cache = QuestionCache::load(store).await;
        assert_eq!(cache.source().await, SnapshotSource::Bundled);
        assert!(!cache.get_questions(Difficulty::Hard, None, 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_category_means_any() {
        let cache = QuestionCache::load(LocalStore::in_memory().await.unwrap()).await;
        let any = cache.get_questions(Difficulty::Medium, Some(""), 10).await;
        assert_eq!(any.len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let cache = QuestionCache::load(LocalStore::in_memory().await.unwrap()).await;
        let found = cache.find("local10").await.unwrap();
        assert_eq!(found.correct_answer.as_deref(), Some("Blisterwood weapons"));
        assert!(cache.find("missing").await.is_none());
    }

    fn offline_question(id: &str, difficulty: &str, correct: Option<&str>) -> serde_json::Value {
        let mut q = json!({
            "_id": id,
            "text": format!("Question {}", id),
            "answers": ["A", "B", "C", "D"],
            "difficulty": difficulty,
            "category": "Skills",
        });
        if let Some(correct) = correct {
            q["correctAnswer"] = json!(correct);
        }
        q
    }

    #[tokio::test]
    async fn test_refresh_keeps_only_gradable_questions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/offline-questions"))
            .and(query_param("difficulty", "Hard"))
            .and(header("x-auth-token", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                offline_question("h1", "Hard", Some("C")),
                offline_question("h2", "Hard", None),
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/offline-questions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = LocalStore::in_memory().await.unwrap();
        let cache = QuestionCache::load(store.clone()).await;
        let api = ApiClient::with_timeout(server.uri(), Duration::from_secs(5)).unwrap();

        let summary = cache.refresh_snapshot(&api, "tok", 5).await.unwrap();
        assert_eq!(summary.updated, vec![Difficulty::Hard]);
        assert_eq!(summary.kept.len(), 5);

        let hard = cache.get_questions(Difficulty::Hard, None, 5).await;
        assert_eq!(hard.len(), 1);
        assert_eq!(hard[0].correct_answer.as_deref(), Some("C"));
        // Other tiers still served from the bundled set
        assert!(!cache.get_questions(Difficulty::Easy, None, 5).await.is_empty());

        // Persisted: a fresh load sees the refreshed tier
        let reloaded = QuestionCache::load(store).await;
        assert_eq!(reloaded.source().await, SnapshotSource::Refreshed);
        assert!(reloaded.find("h1").await.is_some());
    }

    #[tokio::test]
    async fn test_refresh_aborts_on_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/offline-questions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Token is not valid"))
            .mount(&server)
            .await;

        let cache = QuestionCache::load(LocalStore::in_memory().await.unwrap()).await;
        let api = ApiClient::with_timeout(server.uri(), Duration::from_secs(5)).unwrap();
        let result = cache.refresh_snapshot(&api, "expired", 5).await;
        assert_matches!(result, Err(CacheError::Api(ApiError::Unauthorized(_))));
        assert_eq!(cache.source().await, SnapshotSource::Bundled);
    }
}
