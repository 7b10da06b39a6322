/**
 * Remote API Types
 *
 * Request and response bodies of the remote trivia server. Field names
 * follow the server's camelCase JSON. Responses tolerate extra fields so a
 * newer server does not break an older client.
 */
use crate::shared::question::Difficulty;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Header carrying the opaque session token
pub const AUTH_HEADER: &str = "x-auth-token";

/// Header set by the edge on every degraded response
pub const OFFLINE_FALLBACK_HEADER: &str = "x-offline-fallback";

/// `POST /api/check-answer` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerRequest {
    pub question_id: String,
    pub answer: String,
}

/// `POST /api/check-answer` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerResponse {
    pub is_correct: bool,
    /// Only sent for wrong answers
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub xp_gained: u32,
    #[serde(default)]
    pub user_level: Option<u32>,
    #[serde(default)]
    pub user_xp: Option<u64>,
    #[serde(default)]
    pub did_level_up: Option<bool>,
}

/// Progress accumulated while offline, pushed by the sync reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDelta {
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub xp: u64,
}

/// `POST /api/sync-offline-progress` response: server-confirmed totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgressResponse {
    pub questions_answered: u64,
    pub correct_answers: u64,
    pub xp: u64,
    pub level: u32,
    #[serde(default)]
    pub did_level_up: bool,
}

/// Database connectivity as reported by `/api/health`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Connected,
    Disconnected,
    #[serde(other)]
    Unknown,
}

/// `GET /api/health` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub database: DatabaseStatus,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthReport {
    /// Reachable and backed by a connected database
    pub fn is_healthy(&self) -> bool {
        self.database == DatabaseStatus::Connected
    }
}

/// Account snapshot from `GET /auth/user`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub xp: u64,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub questions_answered: u64,
    #[serde(default)]
    pub correct_answers: u64,
    #[serde(default)]
    pub streak: u32,
}

fn default_level() -> u32 {
    1
}

/// `POST /api/activity` body, reported when a quiz finishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    pub kind: String,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub score: u32,
    pub total: u32,
    pub xp: u64,
    pub duration_secs: i64,
    /// Whether any answer in the quiz was graded locally
    pub offline: bool,
    pub completed_at: DateTime<Utc>,
}

/// Body of the edge's 503 answer for API calls it could not forward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineNotice {
    pub offline: bool,
    pub error: String,
    pub message: String,
}

impl OfflineNotice {
    pub fn network_failed() -> Self {
        Self {
            offline: true,
            error: "Network request failed".to_string(),
            message: "You are currently offline. Please try again when your connection is restored."
                .to_string(),
        }
    }
}
