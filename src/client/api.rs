/**
 * Remote API Client
 *
 * HTTP client for the remote trivia server. Every call is a suspension
 * point; none of them retry. Callers decide whether a failure means "fall
 * back to the local path" (see `ApiError::is_connectivity`).
 */
use crate::client::config::Config;
use crate::shared::api_types::{
    ActivityReport, CheckAnswerRequest, CheckAnswerResponse, HealthReport, ProgressDelta,
    SyncProgressResponse, UserAccount, AUTH_HEADER, OFFLINE_FALLBACK_HEADER,
};
use crate::shared::question::{Difficulty, Question};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`ApiClient`]
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, reset, ...
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    /// Missing, invalid or expired session token
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(String),

    /// A caching edge answered in place of an unreachable origin
    #[error("degraded response from the offline edge (status {0})")]
    OfflineFallback(u16),
}

impl ApiError {
    /// Whether the failure says "the server is unreachable" rather than
    /// "the server answered and refused"
    pub fn is_connectivity(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout | ApiError::OfflineFallback(_) => true,
            ApiError::Status { status, .. } => *status == 502 || *status == 503 || *status == 504,
            ApiError::Unauthorized(_) | ApiError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err)
        }
    }
}

/// Client for the remote trivia REST contract
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from configuration (base URL and request timeout)
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Self::with_timeout(config.server_url(), config.request_timeout())
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => builder.header(AUTH_HEADER, token),
            None => builder,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = Self::check_status(response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if response.headers().contains_key(OFFLINE_FALLBACK_HEADER) {
            return Err(ApiError::OfflineFallback(status.as_u16()));
        }
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized(message));
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// `GET /api/health` with its own (short) timeout
    pub async fn health(&self, timeout: Duration) -> Result<HealthReport, ApiError> {
        let response = self
            .http
            .get(self.url("/api/health"))
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `GET /api/questions` - public questions, correct answers stripped
    pub async fn fetch_questions(
        &self,
        difficulty: Difficulty,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Question>, ApiError> {
        let mut query = vec![
            ("difficulty", difficulty.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(category) = category {
            query.push(("category", category.to_string()));
        }
        let response = self
            .http
            .get(self.url("/api/questions"))
            .query(&query)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `GET /api/offline-questions` - authenticated pack that includes
    /// correct answers for offline grading
    pub async fn fetch_offline_questions(
        &self,
        token: &str,
        difficulty: Difficulty,
        limit: usize,
    ) -> Result<Vec<Question>, ApiError> {
        let request = self
            .http
            .get(self.url("/api/offline-questions"))
            .query(&[("difficulty", difficulty.as_str().to_string()), ("limit", limit.to_string())]);
        let response = Self::authorized(request, Some(token)).send().await?;
        Self::decode(response).await
    }

    /// `POST /api/check-answer`
    pub async fn check_answer(
        &self,
        token: Option<&str>,
        request: &CheckAnswerRequest,
    ) -> Result<CheckAnswerResponse, ApiError> {
        let builder = self.http.post(self.url("/api/check-answer")).json(request);
        let response = Self::authorized(builder, token).send().await?;
        Self::decode(response).await
    }

    /// `POST /api/sync-offline-progress`
    pub async fn sync_offline_progress(
        &self,
        token: &str,
        delta: &ProgressDelta,
    ) -> Result<SyncProgressResponse, ApiError> {
        let builder = self
            .http
            .post(self.url("/api/sync-offline-progress"))
            .json(delta);
        let response = Self::authorized(builder, Some(token)).send().await?;
        Self::decode(response).await
    }

    /// `GET /auth/user`
    pub async fn current_user(&self, token: &str) -> Result<UserAccount, ApiError> {
        let builder = self.http.get(self.url("/auth/user"));
        let response = Self::authorized(builder, Some(token)).send().await?;
        Self::decode(response).await
    }

    /// `POST /api/activity` - best effort, body of the response is ignored
    pub async fn report_activity(
        &self,
        token: &str,
        report: &ActivityReport,
    ) -> Result<(), ApiError> {
        let builder = self.http.post(self.url("/api/activity")).json(report);
        let response = Self::authorized(builder, Some(token)).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }
}
