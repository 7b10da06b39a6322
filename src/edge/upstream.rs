//! Forwarding to the origin server

use axum::http::{header, HeaderMap, Method, StatusCode};
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Headers that describe one hop and must not be copied across
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "host",
    "content-length",
    "transfer-encoding",
    "upgrade",
    "te",
    "trailer",
    "proxy-authorization",
    "keep-alive",
];

/// A fully buffered origin response
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// HTTP client bound to the origin
#[derive(Debug, Clone)]
pub struct Upstream {
    http: Client,
    base_url: String,
}

pub(crate) fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

impl Upstream {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward a request. Errors mean the origin could not be reached;
    /// HTTP error statuses come back as `Ok`.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        mut headers: HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamResponse, reqwest::Error> {
        strip_hop_by_hop(&mut headers);
        // Cached bodies are stored without content-encoding
        headers.remove(header::ACCEPT_ENCODING);
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!("Forwarding {} {}", method, url);

        let response = self
            .http
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);
        let body = response.bytes().await?;
        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }

    pub async fn get(&self, path: &str) -> Result<UpstreamResponse, reqwest::Error> {
        self.forward(Method::GET, path, HeaderMap::new(), Bytes::new())
            .await
    }
}
