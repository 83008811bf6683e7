//! Match feed fetching.
//!
//! One GET per build, with a hard timeout and no retry. Transport failures
//! and non-2xx answers are errors; a body that is not a usable feed is not
//! (it decodes to an empty payload).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::FeedConfig;
use crate::models::FeedPayload;

/// Errors that can occur while fetching the feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },
}

/// Facts about one fetch, kept for the build manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchInfo {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub content_length: usize,
    /// SHA-256 of the response body
    pub sha256: String,
    /// `sequence`, `wrapped` or `unrecognized`
    pub shape: &'static str,
}

/// A fetched feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub payload: FeedPayload,
    pub info: FetchInfo,
}

impl FeedSnapshot {
    /// Decode a response body. Never fails: bad bodies give an unrecognized payload.
    pub fn from_body(source: impl Into<String>, body: &[u8]) -> Self {
        let payload = FeedPayload::from_slice(body);
        let info = FetchInfo {
            source: source.into(),
            fetched_at: Utc::now(),
            content_length: body.len(),
            sha256: body_hash(body),
            shape: payload.shape(),
        };
        Self { payload, info }
    }
}

fn body_hash(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}

/// Where the build gets its matches from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<FeedSnapshot, FetchError>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// The remote JSON feed over HTTP.
pub struct HttpFeed {
    client: Client,
    url: Url,
}

impl HttpFeed {
    pub fn new(config: &FeedConfig) -> Result<Self, FetchError> {
        let url = config
            .parsed_url()
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("stream-cms/0.1.0")),
        );

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self) -> Result<FeedSnapshot, FetchError> {
        debug!("GET {}", self.url);

        let response = self.client.get(self.url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await?;
        let snapshot = FeedSnapshot::from_body(self.url.as_str(), &body);
        debug!(
            "Feed body: {} bytes, shape {}",
            snapshot.info.content_length, snapshot.info.shape
        );
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Fixed feed body, for tests.
#[cfg(test)]
pub struct StaticFeed {
    body: Option<Vec<u8>>,
}

#[cfg(test)]
impl StaticFeed {
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            body: Some(value.to_string().into_bytes()),
        }
    }

    pub fn raw(body: &str) -> Self {
        Self {
            body: Some(body.as_bytes().to_vec()),
        }
    }

    /// A feed that behaves like an unreachable host.
    pub fn unreachable() -> Self {
        Self { body: None }
    }
}

#[cfg(test)]
#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch(&self) -> Result<FeedSnapshot, FetchError> {
        match &self.body {
            Some(body) => Ok(FeedSnapshot::from_body("static", body)),
            None => Err(FetchError::HttpStatus {
                status: 503,
                message: "Service Unavailable".to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
