//! Format-specific extractors producing a `NormalizedDocument`.
//!
//! The parsing internals are external capabilities: given bytes or a URL of a
//! declared kind, return a normalized document. Network failures are
//! classified so the orchestration loop can retry the transient ones.

pub mod article;
pub mod document;
pub mod video;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::core::config::AppConfig;
use crate::core::models::{NormalizedDocument, SourceKind};
use crate::errors::BotError;

/// Capability interface: one extractor invocation per run.
#[async_trait]
pub trait ExtractContent: Send + Sync {
    async fn extract(&self, url: &str, kind: SourceKind)
    -> Result<NormalizedDocument, BotError>;
}

/// Dispatches to the format-specific extractor selected by the router.
pub struct ExtractorSet {
    article: article::ArticleExtractor,
    document: document::DocumentExtractor,
    video: video::VideoExtractor,
}

impl ExtractorSet {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            article: article::ArticleExtractor::new(http.clone()),
            document: document::DocumentExtractor::new(
                http.clone(),
                config.document_parse_url.clone(),
                config.document_parse_api_key.clone(),
            ),
            video: video::VideoExtractor::new(http),
        }
    }
}

#[async_trait]
impl ExtractContent for ExtractorSet {
    async fn extract(
        &self,
        url: &str,
        kind: SourceKind,
    ) -> Result<NormalizedDocument, BotError> {
        match kind {
            SourceKind::Article => self.article.extract(url).await,
            SourceKind::Document => self.document.extract(url).await,
            SourceKind::Video => self.video.extract(url).await,
        }
    }
}

/// Timeouts, rate limits and server errors are worth a bounded retry;
/// anything else (404, auth, malformed content) is fatal for the run.
pub(crate) fn status_failure(status: StatusCode, context: &str) -> BotError {
    let transient = status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error();
    BotError::Extraction {
        message: format!("{context} returned status {status}"),
        transient,
    }
}

pub(crate) fn request_failure(error: &reqwest::Error, context: &str) -> BotError {
    BotError::Extraction {
        message: format!("{context} request failed: {error}"),
        transient: true,
    }
}

/// Ordered dedup preserving first occurrence.
pub(crate) fn dedup_ordered(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}
