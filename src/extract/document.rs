//! PDF document extractor.
//!
//! Downloads the document bytes and submits them to the configured
//! document-parse endpoint (an external capability); the response is
//! normalized here without any local PDF parsing.

use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::article::filename_from_url;
use super::{dedup_ordered, request_failure, status_failure};
use crate::core::models::{ImageHandle, NormalizedDocument, SourceKind};
use crate::errors::BotError;

#[derive(Debug, Deserialize)]
struct ParsedImage {
    url: String,
    #[serde(default)]
    caption: Option<String>,
}

/// Wire contract of the document-parse capability.
#[derive(Debug, Deserialize)]
struct DocumentParseResponse {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    sections: Vec<String>,
    #[serde(default)]
    images: Vec<ParsedImage>,
    #[serde(default)]
    reference_urls: Vec<String>,
}

pub struct DocumentExtractor {
    http: Client,
    parse_url: Option<String>,
    api_key: Option<String>,
}

impl DocumentExtractor {
    #[must_use]
    pub fn new(http: Client, parse_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            parse_url,
            api_key,
        }
    }

    /// # Errors
    ///
    /// Returns a classified `BotError::Extraction` when the document cannot be
    /// fetched or the parse capability fails.
    pub async fn extract(&self, url: &str) -> Result<NormalizedDocument, BotError> {
        let Some(parse_url) = self.parse_url.as_deref() else {
            return Err(BotError::Extraction {
                message: "document parse endpoint is not configured".to_string(),
                transient: false,
            });
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| request_failure(&e, "document fetch"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_failure(status, "document fetch"));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| request_failure(&e, "document body read"))?;
        info!(url = %url, bytes = bytes.len(), "Fetched document");

        let mut request = self
            .http
            .post(parse_url)
            .header("Content-Type", "application/pdf")
            .body(bytes.to_vec());
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let parse_response = request
            .send()
            .await
            .map_err(|e| request_failure(&e, "document parse"))?;
        let parse_status = parse_response.status();
        if !parse_status.is_success() {
            return Err(status_failure(parse_status, "document parse"));
        }

        let parsed: DocumentParseResponse = parse_response
            .json()
            .await
            .map_err(|e| BotError::Extraction {
                message: format!("document parse response malformed: {e}"),
                transient: false,
            })?;

        if parsed.sections.iter().all(|s| s.trim().is_empty()) {
            return Err(BotError::Extraction {
                message: "document parse returned no text".to_string(),
                transient: false,
            });
        }

        Ok(NormalizedDocument {
            source_kind: SourceKind::Document,
            source_url: url.to_string(),
            title: parsed
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| filename_from_url(url)),
            authors: parsed.authors,
            published_at: parsed.published_date,
            keywords: parsed.keywords,
            body_sections: parsed
                .sections
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .collect(),
            images: parsed
                .images
                .into_iter()
                .map(|img| ImageHandle {
                    filename: filename_from_url(&img.url),
                    url: img.url,
                    caption: img.caption,
                })
                .collect(),
            reference_urls: dedup_ordered(parsed.reference_urls),
        })
    }
}
