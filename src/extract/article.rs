//! HTML article extractor: fetch, strip to text, collect metadata and links.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use tracing::debug;

use super::{dedup_ordered, request_failure, status_failure};
use crate::core::models::{ImageHandle, NormalizedDocument, SourceKind};
use crate::errors::BotError;

const MAX_REFERENCE_URLS: usize = 10;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("static regex compile"));

static META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+(?:property|name)="([^"]+)"[^>]+content="([^"]*)""#)
        .expect("static regex compile")
});

static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="(https?://[^"]+)""#).expect("static regex compile"));

pub struct ArticleExtractor {
    http: Client,
}

impl ArticleExtractor {
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns a classified `BotError::Extraction` when the page cannot be
    /// fetched or yields no readable text.
    pub async fn extract(&self, url: &str) -> Result<NormalizedDocument, BotError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| request_failure(&e, "article fetch"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_failure(status, "article fetch"));
        }

        let html = response
            .text()
            .await
            .map_err(|e| request_failure(&e, "article body read"))?;

        let meta = collect_meta(&html);
        let title = meta
            .get("og:title")
            .cloned()
            .or_else(|| TITLE_RE.captures(&html).map(|c| c[1].trim().to_string()))
            .map(|t| unescape_entities(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| url.to_string());

        let body = html2text::from_read(html.as_bytes(), 80)
            .map_err(|e| BotError::Extraction {
                message: format!("HTML rendering failed: {e}"),
                transient: false,
            })?
            .trim()
            .to_string();
        if body.is_empty() {
            return Err(BotError::Extraction {
                message: "article yielded no readable text".to_string(),
                transient: false,
            });
        }
        debug!(url = %url, chars = body.len(), "Extracted article text");

        let authors = meta
            .get("author")
            .or_else(|| meta.get("article:author"))
            .map(|a| vec![unescape_entities(a)])
            .unwrap_or_default();

        let published_at = meta
            .get("article:published_time")
            .or_else(|| meta.get("og:published_time"))
            .map(|d| d.chars().take(10).collect());

        let keywords = meta
            .get("keywords")
            .map(|k| {
                k.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let images = meta
            .get("og:image")
            .map(|img_url| {
                vec![ImageHandle {
                    url: img_url.clone(),
                    filename: filename_from_url(img_url),
                    caption: None,
                }]
            })
            .unwrap_or_default();

        let reference_urls: Vec<String> = dedup_ordered(
            HREF_RE
                .captures_iter(&html)
                .map(|c| c[1].to_string())
                .filter(|u| u != url)
                .collect(),
        )
        .into_iter()
        .take(MAX_REFERENCE_URLS)
        .collect();

        Ok(NormalizedDocument {
            source_kind: SourceKind::Article,
            source_url: url.to_string(),
            title,
            authors,
            published_at,
            keywords,
            body_sections: split_paragraphs(&body),
            images,
            reference_urls,
        })
    }
}

fn collect_meta(html: &str) -> std::collections::HashMap<String, String> {
    META_RE
        .captures_iter(html)
        .map(|c| (c[1].to_ascii_lowercase(), c[2].to_string()))
        .collect()
}

fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub(crate) fn filename_from_url(url: &str) -> String {
    url.rsplit('/')
        .next()
        .map(|name| name.split(['?', '#']).next().unwrap_or(name))
        .filter(|name| !name.is_empty())
        .unwrap_or("image")
        .to_string()
}

pub(crate) fn unescape_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
