//! YouTube video extractor: oEmbed metadata plus the timedtext transcript.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::article::{filename_from_url, unescape_entities};
use super::{request_failure, status_failure};
use crate::core::models::{ImageHandle, NormalizedDocument, SourceKind};
use crate::errors::BotError;

const TRANSCRIPT_LANGUAGES: &[&str] = &["en", "ko"];

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex compile"));

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: String,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
}

pub struct VideoExtractor {
    http: Client,
}

impl VideoExtractor {
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns a classified `BotError::Extraction` when the video id cannot be
    /// derived, metadata is unavailable, or no transcript exists.
    pub async fn extract(&self, url: &str) -> Result<NormalizedDocument, BotError> {
        let id = video_id(url).ok_or_else(|| BotError::Extraction {
            message: format!("could not derive a video id from '{url}'"),
            transient: false,
        })?;

        let oembed = self.fetch_oembed(url).await?;
        let transcript = self.fetch_transcript(&id).await?;

        let images = oembed
            .thumbnail_url
            .map(|thumb| {
                vec![ImageHandle {
                    filename: filename_from_url(&thumb),
                    url: thumb,
                    caption: None,
                }]
            })
            .unwrap_or_default();

        Ok(NormalizedDocument {
            source_kind: SourceKind::Video,
            source_url: url.to_string(),
            title: oembed.title,
            authors: oembed.author_name.map(|a| vec![a]).unwrap_or_default(),
            published_at: None,
            keywords: Vec::new(),
            body_sections: vec![transcript],
            images,
            reference_urls: Vec::new(),
        })
    }

    async fn fetch_oembed(&self, url: &str) -> Result<OEmbedResponse, BotError> {
        let response = self
            .http
            .get("https://www.youtube.com/oembed")
            .query(&[("url", url), ("format", "json")])
            .send()
            .await
            .map_err(|e| request_failure(&e, "video oembed"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_failure(status, "video oembed"));
        }
        response.json().await.map_err(|e| BotError::Extraction {
            message: format!("video oembed response malformed: {e}"),
            transient: false,
        })
    }

    async fn fetch_transcript(&self, video_id: &str) -> Result<String, BotError> {
        for lang in TRANSCRIPT_LANGUAGES {
            let response = self
                .http
                .get("https://video.google.com/timedtext")
                .query(&[("lang", *lang), ("v", video_id)])
                .send()
                .await
                .map_err(|e| request_failure(&e, "video transcript"))?;
            let status = response.status();
            if !status.is_success() {
                return Err(status_failure(status, "video transcript"));
            }

            let xml = response
                .text()
                .await
                .map_err(|e| request_failure(&e, "video transcript read"))?;
            let text = normalize_transcript(&xml);
            if !text.is_empty() {
                return Ok(text);
            }
        }

        Err(BotError::Extraction {
            message: format!("no transcript available for video '{video_id}'"),
            transient: false,
        })
    }
}

/// Pull the watch id out of the URL shapes YouTube uses.
#[must_use]
pub fn video_id(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();

    if host == "youtu.be" || host.ends_with(".youtu.be") {
        return url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);
    }

    if let Some(id) = url
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
    {
        return Some(id);
    }

    let segments: Vec<&str> = url.path_segments().map(Iterator::collect).unwrap_or_default();
    match segments.as_slice() {
        ["shorts" | "embed" | "live", id, ..] if !id.is_empty() => Some((*id).to_string()),
        _ => None,
    }
}

fn normalize_transcript(xml: &str) -> String {
    let stripped = TAG_RE.replace_all(xml, " ");
    let unescaped = unescape_entities(&stripped).replace("&#10;", " ");
    unescaped.split_whitespace().collect::<Vec<_>>().join(" ")
}
