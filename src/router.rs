//! Pure URL classification into a source kind.
//!
//! File-extension matches for document formats take precedence, then known
//! video-hosting domains, and everything else falls back to article/HTML.
//! The router performs no network I/O; an unreachable URL is an error
//! surfaced by the extractor, not here.

use url::Url;

use crate::core::models::SourceKind;

const DOCUMENT_EXTENSIONS: &[&str] = &[".pdf"];

const VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be"];

#[must_use]
pub fn classify(raw_url: &str) -> SourceKind {
    let Ok(url) = Url::parse(raw_url) else {
        return SourceKind::Article;
    };

    let path = url.path().to_ascii_lowercase();
    if DOCUMENT_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return SourceKind::Document;
    }

    if let Some(host) = url.host_str() {
        let host = host.to_ascii_lowercase();
        let is_video_host = VIDEO_HOSTS
            .iter()
            .any(|v| host == *v || host.ends_with(&format!(".{v}")));
        if is_video_host {
            return SourceKind::Video;
        }
    }

    SourceKind::Article
}
