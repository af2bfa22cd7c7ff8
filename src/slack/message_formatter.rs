//! Renders a structured summary into one Slack mrkdwn message.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::models::{NormalizedDocument, SourceKind, Summary};

const MAX_AUTHORS: usize = 3;

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("static regex compile"));

/// Build the delivered message: a headline line linking the source, the
/// summary opening and sections, and a trailing deduped reference block.
#[must_use]
pub fn format_summary_message(document: &NormalizedDocument, summary: &Summary) -> String {
    let title_link = format!("<{}|{}>", document.source_url, document.title);

    let mut prefix_parts: Vec<String> = Vec::new();
    if let Some(date) = document.published_at.as_deref().filter(|d| !d.is_empty()) {
        prefix_parts.push(format!("{date}에"));
    }
    if let Some(authors) = author_line(document) {
        prefix_parts.push(format!("{authors}에서"));
    }

    let mut message = if prefix_parts.is_empty() {
        format!("🗞️ {title_link}의 요약입니다.")
    } else {
        format!("🗞️ {} 발행한 {title_link}의 요약입니다.", prefix_parts.join(" "))
    };

    if !summary.opening.trim().is_empty() {
        message.push_str("\n\n");
        message.push_str(summary.opening.trim());
    }

    for section in &summary.sections {
        if section.body.trim().is_empty() {
            continue;
        }
        // Slack mrkdwn uses single asterisks for bold.
        let body = BOLD_RE.replace_all(section.body.trim(), "*$1*");
        message.push_str(&format!("\n\n*{}*\n{}", section.heading, body));
    }

    let references = dedup_references(&summary.references);
    if !references.is_empty() {
        message.push_str("\n\n📎 *참고 링크*");
        for url in references {
            message.push_str(&format!("\n- <{url}>"));
        }
    }

    message.trim().to_string()
}

fn author_line(document: &NormalizedDocument) -> Option<String> {
    if document.authors.is_empty() {
        return None;
    }
    let joined = document
        .authors
        .iter()
        .take(MAX_AUTHORS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    // A video's single author is its channel.
    if document.source_kind == SourceKind::Video {
        Some(format!("{joined} 채널"))
    } else {
        Some(joined)
    }
}

fn dedup_references(urls: &[String]) -> Vec<&String> {
    let mut seen = std::collections::HashSet::new();
    urls.iter()
        .filter(|u| !u.trim().is_empty() && seen.insert(u.as_str()))
        .collect()
}
