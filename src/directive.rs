//! Directive parsing for app-mention text.
//!
//! Mentions arrive as free-form text in mixed languages, e.g.
//! `"<@U123> https://example.com/a 회사 채널에도 보내줘"`. Parsing is pure:
//! locate the first well-formed URL, then scan the remaining text for the
//! business-destination and opening-override keyword families. Unmatched
//! directive text is ignored; only the URL is mandatory.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::models::{DestinationScope, Directive};
use crate::errors::BotError;

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@[A-Z0-9]+(?:\|[^>]*)?>").expect("static regex compile"));

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>|]+").expect("static regex compile"));

// Phrase followed by a particle and 시작 ("start"), e.g. "AWS 신기능이네요로 시작해줘".
static OPENING_KO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(.+?)\s*(?:으로|이?라고|로|부터)\s*시작").expect("static regex compile")
});

static OPENING_EN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)start\s+with\s+["“']?(.+?)["”']?\s*$"#).expect("static regex compile")
});

/// Keyword family requesting delivery to business channels in addition to
/// the personal ones.
const BUSINESS_KEYWORDS: &[&str] = &[
    "비즈니스 채널",
    "업무 채널",
    "회사 채널",
    "전체 채널",
    "business channel",
    "work channel",
];

/// Parse a `Directive` out of raw mention text.
///
/// # Errors
///
/// Returns `BotError::MissingUrl` when no well-formed URL is present.
pub fn parse_directive(raw_text: &str) -> Result<Directive, BotError> {
    let text = MENTION_RE.replace_all(raw_text, " ");

    let url_match = URL_RE.find(&text).ok_or(BotError::MissingUrl)?;
    let target_url = trim_trailing_punctuation(url_match.as_str()).to_string();

    let remainder = remove_url_span(&text, url_match.start(), url_match.end());

    // The two keyword extractions are independent and order-insensitive.
    let destination_scope = parse_destination_scope(&remainder);
    let opening_override = parse_opening_override(&remainder);

    Ok(Directive {
        target_url,
        destination_scope,
        opening_override,
    })
}

/// Strip sentence punctuation stuck to the end of a pasted URL. A trailing
/// `)` is only stripped while it is unbalanced, so URLs whose path itself
/// contains parentheses (e.g. `/Rust_(programming_language)`) survive intact.
fn trim_trailing_punctuation(raw: &str) -> &str {
    let mut url = raw;
    loop {
        match url.chars().last() {
            Some('.' | ',' | ';') => url = &url[..url.len() - 1],
            Some(')') if url.matches('(').count() < url.matches(')').count() => {
                url = &url[..url.len() - 1];
            }
            _ => return url,
        }
    }
}

/// Remove the URL span, including any surrounding Slack link syntax
/// (`<url>` or `<url|label>`).
fn remove_url_span(text: &str, start: usize, end: usize) -> String {
    let mut span_start = start;
    let mut span_end = end;

    if text[..start].ends_with('<') {
        span_start -= 1;
        if let Some(close) = text[end..].find('>') {
            span_end = end + close + 1;
        }
    }

    let mut remainder = String::with_capacity(text.len());
    remainder.push_str(&text[..span_start]);
    remainder.push(' ');
    remainder.push_str(&text[span_end..]);
    remainder
}

fn parse_destination_scope(directive_text: &str) -> DestinationScope {
    let lowered = directive_text.to_lowercase();
    if BUSINESS_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        DestinationScope::PersonalAndBusiness
    } else {
        DestinationScope::Personal
    }
}

fn parse_opening_override(directive_text: &str) -> Option<String> {
    for segment in directive_text.split(['.', '!', '?', '\n']) {
        if segment.contains("시작") {
            if let Some(caps) = OPENING_KO_RE.captures(segment) {
                let phrase = caps[1].trim();
                if !phrase.is_empty() {
                    return Some(phrase.to_string());
                }
            }
        }
        if let Some(caps) = OPENING_EN_RE.captures(segment.trim()) {
            let phrase = caps[1].trim();
            if !phrase.is_empty() {
                return Some(phrase.to_string());
            }
        }
    }
    None
}
