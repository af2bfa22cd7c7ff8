//! LLM (`OpenAI`) API client module
//!
//! Turns a normalized document plus a directive into a structured summary
//! with sections in a fixed semantic order. The model is asked for delimited
//! section headings; the response is parsed back into `Summary`, and the
//! opening override from the directive is applied verbatim when present.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::models::{Directive, NormalizedDocument, Summary, SummarySection};
use crate::errors::BotError;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const MAX_INPUT_TOKENS: usize = 100_000;

/// Headings in the required semantic order.
pub const SECTION_HEADINGS: &[&str] =
    &["Significance", "Key Ideas", "Technical Detail", "Impact"];

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

/// Summarization capability consumed by the orchestration loop.
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(
        &self,
        document: &NormalizedDocument,
        directive: &Directive,
    ) -> Result<Summary, BotError>;
}

/// LLM API client for generating summaries
pub struct OpenAiSummarizer {
    api_key: String,
    model_name: String,
    http: Client,
}

impl OpenAiSummarizer {
    #[must_use]
    pub fn new(api_key: String, model_name: Option<String>) -> Self {
        Self {
            api_key,
            model_name: model_name.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            http: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    #[must_use]
    pub fn build_prompt(
        &self,
        document: &NormalizedDocument,
        directive: &Directive,
    ) -> Vec<ChatCompletionMessage> {
        let headings = SECTION_HEADINGS
            .iter()
            .map(|h| format!("## {h}"))
            .collect::<Vec<_>>()
            .join(", ");

        let opening_rule = if directive.opening_override.is_some() {
            "The first line before any section is the opening; it is supplied in the input and \
             must not be rewritten, so write sections only."
        } else {
            "Write one plain opening sentence before the first section heading."
        };

        let mut chat = vec![ChatCompletionMessage {
            role: MessageRole::system,
            content: Content::Text(format!(
                "You are a content summarization assistant for Slack. \
                 Summarize the supplied document into exactly these sections, in order, \
                 each introduced by its markdown heading: {headings}. \
                 {opening_rule} \
                 Keep each section to 2-4 sentences, never invent facts or links, \
                 and output nothing outside the opening and the four sections."
            )),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }];

        let mut body = document.body_sections.join("\n\n");
        body = truncate_to_tokens(&body, MAX_INPUT_TOKENS);

        let mut user_text = format!("Title: {}\n", document.title);
        if !document.authors.is_empty() {
            user_text.push_str(&format!("Authors: {}\n", document.authors.join(", ")));
        }
        if let Some(date) = document.published_at.as_deref() {
            user_text.push_str(&format!("Published: {date}\n"));
        }
        if !document.keywords.is_empty() {
            user_text.push_str(&format!("Keywords: {}\n", document.keywords.join(", ")));
        }
        user_text.push_str(&format!("\n{body}"));

        chat.push(ChatCompletionMessage {
            role: MessageRole::user,
            content: Content::Text(user_text),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        });

        chat
    }

    async fn complete(&self, messages: &[ChatCompletionMessage]) -> Result<String, BotError> {
        let payload = json!({
            "model": self.model_name,
            "messages": messages,
            "temperature": 0.0,
        });

        let response = self
            .http
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| BotError::Summarization {
                message: format!("chat completion request failed: {e}"),
                transient: true,
            })?;

        let status = response.status();
        if !status.is_success() {
            let transient = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            return Err(BotError::Summarization {
                message: format!("chat completion returned status {status}"),
                transient,
            });
        }

        let body: Value = response.json().await.map_err(|e| BotError::Summarization {
            message: format!("chat completion response malformed: {e}"),
            transient: false,
        })?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(ToString::to_string)
            .ok_or_else(|| BotError::Summarization {
                message: "chat completion returned no content".to_string(),
                transient: false,
            })
    }
}

#[async_trait]
impl Summarize for OpenAiSummarizer {
    async fn summarize(
        &self,
        document: &NormalizedDocument,
        directive: &Directive,
    ) -> Result<Summary, BotError> {
        let messages = self.build_prompt(document, directive);
        debug!(model = %self.model_name, "Requesting summary");

        let content = self.complete(&messages).await?;
        let summary = parse_summary_text(
            &content,
            directive.opening_override.as_deref(),
            &document.reference_urls,
        );
        info!(sections = summary.sections.len(), "Generated summary");
        Ok(summary)
    }
}

fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    if estimate_tokens(text) <= max_tokens {
        return text.to_string();
    }
    text.chars().take(max_tokens * 4).collect()
}

/// Parse the model response into the structured summary.
///
/// Text before the first `## ` heading is the generated opening; an
/// `opening_override` replaces it verbatim. Section order follows the model
/// response, which the prompt constrains to the fixed semantic order.
#[must_use]
pub fn parse_summary_text(
    text: &str,
    opening_override: Option<&str>,
    references: &[String],
) -> Summary {
    let mut opening = String::new();
    let mut sections: Vec<SummarySection> = Vec::new();

    let mut chunks = text.split("\n## ");
    // Leading chunk: either the opening, or the first section when the
    // response starts directly with `## `.
    if let Some(first) = chunks.next() {
        let trimmed = first.trim();
        if let Some(rest) = trimmed.strip_prefix("## ") {
            push_section(&mut sections, rest);
        } else if !trimmed.is_empty() {
            opening = trimmed.to_string();
        }
    }
    for chunk in chunks {
        push_section(&mut sections, chunk);
    }

    if let Some(override_text) = opening_override {
        opening = override_text.to_string();
    }

    Summary {
        opening,
        sections,
        references: references.to_vec(),
    }
}

fn push_section(sections: &mut Vec<SummarySection>, chunk: &str) {
    let mut lines = chunk.trim().lines();
    let Some(heading) = lines.next().map(str::trim).filter(|h| !h.is_empty()) else {
        return;
    };
    let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
    sections.push(SummarySection {
        heading: heading.to_string(),
        body,
    });
}
