use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One verified Slack app-mention delivery, immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingEvent {
    pub event_id: String,
    pub channel: String,
    pub user: String,
    pub raw_text: String,
    pub received_at: DateTime<Utc>,
}

/// Which destination groups a run's output must reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationScope {
    Personal,
    PersonalAndBusiness,
}

/// Structured intent parsed out of free-form mention text. Derivation is
/// deterministic and side-effect free; only the URL is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub target_url: String,
    pub destination_scope: DestinationScope,
    pub opening_override: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Article,
    Document,
    Video,
}

/// Handle to an image attached to a document (figure, thumbnail, lead image).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHandle {
    pub url: String,
    pub filename: String,
    pub caption: Option<String>,
}

/// The format-agnostic representation produced by exactly one extractor per
/// run and consumed uniformly by the summarizer. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub source_kind: SourceKind,
    pub source_url: String,
    pub title: String,
    pub authors: Vec<String>,
    pub published_at: Option<String>,
    pub keywords: Vec<String>,
    pub body_sections: Vec<String>,
    pub images: Vec<ImageHandle>,
    pub reference_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySection {
    pub heading: String,
    pub body: String,
}

/// Structured summary with sections in a fixed semantic order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub opening: String,
    pub sections: Vec<SummarySection>,
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationGroup {
    Personal,
    Business,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// Outcome of one (destination group, channel) delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub destination_group: DestinationGroup,
    pub channel_id: String,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    /// True when a business-scope request was downgraded to personal-only
    /// because business delivery is globally disabled.
    pub business_fallback: bool,
}

/// The opaque job handed from the API Lambda to the Worker Lambda over SQS.
///
/// Carries the parsed directive fields alongside the raw text so the worker
/// does not re-run gateway validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingJob {
    pub correlation_id: String,
    pub event_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
    pub target_url: String,
    pub destination_scope: DestinationScope,
    pub opening_override: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl ProcessingJob {
    /// Build the queue payload from a verified event and its parsed directive.
    #[must_use]
    pub fn from_event(
        correlation_id: String,
        event: &IncomingEvent,
        directive: Directive,
    ) -> Self {
        Self {
            correlation_id,
            event_id: event.event_id.clone(),
            channel_id: event.channel.clone(),
            user_id: event.user.clone(),
            text: event.raw_text.clone(),
            target_url: directive.target_url,
            destination_scope: directive.destination_scope,
            opening_override: directive.opening_override,
            received_at: event.received_at,
        }
    }

    #[must_use]
    pub fn directive(&self) -> Directive {
        Directive {
            target_url: self.target_url.clone(),
            destination_scope: self.destination_scope,
            opening_override: self.opening_override.clone(),
        }
    }
}
