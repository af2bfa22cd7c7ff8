use slack_morphism::errors::SlackClientError;
use thiserror::Error;

/// Typed failure kinds for the ingestion gateway and orchestration loop.
///
/// The `transient` flags on the extraction and summarization variants drive
/// the bounded retry policy in `worker::orchestrate`; everything else is
/// treated as fatal for the phase that produced it.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Duplicate event delivery: {0}")]
    DuplicateEvent(String),

    #[error("No URL found in event text")]
    MissingUrl,

    #[error("Extraction failed: {message}")]
    Extraction { message: String, transient: bool },

    #[error("Summarization failed: {message}")]
    Summarization { message: String, transient: bool },

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Failed to parse payload: {0}")]
    ParseError(String),

    #[error("Failed to interact with AWS services: {0}")]
    AwsError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Run timed out after {0}s")]
    RunTimeout(u64),

    #[error("Illegal phase transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}

impl BotError {
    /// Whether the retry policy is allowed to re-attempt the failed phase.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::Extraction { transient, .. } | BotError::Summarization { transient, .. } => {
                *transient
            }
            BotError::HttpError(_) => true,
            _ => false,
        }
    }
}

impl From<SlackClientError> for BotError {
    fn from(error: SlackClientError) -> Self {
        BotError::Delivery(error.to_string())
    }
}

impl From<reqwest::Error> for BotError {
    fn from(error: reqwest::Error) -> Self {
        BotError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for BotError {
    fn from(error: serde_json::Error) -> Self {
        BotError::ParseError(error.to_string())
    }
}
