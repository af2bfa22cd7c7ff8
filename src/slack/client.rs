//! Slack API client module
//!
//! Encapsulates Slack API interactions with retry logic and error handling.
//! `chat.postMessage` goes through slack-morphism; the external file-upload
//! flow is not covered by slack-morphism and uses raw reqwest calls.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::SlackApiChatPostMessageRequest;
use slack_morphism::{SlackApiToken, SlackApiTokenValue, SlackChannelId, SlackMessageContent};
use std::time::Duration;
use tokio_retry::strategy::jitter;
use tokio_retry::{Retry, strategy::ExponentialBackoff};
use tracing::warn;

use crate::errors::BotError;

// Build the Slack client connector safely without panicking.
// If connector construction fails, store None and surface a BotError at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    ok: bool,
    upload_url: Option<String>,
    file_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompleteUploadResponse {
    ok: bool,
    error: Option<String>,
}

/// Slack API client for one workspace token, with retry logic.
pub struct SlackClient {
    token: SlackApiToken,
    raw_token: String,
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token.clone())),
            raw_token: token,
        }
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, BotError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, BotError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);

        Retry::spawn(strategy, operation).await
    }

    /// Post a plain-text message to a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the Slack API call fails after retries.
    pub async fn post_message(&self, channel_id: &str, message: &str) -> Result<(), BotError> {
        self.with_retry(|| async {
            let session = SLACK_CLIENT
                .as_ref()
                .ok_or_else(|| {
                    BotError::Delivery("Slack HTTP connector not initialized".to_string())
                })?
                .open_session(&self.token);

            let post_req = SlackApiChatPostMessageRequest::new(
                SlackChannelId(channel_id.to_string()),
                SlackMessageContent::new().with_text(message.to_string()),
            );

            session.chat_post_message(&post_req).await?;

            Ok(())
        })
        .await
    }

    /// Upload image bytes to a channel via the external upload flow:
    /// `files.getUploadURLExternal`, a raw POST of the bytes, then
    /// `files.completeUploadExternal`.
    ///
    /// # Errors
    ///
    /// Returns an error if any step of the upload flow fails.
    pub async fn upload_image(
        &self,
        channel_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), BotError> {
        let upload: UploadUrlResponse = HTTP_CLIENT
            .get("https://slack.com/api/files.getUploadURLExternal")
            .bearer_auth(&self.raw_token)
            .query(&[("filename", filename), ("length", &bytes.len().to_string())])
            .send()
            .await?
            .json()
            .await?;

        if !upload.ok {
            return Err(BotError::Delivery(format!(
                "files.getUploadURLExternal failed: {}",
                upload.error.unwrap_or_else(|| "unknown".to_string())
            )));
        }
        let (Some(upload_url), Some(file_id)) = (upload.upload_url, upload.file_id) else {
            return Err(BotError::Delivery(
                "files.getUploadURLExternal returned no upload target".to_string(),
            ));
        };

        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let put_resp = HTTP_CLIENT
            .post(&upload_url)
            .header("Content-Type", mime.essence_str())
            .body(bytes)
            .send()
            .await?;
        if !put_resp.status().is_success() {
            return Err(BotError::Delivery(format!(
                "Image upload POST failed with status {}",
                put_resp.status()
            )));
        }

        let complete: CompleteUploadResponse = HTTP_CLIENT
            .post("https://slack.com/api/files.completeUploadExternal")
            .bearer_auth(&self.raw_token)
            .json(&json!({
                "files": [{ "id": file_id, "title": filename }],
                "channel_id": channel_id,
            }))
            .send()
            .await?
            .json()
            .await?;

        if !complete.ok {
            return Err(BotError::Delivery(format!(
                "files.completeUploadExternal failed: {}",
                complete.error.unwrap_or_else(|| "unknown".to_string())
            )));
        }

        Ok(())
    }
}
