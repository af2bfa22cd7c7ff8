//! Common helper functions for the API handler: response builders and the
//! fire-and-forget user notice used when a mention carries no URL.

use serde_json::{Value, json};
use std::time::Duration;
use tracing::error;

use crate::slack::client::SlackClient;

// ============================================================================
// Response Builders
// ============================================================================

/// Returns a 200 OK response with an empty JSON body.
#[must_use]
pub fn ok_empty() -> Value {
    json!({ "statusCode": 200, "body": "{}" })
}

/// Returns the `url_verification` challenge back to Slack.
#[must_use]
pub fn ok_challenge(challenge: &str) -> Value {
    json!({ "statusCode": 200, "body": challenge })
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json!({
        "statusCode": status_code,
        "body": json!({ "error": message }).to_string()
    })
}

// ============================================================================
// Message Operations
// ============================================================================

/// Posts a short notice to the origin channel with a timeout.
///
/// Fire-and-forget pattern for keeping the Slack ack fast: if the timeout
/// fires, the post continues in the background.
pub async fn post_notice_with_timeout(
    bot_token: &str,
    channel_id: &str,
    text: &str,
    timeout_ms: u64,
) {
    let client = SlackClient::new(bot_token.to_string());
    let channel_id = channel_id.to_string();
    let text = text.to_string();

    let handle = tokio::spawn(async move {
        if let Err(e) = client.post_message(&channel_id, &text).await {
            error!("Failed to post notice: {}", e);
        }
    });

    let _ = tokio::time::timeout(Duration::from_millis(timeout_ms), handle).await;
}
