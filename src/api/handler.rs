//! API Lambda handler - the ingestion gateway.
//!
//! Synchronous work is limited to signature verification, the dedup claim,
//! and directive parsing; everything heavier runs in the Worker Lambda after
//! the SQS handoff, so Slack always gets its ack within the deadline.

use lambda_runtime::{Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use chrono::Utc;

use super::dedup::{Claim, DedupLedger, DynamoDedupLedger};
use super::{helpers, parsing, signature, sqs};
use crate::core::config::AppConfig;
use crate::core::models::{IncomingEvent, ProcessingJob};
use crate::directive;
use crate::errors::BotError;

pub use self::function_handler as handler;

const MISSING_URL_NOTICE: &str =
    "요약할 URL을 찾지 못했어요. 링크와 함께 멘션해 주세요. (No URL found - mention me with a link to summarize.)";

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Returns an error response payload if the request is malformed or fails
/// Slack signature verification; otherwise returns a 200 with a JSON body.
#[tracing::instrument(level = "info", skip(event))]
pub async fn function_handler(
    event: LambdaEvent<serde_json::Value>,
) -> Result<impl Serialize, Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;

    // ========================================================================
    // Extract and validate headers and body
    // ========================================================================

    let Some(headers) = event.payload.get("headers") else {
        error!("Request missing headers");
        return Ok(helpers::err_response(400, "Missing headers"));
    };

    let body = match extract_body(&event.payload) {
        Ok(b) => b,
        Err(response) => return Ok(response),
    };

    // ========================================================================
    // Verify Slack signature (before any dedup or parsing work)
    // ========================================================================

    if let Err(e) = verify_signature(body, headers, &config) {
        error!("{}", e);
        return Ok(helpers::err_response(401, &e.to_string()));
    }

    info!("Slack signature verified successfully");

    // ========================================================================
    // Parse the Events API envelope
    // ========================================================================

    let callback: parsing::SlackEventCallback = match serde_json::from_str(body) {
        Ok(cb) => cb,
        Err(e) => {
            error!("Failed to parse Slack event: {}", e);
            return Ok(helpers::err_response(400, &format!("Parse Error: {e}")));
        }
    };

    if callback.is_url_verification() {
        let challenge = callback.challenge.as_deref().unwrap_or("");
        return Ok(helpers::ok_challenge(challenge));
    }

    if !callback.is_app_mention() {
        info!(callback_type = %callback.callback_type, "Ignoring non-mention callback");
        return Ok(helpers::ok_empty());
    }

    let Some(mention) = callback.event else {
        return Ok(helpers::ok_empty());
    };

    if mention.is_from_bot() {
        info!("Ignoring bot or system message");
        return Ok(helpers::ok_empty());
    }

    // ========================================================================
    // Dedup claim - idempotent no-op ack on duplicate deliveries
    // ========================================================================

    let Some(event_id) = callback.event_id.as_deref() else {
        warn!("event_callback missing event_id, cannot deduplicate");
        return Ok(helpers::ok_empty());
    };

    let shared_config = aws_config::from_env().load().await;
    let ledger = DynamoDedupLedger::new(
        aws_sdk_dynamodb::Client::new(&shared_config),
        config.dedup_table_name.clone(),
        config.dedup_ttl_secs,
    );

    match ledger.claim(event_id).await {
        Ok(Claim::Accepted) => {}
        Ok(Claim::Duplicate) => {
            info!("{}", BotError::DuplicateEvent(event_id.to_string()));
            return Ok(helpers::ok_empty());
        }
        Err(e) => {
            // Ledger outage: proceed rather than drop the event. Slack retries
            // the same event_id, so a later claim restores dedup.
            error!("Dedup ledger error, proceeding anyway: {}", e);
        }
    }

    // ========================================================================
    // Parse directives and enqueue the processing job
    // ========================================================================

    let incoming = IncomingEvent {
        event_id: event_id.to_string(),
        channel: mention.channel.clone().unwrap_or_default(),
        user: mention.user.clone().unwrap_or_default(),
        raw_text: mention.text.clone().unwrap_or_default(),
        received_at: Utc::now(),
    };

    let parsed = match directive::parse_directive(&incoming.raw_text) {
        Ok(d) => d,
        Err(BotError::MissingUrl) => {
            info!(event_id = %incoming.event_id, "Mention carried no URL");
            if !incoming.channel.is_empty() {
                helpers::post_notice_with_timeout(
                    &config.personal_bot_token,
                    &incoming.channel,
                    MISSING_URL_NOTICE,
                    1500,
                )
                .await;
            }
            return Ok(helpers::ok_empty());
        }
        Err(e) => {
            error!("Directive parse error: {}", e);
            return Ok(helpers::err_response(400, &format!("{e}")));
        }
    };

    let job = ProcessingJob::from_event(Uuid::new_v4().to_string(), &incoming, parsed);

    info!(
        event_id = %job.event_id,
        correlation_id = %job.correlation_id,
        url = %job.target_url,
        "Enqueueing processing job"
    );

    // The ledger already accepted this event; Slack-side retries are absorbed
    // there, so an enqueue failure is logged but still acked.
    let sqs_client = aws_sdk_sqs::Client::new(&shared_config);
    if let Err(e) = sqs::enqueue_job(&sqs_client, &config.processing_queue_url, &job).await {
        error!("Enqueue failed: {}", e);
    }

    Ok(helpers::ok_empty())
}

// ============================================================================
// Request Validation Helpers
// ============================================================================

fn extract_body(payload: &Value) -> Result<&str, Value> {
    let Some(body) = payload.get("body") else {
        error!("Request missing body");
        return Err(helpers::err_response(400, "Missing body"));
    };

    let Some(body_str) = body.as_str() else {
        error!("Request body is not a string");
        return Err(helpers::err_response(400, "Invalid body format"));
    };

    Ok(body_str)
}

fn verify_signature(body: &str, headers: &Value, config: &AppConfig) -> Result<(), BotError> {
    let Some(sig) = parsing::get_header_value(headers, "X-Slack-Signature") else {
        return Err(BotError::Authentication(
            "missing X-Slack-Signature header".to_string(),
        ));
    };

    let Some(timestamp) = parsing::get_header_value(headers, "X-Slack-Request-Timestamp") else {
        return Err(BotError::Authentication(
            "missing X-Slack-Request-Timestamp header".to_string(),
        ));
    };

    if !signature::verify_slack_signature(body, timestamp, sig, config) {
        return Err(BotError::Authentication(
            "invalid Slack signature".to_string(),
        ));
    }

    Ok(())
}
