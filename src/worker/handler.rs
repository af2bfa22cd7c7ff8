use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

use super::deliver::{Dispatcher, SlackChannelPoster};
use super::orchestrate::{Orchestrator, RetryPolicy};
use crate::ai::OpenAiSummarizer;
use crate::core::config::AppConfig;
use crate::core::models::{DeliveryStatus, ProcessingJob};
use crate::extract::ExtractorSet;

/// Lambda handler for the Worker entrypoint. Parses the SQS message into a
/// `ProcessingJob` and drives it through the orchestration state machine.
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<(), Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;

    let job: ProcessingJob = event
        .payload
        .get("Records")
        .and_then(|records| records.as_array())
        .and_then(|records| records.first())
        .and_then(|record| record.get("body"))
        .and_then(|body| body.as_str())
        .ok_or_else(|| Error::from("Failed to extract SQS message body"))
        .and_then(|body_str| {
            serde_json::from_str(body_str).map_err(|e| {
                Error::from(format!(
                    "Failed to parse SQS message body into ProcessingJob: {e}"
                ))
            })
        })?;

    let queue_delay_ms = (Utc::now() - job.received_at).num_milliseconds();
    info!(
        correlation_id = %job.correlation_id,
        event_id = %job.event_id,
        queue_delay_ms,
        "Worker received processing job"
    );

    let extractor = Arc::new(ExtractorSet::new(&config));
    let summarizer = Arc::new(OpenAiSummarizer::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        SlackChannelPoster::new(&config),
        config.personal_channel_ids.clone(),
        config.business_channel_ids.clone(),
        config.business_enabled,
    ));

    let orchestrator = Orchestrator::new(
        extractor,
        summarizer,
        dispatcher,
        RetryPolicy::default(),
        Duration::from_secs(config.run_timeout_secs),
    );

    let state = orchestrator.run(&job).await;
    let sent = state
        .receipts
        .iter()
        .filter(|r| r.status == DeliveryStatus::Sent)
        .count();
    info!(
        run_id = %state.run_id,
        phase = state.phase.name(),
        sent,
        total = state.receipts.len(),
        "Run finished"
    );

    // The run outcome is terminal either way; reporting an error here would
    // only make SQS redeliver an event the dedup ledger already claimed.
    Ok(())
}

pub use self::function_handler as handler;
