//! Handoff of accepted jobs to the worker queue.

use aws_sdk_sqs::Client as SqsClient;
use aws_sdk_sqs::types::MessageAttributeValue;
use tracing::debug;

use crate::core::models::ProcessingJob;
use crate::errors::BotError;

/// Serialize the job and enqueue it. The correlation id rides along as a
/// message attribute so queue tooling can trace a run without decoding the
/// body.
///
/// # Errors
///
/// Returns an error if serialization fails or SQS rejects the message.
pub async fn enqueue_job(
    client: &SqsClient,
    queue_url: &str,
    job: &ProcessingJob,
) -> Result<(), BotError> {
    let body = serde_json::to_string(job)?;

    let correlation = MessageAttributeValue::builder()
        .data_type("String")
        .string_value(&job.correlation_id)
        .build()
        .map_err(|e| BotError::AwsError(format!("correlation attribute: {e}")))?;

    let output = client
        .send_message()
        .queue_url(queue_url)
        .message_body(body)
        .message_attributes("correlationId", correlation)
        .send()
        .await
        .map_err(|e| BotError::AwsError(format!("sqs send_message: {e}")))?;

    debug!(
        correlation_id = %job.correlation_id,
        message_id = output.message_id().unwrap_or("unknown"),
        "Job enqueued"
    );
    Ok(())
}
