//! OmniSummary - a Slack bot that turns a mentioned URL into a delivered,
//! multi-section content summary.
//!
//! This crate implements a two-Lambda architecture:
//! 1. An API Lambda that verifies Slack event callbacks, deduplicates event
//!    deliveries, parses directives out of the mention text, and queues jobs.
//! 2. A Worker Lambda that consumes queued jobs and drives one run through
//!    routing, extraction, summarization, and delivery.
//!
//! # Architecture
//!
//! The system uses:
//! - AWS Lambda for serverless execution
//! - SQS for job handoff between Lambdas
//! - DynamoDB conditional writes for the event dedup ledger
//! - slack-morphism for Slack API interactions
//! - openai-api-rs for summary generation
//! - Tokio for async runtime

// Module declarations
pub mod ai;
pub mod api;
pub mod core;
pub mod directive;
pub mod errors;
pub mod extract;
pub mod router;
pub mod slack;
pub mod worker;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// Sets up tracing-subscriber with a JSON formatter suitable for `CloudWatch`
/// Logs integration. Call once at the start of each Lambda handler binary.
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    tracing_subscriber::registry().with(fmt_layer).init();
}
