use chrono::Utc;

use omnisummary::core::models::{
    DestinationScope, Directive, IncomingEvent, ProcessingJob,
};

fn incoming() -> IncomingEvent {
    IncomingEvent {
        event_id: "Ev123".to_string(),
        channel: "C1".to_string(),
        user: "U1".to_string(),
        raw_text: "<@U0BOT> https://example.com/a 회사 채널에도 보내줘".to_string(),
        received_at: Utc::now(),
    }
}

fn directive() -> Directive {
    Directive {
        target_url: "https://example.com/a".to_string(),
        destination_scope: DestinationScope::PersonalAndBusiness,
        opening_override: Some("AWS 신기능이네요".to_string()),
    }
}

#[test]
fn test_job_carries_event_and_directive_fields() {
    let event = incoming();
    let job = ProcessingJob::from_event("corr-1".to_string(), &event, directive());

    assert_eq!(job.correlation_id, "corr-1");
    assert_eq!(job.event_id, event.event_id);
    assert_eq!(job.channel_id, event.channel);
    assert_eq!(job.user_id, event.user);
    assert_eq!(job.text, event.raw_text);
    assert_eq!(job.target_url, "https://example.com/a");
    assert_eq!(
        job.destination_scope,
        DestinationScope::PersonalAndBusiness
    );
    assert_eq!(job.opening_override.as_deref(), Some("AWS 신기능이네요"));
    assert_eq!(job.received_at, event.received_at);
}

#[test]
fn test_job_survives_the_queue_body_round_trip() {
    // The worker parses the SQS body with serde_json; the gateway's receipt
    // timestamp must come through unchanged.
    let job = ProcessingJob::from_event("corr-1".to_string(), &incoming(), directive());

    let body = serde_json::to_string(&job).unwrap();
    let parsed: ProcessingJob = serde_json::from_str(&body).unwrap();

    assert_eq!(parsed.correlation_id, job.correlation_id);
    assert_eq!(parsed.event_id, job.event_id);
    assert_eq!(parsed.target_url, job.target_url);
    assert_eq!(parsed.destination_scope, job.destination_scope);
    assert_eq!(parsed.received_at, job.received_at);
}

#[test]
fn test_directive_reconstructed_from_job() {
    let job = ProcessingJob::from_event("corr-1".to_string(), &incoming(), directive());
    assert_eq!(job.directive(), directive());
}
