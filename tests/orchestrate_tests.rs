use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use omnisummary::ai::Summarize;
use omnisummary::core::models::{
    DeliveryReceipt, DeliveryStatus, DestinationGroup, DestinationScope, Directive,
    NormalizedDocument, ProcessingJob, SourceKind, Summary,
};
use omnisummary::errors::BotError;
use omnisummary::extract::ExtractContent;
use omnisummary::worker::deliver::DeliverSummary;
use omnisummary::worker::orchestrate::{Orchestrator, Phase, RetryPolicy};

fn job() -> ProcessingJob {
    ProcessingJob {
        correlation_id: "corr-1".to_string(),
        event_id: "Ev123".to_string(),
        channel_id: "C1".to_string(),
        user_id: "U1".to_string(),
        text: "summarize this".to_string(),
        target_url: "https://example.com/post".to_string(),
        destination_scope: DestinationScope::Personal,
        opening_override: None,
        received_at: Utc::now(),
    }
}

fn document() -> NormalizedDocument {
    NormalizedDocument {
        source_kind: SourceKind::Article,
        source_url: "https://example.com/post".to_string(),
        title: "Post".to_string(),
        authors: vec![],
        published_at: None,
        keywords: vec![],
        body_sections: vec!["body".to_string()],
        images: vec![],
        reference_urls: vec![],
    }
}

fn summary() -> Summary {
    Summary {
        opening: "Opening.".to_string(),
        sections: vec![],
        references: vec![],
    }
}

fn sent_receipt() -> DeliveryReceipt {
    DeliveryReceipt {
        destination_group: DestinationGroup::Personal,
        channel_id: "C1".to_string(),
        status: DeliveryStatus::Sent,
        error: None,
        business_fallback: false,
    }
}

fn failed_receipt() -> DeliveryReceipt {
    DeliveryReceipt {
        destination_group: DestinationGroup::Personal,
        channel_id: "C1".to_string(),
        status: DeliveryStatus::Failed,
        error: Some("unreachable".to_string()),
        business_fallback: false,
    }
}

type CallLog = Arc<Mutex<Vec<String>>>;

struct FakeExtractor {
    log: CallLog,
    calls: AtomicU32,
    fail_first: u32,
    transient: bool,
    delay: Option<Duration>,
}

impl FakeExtractor {
    fn ok(log: CallLog) -> Self {
        Self {
            log,
            calls: AtomicU32::new(0),
            fail_first: 0,
            transient: false,
            delay: None,
        }
    }
}

#[async_trait]
impl ExtractContent for FakeExtractor {
    async fn extract(
        &self,
        _url: &str,
        _kind: SourceKind,
    ) -> Result<NormalizedDocument, BotError> {
        self.log.lock().unwrap().push("extract".to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(BotError::Extraction {
                message: "fetch failed".to_string(),
                transient: self.transient,
            });
        }
        Ok(document())
    }
}

struct FakeSummarizer {
    log: CallLog,
    calls: AtomicU32,
    fail_first: u32,
    transient: bool,
}

impl FakeSummarizer {
    fn ok(log: CallLog) -> Self {
        Self {
            log,
            calls: AtomicU32::new(0),
            fail_first: 0,
            transient: false,
        }
    }
}

#[async_trait]
impl Summarize for FakeSummarizer {
    async fn summarize(
        &self,
        _document: &NormalizedDocument,
        _directive: &Directive,
    ) -> Result<Summary, BotError> {
        self.log.lock().unwrap().push("summarize".to_string());
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(BotError::Summarization {
                message: "model error".to_string(),
                transient: self.transient,
            });
        }
        Ok(summary())
    }
}

struct FakeDispatcher {
    log: CallLog,
    receipts: Vec<DeliveryReceipt>,
    notices: Mutex<Vec<String>>,
}

impl FakeDispatcher {
    fn new(log: CallLog, receipts: Vec<DeliveryReceipt>) -> Self {
        Self {
            log,
            receipts,
            notices: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DeliverSummary for FakeDispatcher {
    async fn deliver(
        &self,
        _document: &NormalizedDocument,
        _summary: &Summary,
        _scope: DestinationScope,
    ) -> Vec<DeliveryReceipt> {
        self.log.lock().unwrap().push("deliver".to_string());
        self.receipts.clone()
    }

    async fn notify_failure(&self, text: &str) -> Vec<DeliveryReceipt> {
        self.notices.lock().unwrap().push(text.to_string());
        vec![sent_receipt()]
    }
}

fn orchestrator(
    extractor: FakeExtractor,
    summarizer: FakeSummarizer,
    dispatcher: Arc<FakeDispatcher>,
) -> Orchestrator {
    Orchestrator::new(
        Arc::new(extractor),
        Arc::new(summarizer),
        dispatcher,
        RetryPolicy::default(),
        Duration::from_secs(30),
    )
}

#[tokio::test]
async fn test_successful_run_reaches_done() {
    let log: CallLog = Arc::default();
    let dispatcher = Arc::new(FakeDispatcher::new(log.clone(), vec![sent_receipt()]));
    let orch = orchestrator(
        FakeExtractor::ok(log.clone()),
        FakeSummarizer::ok(log.clone()),
        dispatcher.clone(),
    );

    let state = orch.run(&job()).await;

    assert_eq!(state.phase, Phase::Done);
    assert_eq!(state.attempts.extract, 1);
    assert_eq!(state.attempts.summarize, 1);
    assert_eq!(state.receipts.len(), 1);
    assert!(state.failure.is_none());
    assert!(dispatcher.notices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_phases_execute_in_order() {
    // Summarization must never run before extraction, nor delivery before
    // summarization.
    let log: CallLog = Arc::default();
    let dispatcher = Arc::new(FakeDispatcher::new(log.clone(), vec![sent_receipt()]));
    let orch = orchestrator(
        FakeExtractor::ok(log.clone()),
        FakeSummarizer::ok(log.clone()),
        dispatcher,
    );

    orch.run(&job()).await;

    assert_eq!(*log.lock().unwrap(), vec!["extract", "summarize", "deliver"]);
}

#[tokio::test]
async fn test_transient_extraction_failure_is_retried() {
    let log: CallLog = Arc::default();
    let mut extractor = FakeExtractor::ok(log.clone());
    extractor.fail_first = 2;
    extractor.transient = true;
    let dispatcher = Arc::new(FakeDispatcher::new(log.clone(), vec![sent_receipt()]));
    let orch = orchestrator(extractor, FakeSummarizer::ok(log.clone()), dispatcher);

    let state = orch.run(&job()).await;

    assert_eq!(state.phase, Phase::Done);
    assert_eq!(state.attempts.extract, 3);
}

#[tokio::test]
async fn test_fatal_extraction_failure_is_not_retried() {
    let log: CallLog = Arc::default();
    let mut extractor = FakeExtractor::ok(log.clone());
    extractor.fail_first = 99;
    extractor.transient = false;
    let dispatcher = Arc::new(FakeDispatcher::new(log.clone(), vec![sent_receipt()]));
    let orch = orchestrator(extractor, FakeSummarizer::ok(log.clone()), dispatcher.clone());

    let state = orch.run(&job()).await;

    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(state.attempts.extract, 1);
    assert!(state.receipts.is_empty());
    // Delivery was never reached, so a user-visible notice goes out.
    assert_eq!(dispatcher.notices.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_retry_budget_is_bounded() {
    let log: CallLog = Arc::default();
    let mut summarizer = FakeSummarizer::ok(log.clone());
    summarizer.fail_first = 99;
    summarizer.transient = true;
    let dispatcher = Arc::new(FakeDispatcher::new(log.clone(), vec![sent_receipt()]));
    let orch = orchestrator(FakeExtractor::ok(log.clone()), summarizer, dispatcher);

    let state = orch.run(&job()).await;

    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(state.attempts.summarize, 3);
}

#[tokio::test]
async fn test_all_channels_failed_marks_run_failed() {
    let log: CallLog = Arc::default();
    let dispatcher = Arc::new(FakeDispatcher::new(log.clone(), vec![failed_receipt()]));
    let orch = orchestrator(
        FakeExtractor::ok(log.clone()),
        FakeSummarizer::ok(log.clone()),
        dispatcher.clone(),
    );

    let state = orch.run(&job()).await;

    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(state.receipts.len(), 1);
    // Delivery was attempted, so the partial outcome stands as-is and no
    // separate failure notice is posted.
    assert!(dispatcher.notices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_delivery_counts_as_success() {
    let log: CallLog = Arc::default();
    let dispatcher = Arc::new(FakeDispatcher::new(
        log.clone(),
        vec![sent_receipt(), failed_receipt()],
    ));
    let orch = orchestrator(
        FakeExtractor::ok(log.clone()),
        FakeSummarizer::ok(log.clone()),
        dispatcher,
    );

    let state = orch.run(&job()).await;

    assert_eq!(state.phase, Phase::Done);
    assert_eq!(state.receipts.len(), 2);
}

#[tokio::test]
async fn test_run_timeout_fails_the_run() {
    let log: CallLog = Arc::default();
    let mut extractor = FakeExtractor::ok(log.clone());
    extractor.delay = Some(Duration::from_secs(60));
    let dispatcher = Arc::new(FakeDispatcher::new(log.clone(), vec![sent_receipt()]));
    let orch = Orchestrator::new(
        Arc::new(extractor),
        Arc::new(FakeSummarizer::ok(log.clone())),
        dispatcher.clone(),
        RetryPolicy::default(),
        Duration::from_millis(50),
    );

    let state = orch.run(&job()).await;

    assert_eq!(state.phase, Phase::Failed);
    assert!(state.failure.as_deref().unwrap().contains("timed out"));
    assert_eq!(dispatcher.notices.lock().unwrap().len(), 1);
}

#[test]
fn test_transition_table() {
    assert!(Phase::Init.can_transition_to(Phase::Routed));
    assert!(Phase::Routed.can_transition_to(Phase::Extracted));
    assert!(Phase::Extracted.can_transition_to(Phase::Summarized));
    assert!(Phase::Summarized.can_transition_to(Phase::Delivered));
    assert!(Phase::Delivered.can_transition_to(Phase::Done));

    // No skipping forward, no going back.
    assert!(!Phase::Init.can_transition_to(Phase::Extracted));
    assert!(!Phase::Summarized.can_transition_to(Phase::Routed));

    // Failed is reachable from any non-terminal phase only.
    assert!(Phase::Init.can_transition_to(Phase::Failed));
    assert!(Phase::Delivered.can_transition_to(Phase::Failed));
    assert!(!Phase::Done.can_transition_to(Phase::Failed));
    assert!(!Phase::Failed.can_transition_to(Phase::Failed));
}
