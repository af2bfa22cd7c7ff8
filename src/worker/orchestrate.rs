//! The per-run orchestration state machine.
//!
//! One run drives a single accepted event through
//! `INIT -> ROUTED -> EXTRACTED -> SUMMARIZED -> DELIVERED -> DONE`, with
//! `FAILED` reachable from any non-terminal phase. Transitions are strictly
//! forward; a bounded retry re-enters the same phase only, and every
//! transition is validated against the allowed edges rather than trusted.
//! The loop is the only component that mutates `RunState`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::ai::Summarize;
use crate::core::models::{
    DeliveryReceipt, DeliveryStatus, NormalizedDocument, ProcessingJob, SourceKind, Summary,
};
use crate::errors::BotError;
use crate::extract::ExtractContent;
use crate::router;
use crate::worker::deliver::DeliverSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Routed,
    Extracted,
    Summarized,
    Delivered,
    Done,
    Failed,
}

impl Phase {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Phase::Init => "INIT",
            Phase::Routed => "ROUTED",
            Phase::Extracted => "EXTRACTED",
            Phase::Summarized => "SUMMARIZED",
            Phase::Delivered => "DELIVERED",
            Phase::Done => "DONE",
            Phase::Failed => "FAILED",
        }
    }

    /// The single legal forward edge out of this phase.
    #[must_use]
    pub fn successor(self) -> Option<Phase> {
        match self {
            Phase::Init => Some(Phase::Routed),
            Phase::Routed => Some(Phase::Extracted),
            Phase::Extracted => Some(Phase::Summarized),
            Phase::Summarized => Some(Phase::Delivered),
            Phase::Delivered => Some(Phase::Done),
            Phase::Done | Phase::Failed => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }

    #[must_use]
    pub fn can_transition_to(self, next: Phase) -> bool {
        if next == Phase::Failed {
            return !self.is_terminal();
        }
        self.successor() == Some(next)
    }
}

/// Attempt counters per retryable phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptCounts {
    pub extract: u32,
    pub summarize: u32,
}

/// Bounded retry policy: total attempts per phase, transient failures only.
/// Delivery retries happen per channel inside the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub extract_max_attempts: u32,
    pub summarize_max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // 1 initial attempt + 2 retries for each retryable phase.
        Self {
            extract_max_attempts: 3,
            summarize_max_attempts: 3,
        }
    }
}

/// State for one run, exclusively owned by the run's execution context and
/// discarded when a terminal phase is reached.
#[derive(Debug)]
pub struct RunState {
    pub run_id: String,
    pub event_id: String,
    pub phase: Phase,
    pub kind: Option<SourceKind>,
    pub document: Option<NormalizedDocument>,
    pub summary: Option<Summary>,
    pub attempts: AttemptCounts,
    pub receipts: Vec<DeliveryReceipt>,
    pub failure: Option<String>,
}

impl RunState {
    #[must_use]
    pub fn new(job: &ProcessingJob) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            event_id: job.event_id.clone(),
            phase: Phase::Init,
            kind: None,
            document: None,
            summary: None,
            attempts: AttemptCounts::default(),
            receipts: Vec::new(),
            failure: None,
        }
    }

    /// Validated forward transition; out-of-order requests are rejected.
    pub fn advance(&mut self, next: Phase) -> Result<(), BotError> {
        if !self.phase.can_transition_to(next) {
            return Err(BotError::InvalidTransition {
                from: self.phase.name(),
                to: next.name(),
            });
        }
        self.phase = next;
        Ok(())
    }

    pub fn fail(&mut self, error: &BotError) {
        self.failure = Some(error.to_string());
        if !self.phase.is_terminal() {
            self.phase = Phase::Failed;
        }
    }

    #[must_use]
    pub fn delivery_reached(&self) -> bool {
        !self.receipts.is_empty()
    }
}

/// Run one phase with its bounded retry budget.
async fn run_phase<T, F, Fut>(
    phase_name: &str,
    attempts: &mut u32,
    max_attempts: u32,
    op: F,
) -> Result<T, BotError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, BotError>>,
{
    loop {
        *attempts += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && *attempts < max_attempts => {
                warn!(
                    phase = phase_name,
                    attempt = *attempts,
                    error = %e,
                    "Transient failure, retrying phase"
                );
                sleep(Duration::from_millis(200 * u64::from(*attempts))).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Drives runs through the state machine using injected capabilities.
pub struct Orchestrator {
    extractor: Arc<dyn ExtractContent>,
    summarizer: Arc<dyn Summarize>,
    dispatcher: Arc<dyn DeliverSummary>,
    policy: RetryPolicy,
    run_timeout: Duration,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        extractor: Arc<dyn ExtractContent>,
        summarizer: Arc<dyn Summarize>,
        dispatcher: Arc<dyn DeliverSummary>,
        policy: RetryPolicy,
        run_timeout: Duration,
    ) -> Self {
        Self {
            extractor,
            summarizer,
            dispatcher,
            policy,
            run_timeout,
        }
    }

    /// Execute one run end to end and return its final state.
    ///
    /// On timeout the run is abandoned: already-issued delivery calls may
    /// complete but are not awaited further, and nothing is rolled back.
    pub async fn run(&self, job: &ProcessingJob) -> RunState {
        let mut state = RunState::new(job);
        info!(
            run_id = %state.run_id,
            event_id = %state.event_id,
            correlation_id = %job.correlation_id,
            url = %job.target_url,
            "Starting run"
        );

        match timeout(self.run_timeout, self.drive(job, &mut state)).await {
            Ok(Ok(())) => {
                info!(run_id = %state.run_id, "Run complete");
            }
            Ok(Err(e)) => {
                self.handle_failure(&mut state, &e).await;
            }
            Err(_) => {
                let e = BotError::RunTimeout(self.run_timeout.as_secs());
                self.handle_failure(&mut state, &e).await;
            }
        }

        state
    }

    async fn drive(&self, job: &ProcessingJob, state: &mut RunState) -> Result<(), BotError> {
        let directive = job.directive();

        // INIT -> ROUTED: pure classification, no external call.
        let kind = router::classify(&job.target_url);
        state.kind = Some(kind);
        state.advance(Phase::Routed)?;
        info!(run_id = %state.run_id, kind = ?kind, "Routed URL");

        // ROUTED -> EXTRACTED
        let document = run_phase(
            "extract",
            &mut state.attempts.extract,
            self.policy.extract_max_attempts,
            || self.extractor.extract(&job.target_url, kind),
        )
        .await?;
        state.document = Some(document);
        state.advance(Phase::Extracted)?;

        // EXTRACTED -> SUMMARIZED
        let document = state
            .document
            .as_ref()
            .ok_or_else(|| BotError::InvalidTransition {
                from: "EXTRACTED",
                to: "SUMMARIZED",
            })?;
        let summary = run_phase(
            "summarize",
            &mut state.attempts.summarize,
            self.policy.summarize_max_attempts,
            || self.summarizer.summarize(document, &directive),
        )
        .await?;
        state.summary = Some(summary);
        state.advance(Phase::Summarized)?;

        // SUMMARIZED -> DELIVERED: per-channel isolation lives in the
        // dispatcher; one channel's failure never blocks another.
        let receipts = match (state.document.as_ref(), state.summary.as_ref()) {
            (Some(document), Some(summary)) => {
                self.dispatcher
                    .deliver(document, summary, directive.destination_scope)
                    .await
            }
            _ => Vec::new(),
        };
        state.receipts = receipts;

        if state.receipts.is_empty() {
            return Err(BotError::Delivery(
                "no destination channels configured".to_string(),
            ));
        }
        if state
            .receipts
            .iter()
            .all(|r| r.status == DeliveryStatus::Failed)
        {
            return Err(BotError::Delivery(
                "no channel received the summary".to_string(),
            ));
        }

        state.advance(Phase::Delivered)?;
        state.advance(Phase::Done)?;
        Ok(())
    }

    async fn handle_failure(&self, state: &mut RunState, error: &BotError) {
        error!(
            run_id = %state.run_id,
            phase = state.phase.name(),
            error = %error,
            "Run failed"
        );
        let delivery_reached = state.delivery_reached();
        state.fail(error);

        if delivery_reached {
            let sent = state
                .receipts
                .iter()
                .filter(|r| r.status == DeliveryStatus::Sent)
                .count();
            warn!(
                run_id = %state.run_id,
                sent,
                total = state.receipts.len(),
                "Partial delivery outcome recorded"
            );
            return;
        }

        // Delivery was never reached: best-effort user-visible notice.
        let notice = failure_notice(error);
        let receipts = self.dispatcher.notify_failure(&notice).await;
        if receipts.iter().all(|r| r.status == DeliveryStatus::Failed) {
            error!(run_id = %state.run_id, "Failure notice could not be delivered");
        }
    }
}

fn failure_notice(error: &BotError) -> String {
    match error {
        BotError::MissingUrl => {
            "요약할 URL을 찾지 못했어요. 링크와 함께 멘션해 주세요.".to_string()
        }
        BotError::Extraction { .. } => {
            "콘텐츠를 가져오지 못해 요약을 만들지 못했어요. 링크를 확인하고 다시 시도해 주세요."
                .to_string()
        }
        BotError::Summarization { .. } => {
            "요약 생성에 실패했어요. 잠시 후 다시 시도해 주세요.".to_string()
        }
        BotError::RunTimeout(secs) => {
            format!("요약 작업이 {secs}초 제한을 넘겨 중단되었어요. 다시 시도해 주세요.")
        }
        _ => "요청을 처리하는 중 문제가 발생했어요. 잠시 후 다시 시도해 주세요.".to_string(),
    }
}
