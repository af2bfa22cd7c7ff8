//! Time-bounded idempotency ledger keyed by Slack event id.
//!
//! Slack's delivery model retries and duplicates event callbacks, and two
//! duplicate deliveries may race, so the claim must be a single atomic
//! check-and-set rather than a read-then-write. Expired records are logically
//! absent; reprocessing after expiry is a retention policy, not a bug.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::info;

use crate::errors::BotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Accepted,
    Duplicate,
}

#[async_trait]
pub trait DedupLedger: Send + Sync {
    /// Atomically claim `event_id`. Exactly one concurrent claimant within the
    /// TTL window receives `Accepted`; all others receive `Duplicate`.
    async fn claim(&self, event_id: &str) -> Result<Claim, BotError>;
}

fn epoch_secs() -> Result<u64, BotError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| BotError::ConfigError(format!("System clock before epoch: {e}")))
}

/// Production ledger backed by a DynamoDB table with a conditional `PutItem`.
pub struct DynamoDedupLedger {
    client: DynamoDbClient,
    table_name: String,
    ttl_secs: u64,
}

impl DynamoDedupLedger {
    #[must_use]
    pub fn new(client: DynamoDbClient, table_name: String, ttl_secs: u64) -> Self {
        Self {
            client,
            table_name,
            ttl_secs,
        }
    }
}

#[async_trait]
impl DedupLedger for DynamoDedupLedger {
    async fn claim(&self, event_id: &str) -> Result<Claim, BotError> {
        let now = epoch_secs()?;
        let expires_at = now + self.ttl_secs;

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item("event_id", AttributeValue::S(event_id.to_string()))
            .item("expires_at", AttributeValue::N(expires_at.to_string()))
            .condition_expression("attribute_not_exists(event_id) OR expires_at < :now")
            .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(Claim::Accepted),
            Err(e) => {
                let is_condition_failure = e
                    .as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception());
                if is_condition_failure {
                    info!(event_id = %event_id, "Duplicate event delivery detected");
                    Ok(Claim::Duplicate)
                } else {
                    Err(BotError::AwsError(format!("dynamodb put_item: {e}")))
                }
            }
        }
    }
}

/// In-process ledger with identical claim semantics. The whole check-and-set
/// happens under one lock hold, so concurrent duplicates cannot both win.
pub struct InMemoryDedupLedger {
    entries: Mutex<HashMap<String, u64>>,
    ttl_secs: u64,
}

impl InMemoryDedupLedger {
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_secs,
        }
    }

    /// Clock-injected claim used by `claim` and tests.
    pub fn claim_at(&self, event_id: &str, now_secs: u64) -> Claim {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match entries.get(event_id) {
            Some(expires_at) if *expires_at >= now_secs => Claim::Duplicate,
            _ => {
                entries.insert(event_id.to_string(), now_secs + self.ttl_secs);
                Claim::Accepted
            }
        }
    }
}

#[async_trait]
impl DedupLedger for InMemoryDedupLedger {
    async fn claim(&self, event_id: &str) -> Result<Claim, BotError> {
        let now = epoch_secs()?;
        Ok(self.claim_at(event_id, now))
    }
}
