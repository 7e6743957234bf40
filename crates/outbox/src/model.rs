use chrono::{DateTime, Utc};
use common::{SagaId, Version};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of the saga as observed through this outbox row. Distinct from
/// `OutboxStatus`, which tracks whether *this row* has been published, not
/// where the overall saga has gotten to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SagaStatus {
    Started,
    Processing,
    Succeeded,
    Compensating,
    Compensated,
    Failed,
}

impl SagaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Started => "STARTED",
            SagaStatus::Processing => "PROCESSING",
            SagaStatus::Succeeded => "SUCCEEDED",
            SagaStatus::Compensating => "COMPENSATING",
            SagaStatus::Compensated => "COMPENSATED",
            SagaStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether this particular row has made it onto the log yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxStatus {
    Started,
    Completed,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Started => "STARTED",
            OutboxStatus::Completed => "COMPLETED",
            OutboxStatus::Failed => "FAILED",
        }
    }
}

/// One row of a transactional outbox table. Written inside the same local
/// transaction as the domain-state mutation that produced it (outbound
/// side), or inside the same transaction as the dedupe-and-apply of an
/// inbound response (inbound side, where it doubles as the idempotency
/// record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub saga_id: SagaId,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub message_type: String,
    pub payload: serde_json::Value,
    pub order_status: String,
    pub saga_status: SagaStatus,
    pub outbox_status: OutboxStatus,
    pub retry_count: i32,
    pub version: Version,
}

impl OutboxMessage {
    /// Builds a new row in its initial, unpublished state. Callers insert
    /// this in the same transaction as the domain mutation that justifies
    /// it.
    pub fn new_started(
        saga_id: SagaId,
        message_type: impl Into<String>,
        payload: serde_json::Value,
        order_status: impl Into<String>,
        saga_status: SagaStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            saga_id,
            created_at,
            processed_at: None,
            message_type: message_type.into(),
            payload,
            order_status: order_status.into(),
            saga_status,
            outbox_status: OutboxStatus::Started,
            retry_count: 0,
            version: Version::INITIAL,
        }
    }
}
