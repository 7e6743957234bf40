use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{SagaId, Version};
use uuid::Uuid;

use crate::error::Result;
use crate::model::{OutboxMessage, OutboxStatus, SagaStatus};

/// Capability every outbox table (payment-outbox, approval-outbox, and each
/// service's response-outbox) offers. One table, one `OutboxRepository`
/// instance; the saga engine and the sweepers never reach for the
/// connection pool directly.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Inserts a brand-new row. For a response-side dedupe insert this is
    /// also the idempotency check: a unique violation on `(saga_id,
    /// saga_status)` surfaces as `OutboxError::DedupeConflict`, not as a
    /// generic database error, so callers can match on it and no-op.
    async fn insert(&self, message: &OutboxMessage) -> Result<()>;

    /// Rows ready for the outbound sweeper, oldest first.
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<OutboxMessage>>;

    /// Transitions a row's status under CAS on `version`. Returns `true` if
    /// this caller's write won the race, `false` if another writer already
    /// advanced the row (optimistic-lock conflict — a silent no-op for the
    /// loser, not an error).
    async fn update_status(
        &self,
        id: Uuid,
        expected_version: Version,
        saga_status: SagaStatus,
        outbox_status: OutboxStatus,
        processed_at: Option<DateTime<Utc>>,
    ) -> Result<bool>;

    /// Records a failed publish attempt: increments `retry_count`, leaving
    /// the row `STARTED` so the next sweep picks it up again. The sweeper
    /// itself is responsible for transitioning a row to `FAILED` once its
    /// `retry_count` exceeds the configured ceiling.
    async fn mark_retry(&self, id: Uuid, expected_version: Version) -> Result<bool>;

    /// Deletes `COMPLETED` rows older than `retention`; `FAILED` rows are
    /// never deleted by this path.
    async fn delete_completed_older_than(&self, retention: Duration) -> Result<u64>;

    /// Fetches a single row by `(saga_id, saga_status)`, used by the saga
    /// engine to locate the row it is about to transition.
    async fn find_by_saga(
        &self,
        saga_id: SagaId,
        saga_status: SagaStatus,
    ) -> Result<Option<OutboxMessage>>;
}
