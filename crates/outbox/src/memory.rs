use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{SagaId, Version};
use uuid::Uuid;

use crate::error::{OutboxError, Result};
use crate::model::{OutboxMessage, OutboxStatus, SagaStatus};
use crate::repository::OutboxRepository;

/// In-memory outbox table, for unit tests of the saga engine and the
/// sweepers without a database.
#[derive(Default)]
pub struct InMemoryOutboxRepository {
    rows: Mutex<Vec<OutboxMessage>>,
}

impl InMemoryOutboxRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<OutboxMessage> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutboxRepository for InMemoryOutboxRepository {
    async fn insert(&self, message: &OutboxMessage) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.saga_id == message.saga_id && r.saga_status == message.saga_status)
        {
            return Err(OutboxError::DedupeConflict {
                saga_id: message.saga_id.as_uuid(),
                saga_status: message.saga_status.to_string(),
            });
        }
        rows.push(message.clone());
        Ok(())
    }

    async fn fetch_pending(&self, limit: i64) -> Result<Vec<OutboxMessage>> {
        let rows = self.rows.lock().unwrap();
        let mut pending: Vec<_> = rows
            .iter()
            .filter(|r| r.outbox_status == OutboxStatus::Started)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected_version: Version,
        saga_status: SagaStatus,
        outbox_status: OutboxStatus,
        processed_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == id && r.version == expected_version)
        {
            row.saga_status = saga_status;
            row.outbox_status = outbox_status;
            row.processed_at = processed_at;
            row.version = row.version.next();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn mark_retry(&self, id: Uuid, expected_version: Version) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows
            .iter_mut()
            .find(|r| r.id == id && r.version == expected_version)
        {
            row.outbox_status = OutboxStatus::Started;
            row.retry_count += 1;
            row.version = row.version.next();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_completed_older_than(&self, retention: Duration) -> Result<u64> {
        let cutoff = Utc::now() - retention;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| {
            !(r.outbox_status == OutboxStatus::Completed
                && r.processed_at.is_some_and(|p| p < cutoff))
        });
        Ok((before - rows.len()) as u64)
    }

    async fn find_by_saga(
        &self,
        saga_id: SagaId,
        saga_status: SagaStatus,
    ) -> Result<Option<OutboxMessage>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.saga_id == saga_id && r.saga_status == saga_status)
            .cloned())
    }
}
