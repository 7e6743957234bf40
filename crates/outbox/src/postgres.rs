use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{SagaId, Version};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{OutboxError, Result};
use crate::model::{OutboxMessage, OutboxStatus, SagaStatus};
use crate::repository::OutboxRepository;

fn parse_saga_status(s: &str) -> SagaStatus {
    match s {
        "STARTED" => SagaStatus::Started,
        "PROCESSING" => SagaStatus::Processing,
        "SUCCEEDED" => SagaStatus::Succeeded,
        "COMPENSATING" => SagaStatus::Compensating,
        "COMPENSATED" => SagaStatus::Compensated,
        _ => SagaStatus::Failed,
    }
}

fn parse_outbox_status(s: &str) -> OutboxStatus {
    match s {
        "STARTED" => OutboxStatus::Started,
        "COMPLETED" => OutboxStatus::Completed,
        _ => OutboxStatus::Failed,
    }
}

fn row_to_message(row: PgRow) -> Result<OutboxMessage> {
    Ok(OutboxMessage {
        id: row.try_get("id")?,
        saga_id: SagaId::from_uuid(row.try_get::<Uuid, _>("saga_id")?),
        created_at: row.try_get("created_at")?,
        processed_at: row.try_get("processed_at")?,
        message_type: row.try_get("message_type")?,
        payload: row.try_get("payload")?,
        order_status: row.try_get("order_status")?,
        saga_status: parse_saga_status(row.try_get::<&str, _>("saga_status")?),
        outbox_status: parse_outbox_status(row.try_get::<&str, _>("outbox_status")?),
        retry_count: row.try_get("retry_count")?,
        version: Version::new(row.try_get("version")?),
    })
}

/// Generic outbox table adapter. One instance per table (e.g.
/// `payment_outbox`, `approval_response_outbox`); the table name is
/// trusted, compile-time-chosen input, never user data, so interpolating it
/// into the SQL text is safe.
pub struct PostgresOutboxRepository {
    pool: PgPool,
    table: &'static str,
}

impl PostgresOutboxRepository {
    pub fn new(pool: PgPool, table: &'static str) -> Self {
        Self { pool, table }
    }
}

#[async_trait]
impl OutboxRepository for PostgresOutboxRepository {
    async fn insert(&self, message: &OutboxMessage) -> Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {table}
                (id, saga_id, created_at, processed_at, message_type, payload,
                 order_status, saga_status, outbox_status, retry_count, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
            table = self.table
        );

        sqlx::query(&sql)
            .bind(message.id)
            .bind(message.saga_id.as_uuid())
            .bind(message.created_at)
            .bind(message.processed_at)
            .bind(&message.message_type)
            .bind(&message.payload)
            .bind(&message.order_status)
            .bind(message.saga_status.as_str())
            .bind(message.outbox_status.as_str())
            .bind(message.retry_count)
            .bind(message.version.value())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint().is_some_and(|c| c.contains("saga"))
                {
                    return OutboxError::DedupeConflict {
                        saga_id: message.saga_id.as_uuid(),
                        saga_status: message.saga_status.to_string(),
                    };
                }
                OutboxError::Database(e)
            })?;
        Ok(())
    }

    async fn fetch_pending(&self, limit: i64) -> Result<Vec<OutboxMessage>> {
        let sql = format!(
            "SELECT * FROM {table} WHERE outbox_status = 'STARTED' ORDER BY created_at ASC LIMIT $1",
            table = self.table
        );
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_message).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected_version: Version,
        saga_status: SagaStatus,
        outbox_status: OutboxStatus,
        processed_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let sql = format!(
            r#"
            UPDATE {table}
            SET saga_status = $1, outbox_status = $2, processed_at = $3, version = version + 1
            WHERE id = $4 AND version = $5
            "#,
            table = self.table
        );
        let result = sqlx::query(&sql)
            .bind(saga_status.as_str())
            .bind(outbox_status.as_str())
            .bind(processed_at)
            .bind(id)
            .bind(expected_version.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_retry(&self, id: Uuid, expected_version: Version) -> Result<bool> {
        let sql = format!(
            r#"
            UPDATE {table}
            SET outbox_status = 'STARTED', retry_count = retry_count + 1, version = version + 1
            WHERE id = $1 AND version = $2
            "#,
            table = self.table
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(expected_version.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_completed_older_than(&self, retention: Duration) -> Result<u64> {
        let cutoff = Utc::now() - retention;
        let sql = format!(
            "DELETE FROM {table} WHERE outbox_status = 'COMPLETED' AND processed_at < $1",
            table = self.table
        );
        let result = sqlx::query(&sql).bind(cutoff).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn find_by_saga(
        &self,
        saga_id: SagaId,
        saga_status: SagaStatus,
    ) -> Result<Option<OutboxMessage>> {
        let sql = format!(
            "SELECT * FROM {table} WHERE saga_id = $1 AND saga_status = $2",
            table = self.table
        );
        let row = sqlx::query(&sql)
            .bind(saga_id.as_uuid())
            .bind(saga_status.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_message).transpose()
    }
}
