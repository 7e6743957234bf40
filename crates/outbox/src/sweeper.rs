use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use messaging::LogPort;

use crate::error::Result;
use crate::model::{OutboxMessage, OutboxStatus};
use crate::repository::OutboxRepository;

/// Configuration for one sweeper tick loop. One of these per outbox table,
/// matching the "fixed-delay tick loop per outbox table" design note.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub topic: &'static str,
    pub poll_interval: StdDuration,
    pub batch_size: i64,
    pub max_retries: i32,
}

impl SweeperConfig {
    pub fn new(topic: &'static str) -> Self {
        Self {
            topic,
            poll_interval: StdDuration::from_millis(
                std::env::var("OUTBOX_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1000),
            ),
            batch_size: std::env::var("OUTBOX_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            max_retries: std::env::var("OUTBOX_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }
}

/// Sweeps one batch of `STARTED` rows and publishes them. Returns the number
/// of rows this call successfully moved to `COMPLETED`.
///
/// The transaction that wrote the row has already committed by the time
/// this runs — publish always happens after commit, never inside it, per
/// the concurrency model.
#[tracing::instrument(skip(repo, log), fields(topic = config.topic))]
pub async fn sweep_once(
    repo: &dyn OutboxRepository,
    log: &dyn LogPort,
    config: &SweeperConfig,
) -> Result<usize> {
    let start = std::time::Instant::now();
    let pending = repo.fetch_pending(config.batch_size).await?;
    let mut published = 0usize;

    for row in &pending {
        if row.retry_count >= config.max_retries {
            tracing::warn!(
                saga_id = %row.saga_id,
                retry_count = row.retry_count,
                "outbox row exceeded max retries, marking FAILED for operator attention"
            );
            let _ = repo
                .update_status(row.id, row.version, row.saga_status, OutboxStatus::Failed, None)
                .await;
            continue;
        }

        match publish_row(repo, log, config.topic, row).await {
            Ok(()) => {
                published += 1;
                metrics::counter!("outbox_publish_total", "topic" => config.topic).increment(1);
            }
            Err(err) => {
                tracing::warn!(saga_id = %row.saga_id, error = %err, "outbox publish failed, will retry");
                let _ = repo.mark_retry(row.id, row.version).await;
                metrics::counter!("outbox_publish_failed_total", "topic" => config.topic)
                    .increment(1);
            }
        }
    }

    metrics::histogram!("outbox_sweep_duration_seconds", "topic" => config.topic)
        .record(start.elapsed().as_secs_f64());

    Ok(published)
}

async fn publish_row(
    repo: &dyn OutboxRepository,
    log: &dyn LogPort,
    topic: &str,
    row: &OutboxMessage,
) -> Result<()> {
    let payload = serde_json::to_vec(&row.payload)?;
    log.publish(topic, &row.saga_id.to_string(), payload)
        .await?;

    let won = repo
        .update_status(
            row.id,
            row.version,
            row.saga_status,
            OutboxStatus::Completed,
            Some(Utc::now()),
        )
        .await?;

    if !won {
        // Another sweeper instance already marked this row; our publish was
        // redundant but harmless because consumers are idempotent.
        tracing::debug!(saga_id = %row.saga_id, "lost status-update race on already-published row");
    }

    Ok(())
}

/// Runs `sweep_once` on a fixed-delay tick loop until the process exits.
/// Spawned once per outbox table at service startup.
pub fn spawn_sweeper(
    repo: Arc<dyn OutboxRepository>,
    log: Arc<dyn LogPort>,
    config: SweeperConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(err) = sweep_once(repo.as_ref(), log.as_ref(), &config).await {
                tracing::error!(topic = config.topic, error = %err, "outbox sweep cycle failed");
            }
            tokio::time::sleep(config.poll_interval).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryOutboxRepository;
    use crate::model::SagaStatus;
    use common::SagaId;
    use messaging::InMemoryLog;

    #[tokio::test]
    async fn sweep_publishes_started_rows_and_marks_completed() {
        let repo = InMemoryOutboxRepository::new();
        let log = InMemoryLog::new();
        let saga_id = SagaId::new();
        let row = OutboxMessage::new_started(
            saga_id,
            "PAY",
            serde_json::json!({"orderId": saga_id.to_string()}),
            "PENDING",
            SagaStatus::Started,
            Utc::now(),
        );
        repo.insert(&row).await.unwrap();

        let config = SweeperConfig {
            topic: "payment-request",
            poll_interval: StdDuration::from_millis(1),
            batch_size: 10,
            max_retries: 10,
        };
        let published = sweep_once(&repo, &log, &config).await.unwrap();
        assert_eq!(published, 1);

        let rows = repo.snapshot();
        assert_eq!(rows[0].outbox_status, OutboxStatus::Completed);
        assert!(rows[0].processed_at.is_some());

        let on_log = log.drain("payment-request");
        assert_eq!(on_log.len(), 1);
        assert_eq!(on_log[0].key, saga_id.to_string());
    }

    #[tokio::test]
    async fn rows_past_max_retries_are_skipped() {
        let repo = InMemoryOutboxRepository::new();
        let log = InMemoryLog::new();
        let saga_id = SagaId::new();
        let mut row = OutboxMessage::new_started(
            saga_id,
            "PAY",
            serde_json::json!({}),
            "PENDING",
            SagaStatus::Started,
            Utc::now(),
        );
        row.retry_count = 99;
        repo.insert(&row).await.unwrap();

        let config = SweeperConfig {
            topic: "payment-request",
            poll_interval: StdDuration::from_millis(1),
            batch_size: 10,
            max_retries: 10,
        };
        let published = sweep_once(&repo, &log, &config).await.unwrap();
        assert_eq!(published, 0);
        assert!(log.drain("payment-request").is_empty());
    }
}
