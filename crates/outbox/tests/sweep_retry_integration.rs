use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::SagaId;
use messaging::MessagingError;
use outbox::{InMemoryOutboxRepository, OutboxMessage, OutboxRepository, OutboxStatus, SagaStatus, SweeperConfig, sweep_once};

/// A `LogPort` that fails its first `fail_count` publishes, then succeeds —
/// for exercising the sweeper's retry path without a real broker.
struct FlakyLog {
    fail_count: usize,
    attempts: AtomicUsize,
}

impl FlakyLog {
    fn new(fail_count: usize) -> Self {
        Self {
            fail_count,
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl messaging::LogPort for FlakyLog {
    async fn publish(&self, _topic: &str, _key: &str, _payload: Vec<u8>) -> messaging::Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_count {
            return Err(MessagingError::Publish("simulated broker outage".to_string()));
        }
        Ok(())
    }
}

/// A row that fails to publish twice is retried and eventually completes,
/// rather than vanishing from the pending set after its first failure.
#[tokio::test]
async fn failed_publish_is_retried_until_it_succeeds() {
    let repo = InMemoryOutboxRepository::new();
    let log = FlakyLog::new(2);
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
        poll_interval: Duration::from_millis(1),
        batch_size: 10,
        max_retries: 10,
    };

    assert_eq!(sweep_once(&repo, &log, &config).await.unwrap(), 0);
    assert_eq!(repo.snapshot()[0].outbox_status, OutboxStatus::Started);
    assert_eq!(repo.snapshot()[0].retry_count, 1);

    assert_eq!(sweep_once(&repo, &log, &config).await.unwrap(), 0);
    assert_eq!(repo.snapshot()[0].retry_count, 2);

    assert_eq!(sweep_once(&repo, &log, &config).await.unwrap(), 1);
    assert_eq!(repo.snapshot()[0].outbox_status, OutboxStatus::Completed);
}

/// A row whose retry count has exhausted the configured ceiling is marked
/// `FAILED` and stops being handed to the sweeper on subsequent ticks.
#[tokio::test]
async fn exhausted_row_is_marked_failed_and_stops_recurring() {
    let repo = InMemoryOutboxRepository::new();
    let log = FlakyLog::new(usize::MAX);
    let saga_id = SagaId::new();
    let row = OutboxMessage::new_started(
        saga_id,
        "PAY",
        serde_json::json!({}),
        "PENDING",
        SagaStatus::Started,
        Utc::now(),
    );
    repo.insert(&row).await.unwrap();

    let config = SweeperConfig {
        topic: "payment-request",
        poll_interval: Duration::from_millis(1),
        batch_size: 10,
        max_retries: 2,
    };

    for _ in 0..2 {
        sweep_once(&repo, &log, &config).await.unwrap();
    }
    assert_eq!(repo.snapshot()[0].outbox_status, OutboxStatus::Started);
    assert_eq!(repo.snapshot()[0].retry_count, 2);

    // A third tick sees retry_count >= max_retries and marks the row FAILED
    // rather than attempting to publish it again.
    let published = sweep_once(&repo, &log, &config).await.unwrap();
    assert_eq!(published, 0);
    assert_eq!(repo.snapshot()[0].outbox_status, OutboxStatus::Failed);

    // And a fourth tick no longer even sees it, since fetch_pending only
    // returns STARTED rows.
    let published = sweep_once(&repo, &log, &config).await.unwrap();
    assert_eq!(published, 0);
}
