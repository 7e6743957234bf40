use async_trait::async_trait;

use crate::error::Result;

/// A message read back off the log, with enough metadata for the consumer to
/// acknowledge it once handling (including any outbox write) has committed.
#[derive(Debug, Clone)]
pub struct ConsumedMessage {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
    /// Broker-assigned offset, opaque to callers; only used to `commit`.
    pub offset: i64,
    pub partition: i32,
}

/// The publish half of the partitioned, ordered, at-least-once log. `key` is
/// the partition key — for every saga-scoped topic this is the saga id, so
/// that all messages for one saga are routed to, and applied from, the same
/// partition.
#[async_trait]
pub trait LogPort: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<()>;
}

/// The subscribe half. A poll returns a batch (possibly empty); the caller
/// commits each message only after its handling transaction (including any
/// outbox write) has committed, so a crash between poll and commit causes
/// redelivery rather than loss — at-least-once, not exactly-once, which is
/// why every consumer on this system must be idempotent.
#[async_trait]
pub trait LogConsumer: Send + Sync {
    async fn poll_batch(&self, topic: &str, max: usize) -> Result<Vec<ConsumedMessage>>;
    async fn commit(&self, message: &ConsumedMessage) -> Result<()>;
}
