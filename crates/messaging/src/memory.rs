use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::port::{ConsumedMessage, LogConsumer, LogPort};

/// In-process test double for the log port. Preserves per-key (i.e.
/// per-saga) FIFO order by appending to a single shared queue per topic and
/// never reordering within a key; cross-key ordering is intentionally
/// whatever arrival order produced, matching the "cross-saga order is
/// undefined" guarantee of the real log.
#[derive(Default)]
pub struct InMemoryLog {
    topics: Mutex<std::collections::HashMap<String, VecDeque<ConsumedMessage>>>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self, topic: &str) -> Vec<ConsumedMessage> {
        self.topics
            .lock()
            .unwrap()
            .get_mut(topic)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LogPort for InMemoryLog {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<()> {
        let mut topics = self.topics.lock().unwrap();
        let queue = topics.entry(topic.to_string()).or_default();
        let offset = queue.len() as i64;
        queue.push_back(ConsumedMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            payload,
            offset,
            partition: 0,
        });
        Ok(())
    }
}

#[async_trait]
impl LogConsumer for InMemoryLog {
    async fn poll_batch(&self, topic: &str, max: usize) -> Result<Vec<ConsumedMessage>> {
        let mut topics = self.topics.lock().unwrap();
        let queue = topics.entry(topic.to_string()).or_default();
        let n = max.min(queue.len());
        Ok(queue.drain(..n).collect())
    }

    async fn commit(&self, _message: &ConsumedMessage) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_poll_preserves_order_per_key() {
        let log = InMemoryLog::new();
        log.publish("payment-request", "saga-1", b"first".to_vec())
            .await
            .unwrap();
        log.publish("payment-request", "saga-1", b"second".to_vec())
            .await
            .unwrap();

        let batch = log.poll_batch("payment-request", 10).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].payload, b"first");
        assert_eq!(batch[1].payload, b"second");
    }

    #[tokio::test]
    async fn poll_batch_respects_max() {
        let log = InMemoryLog::new();
        for i in 0..5 {
            log.publish("customer", "c", vec![i]).await.unwrap();
        }
        let batch = log.poll_batch("customer", 2).await.unwrap();
        assert_eq!(batch.len(), 2);
    }
}
