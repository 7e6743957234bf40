use std::time::Duration;

use async_trait::async_trait;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::{ClientConfig, Message, TopicPartitionList};

use crate::error::{MessagingError, Result};
use crate::port::{ConsumedMessage, LogConsumer, LogPort};

/// Publisher adapter backed by a real partitioned log. Idempotence and
/// bounded retries are enabled at the producer level so a transient broker
/// hiccup does not itself duplicate a publish; the outbox sweeper layer
/// above still owns retry-on-failure for the CAS/status bookkeeping.
pub struct KafkaLogPort {
    producer: FutureProducer,
}

impl KafkaLogPort {
    pub fn new(brokers: &str) -> Result<Self> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("retries", "3")
            .set("max.in.flight.requests.per.connection", "5")
            .set("message.timeout.ms", "30000")
            .create()
            .map_err(|e| MessagingError::Publish(e.to_string()))?;
        Ok(Self { producer })
    }
}

#[async_trait]
impl LogPort for KafkaLogPort {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(&payload);
        self.producer
            .send(record, Duration::from_secs(10))
            .await
            .map_err(|(err, _msg)| MessagingError::Publish(err.to_string()))?;
        Ok(())
    }
}

/// Consumer adapter. One `StreamConsumer` per logical worker; the caller is
/// expected to run `poll_batch` in a loop and `commit` only after the
/// corresponding handling transaction (domain mutation + outbox write) has
/// already committed locally.
pub struct KafkaLogConsumer {
    consumer: StreamConsumer,
}

impl KafkaLogConsumer {
    pub fn new(brokers: &str, group_id: &str, topics: &[&str]) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|e| MessagingError::Poll(e.to_string()))?;
        consumer
            .subscribe(topics)
            .map_err(|e| MessagingError::Poll(e.to_string()))?;
        Ok(Self { consumer })
    }
}

#[async_trait]
impl LogConsumer for KafkaLogConsumer {
    async fn poll_batch(&self, _topic: &str, max: usize) -> Result<Vec<ConsumedMessage>> {
        let mut batch = Vec::with_capacity(max);
        for _ in 0..max {
            let timeout = tokio::time::timeout(Duration::from_millis(500), self.consumer.recv()).await;
            let Ok(received) = timeout else {
                break;
            };
            let msg = received.map_err(|e| MessagingError::Poll(e.to_string()))?;
            let payload = msg.payload().unwrap_or_default().to_vec();
            let key = msg
                .key()
                .map(|k| String::from_utf8_lossy(k).into_owned())
                .unwrap_or_default();
            batch.push(ConsumedMessage {
                topic: msg.topic().to_string(),
                key,
                payload,
                offset: msg.offset(),
                partition: msg.partition(),
            });
        }
        Ok(batch)
    }

    async fn commit(&self, message: &ConsumedMessage) -> Result<()> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(
            &message.topic,
            message.partition,
            rdkafka::Offset::Offset(message.offset + 1),
        )
        .map_err(|e| MessagingError::Commit(e.to_string()))?;
        self.consumer
            .commit(&tpl, rdkafka::consumer::CommitMode::Async)
            .map_err(|e| MessagingError::Commit(e.to_string()))
    }
}
