use std::sync::Arc;
use std::time::Duration;

use messaging::{ApprovalResponse, CustomerModel, LogConsumer, PaymentResponse, topics};

use crate::replica_store::{CustomerReplicaRepository, RestaurantReplicaRepository};
use crate::saga::SagaEngine;
use crate::store::SagaStore;

/// Runs one poll-handle-commit loop against `topic`, applying `handle` to
/// each deserialized message. A deserialization failure is the poison-
/// message case (§7): logged and the offset still advanced, rather than
/// blocking the partition forever on one bad payload.
async fn run_consumer_loop<T, F, Fut>(
    consumer: Arc<dyn LogConsumer>,
    topic: &'static str,
    batch_size: usize,
    handle: F,
) where
    T: serde::de::DeserializeOwned,
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = anyhow_like::Result<()>>,
{
    loop {
        let batch = match consumer.poll_batch(topic, batch_size).await {
            Ok(batch) => batch,
            Err(err) => {
                tracing::error!(topic, error = %err, "log poll failed");
                tokio::time::sleep(Duration::from_millis(500)).await;
                continue;
            }
        };

        if batch.is_empty() {
            tokio::time::sleep(Duration::from_millis(200)).await;
            continue;
        }

        for message in &batch {
            match serde_json::from_slice::<T>(&message.payload) {
                Ok(decoded) => {
                    if let Err(err) = handle(decoded).await {
                        tracing::error!(topic, error = %err, "consumer handler failed, message left for redelivery");
                        continue;
                    }
                }
                Err(err) => {
                    tracing::warn!(topic, error = %err, "poison message skipped");
                }
            }

            if let Err(err) = consumer.commit(message).await {
                tracing::error!(topic, error = %err, "commit failed");
            }
        }
    }
}

/// A tiny `anyhow`-shaped alias so `run_consumer_loop` can stay generic over
/// the saga engine's own `Result` without this crate taking a dependency on
/// `anyhow` just for one internal helper.
mod anyhow_like {
    pub type Result<T> = std::result::Result<T, crate::error::SagaError>;
}

pub fn spawn_payment_response_consumer<S, R, C>(
    consumer: Arc<dyn LogConsumer>,
    engine: Arc<SagaEngine<S, R, C>>,
    batch_size: usize,
) -> tokio::task::JoinHandle<()>
where
    S: SagaStore + 'static,
    R: RestaurantReplicaRepository + 'static,
    C: CustomerReplicaRepository + 'static,
{
    tokio::spawn(async move {
        run_consumer_loop::<PaymentResponse, _, _>(
            consumer,
            topics::PAYMENT_RESPONSE,
            batch_size,
            move |response| {
                let engine = engine.clone();
                async move { engine.handle_payment_response(response).await }
            },
        )
        .await;
    })
}

pub fn spawn_approval_response_consumer<S, R, C>(
    consumer: Arc<dyn LogConsumer>,
    engine: Arc<SagaEngine<S, R, C>>,
    batch_size: usize,
) -> tokio::task::JoinHandle<()>
where
    S: SagaStore + 'static,
    R: RestaurantReplicaRepository + 'static,
    C: CustomerReplicaRepository + 'static,
{
    tokio::spawn(async move {
        run_consumer_loop::<ApprovalResponse, _, _>(
            consumer,
            topics::RESTAURANT_APPROVAL_RESPONSE,
            batch_size,
            move |response| {
                let engine = engine.clone();
                async move { engine.handle_approval_response(response).await }
            },
        )
        .await;
    })
}

/// Keeps the local customer replica current. Has no saga role: it just
/// upserts the replica row so a subsequent `create_order` can find it.
pub fn spawn_customer_replica_consumer<Rep>(
    consumer: Arc<dyn LogConsumer>,
    replica: Arc<Rep>,
    batch_size: usize,
) -> tokio::task::JoinHandle<()>
where
    Rep: CustomerReplicaRepository + 'static,
{
    tokio::spawn(async move {
        run_consumer_loop::<CustomerModel, _, _>(
            consumer,
            topics::CUSTOMER,
            batch_size,
            move |model| {
                let replica = replica.clone();
                async move {
                    let entry = order_domain::CustomerReplicaEntry {
                        id: model.id,
                        username: model.username,
                        first_name: model.first_name,
                        last_name: model.last_name,
                    };
                    replica.upsert(&entry).await
                }
            },
        )
        .await;
    })
}
