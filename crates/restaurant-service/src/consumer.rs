use std::sync::Arc;
use std::time::Duration;

use messaging::{ApprovalRequest, LogConsumer, topics};

use crate::error::Result;
use crate::store::{RequestedProduct, RestaurantStore, StepOutcome};

pub async fn handle_approval_request<S: RestaurantStore>(store: &S, request: ApprovalRequest) -> Result<()> {
    let requested = request
        .products
        .into_iter()
        .map(|p| RequestedProduct {
            id: p.id,
            quantity: p.quantity,
            price: common::Money::new(p.price),
        })
        .collect();

    let outcome = store
        .apply_approval_request(request.saga_id, request.order_id, request.restaurant_id, requested)
        .await?;

    match outcome {
        StepOutcome::Applied => {
            metrics::counter!("restaurant_approval_total", "outcome" => "applied").increment(1);
        }
        StepOutcome::Stale => {
            tracing::info!("dropped duplicate approval request");
            metrics::counter!("outbox_dedupe_noop_total", "topic" => topics::RESTAURANT_APPROVAL_REQUEST)
                .increment(1);
        }
    }
    Ok(())
}

pub fn spawn_approval_request_consumer<S>(
    consumer: Arc<dyn LogConsumer>,
    store: Arc<S>,
    batch_size: usize,
) -> tokio::task::JoinHandle<()>
where
    S: RestaurantStore + 'static,
{
    tokio::spawn(async move {
        loop {
            let batch = match consumer
                .poll_batch(topics::RESTAURANT_APPROVAL_REQUEST, batch_size)
                .await
            {
                Ok(batch) => batch,
                Err(err) => {
                    tracing::error!(error = %err, "log poll failed");
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    continue;
                }
            };

            if batch.is_empty() {
                tokio::time::sleep(Duration::from_millis(200)).await;
                continue;
            }

            for message in &batch {
                match serde_json::from_slice::<ApprovalRequest>(&message.payload) {
                    Ok(request) => {
                        if let Err(err) = handle_approval_request(store.as_ref(), request).await {
                            tracing::error!(error = %err, "approval request handler failed, message left for redelivery");
                            continue;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "poison message skipped");
                    }
                }
                if let Err(err) = consumer.commit(message).await {
                    tracing::error!(error = %err, "commit failed");
                }
            }
        }
    })
}
