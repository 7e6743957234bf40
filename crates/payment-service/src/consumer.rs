use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use messaging::{LogConsumer, PaymentOrderStatus, PaymentRequest, PaymentResponse, PaymentStatus, topics};

use crate::error::Result;
use crate::store::{PaymentStore, StepOutcome};

/// Applies one inbound `PaymentRequest`: a `PENDING` request debits the
/// customer's credit history, a `CANCELLED` request credits it back. The
/// store implementation is responsible for the dedupe insert that makes
/// redelivery of the same request a no-op.
pub async fn handle_payment_request<S: PaymentStore>(store: &S, request: PaymentRequest) -> Result<()> {
    let outcome = match request.payment_order_status {
        PaymentOrderStatus::Pending => {
            let success = PaymentResponse {
                saga_id: request.saga_id,
                customer_id: request.customer_id,
                order_id: request.order_id,
                price: request.price,
                created_at: Utc::now(),
                payment_status: PaymentStatus::Completed,
                failure_messages: vec![],
            };
            let failure = PaymentResponse {
                saga_id: request.saga_id,
                customer_id: request.customer_id,
                order_id: request.order_id,
                price: request.price,
                created_at: Utc::now(),
                payment_status: PaymentStatus::Failed,
                failure_messages: vec!["Customer has no enough credit".to_string()],
            };
            store
                .apply_debit(
                    request.saga_id,
                    request.customer_id,
                    common::Money::new(request.price),
                    success,
                    failure,
                )
                .await?
        }
        PaymentOrderStatus::Cancelled => {
            let response = PaymentResponse {
                saga_id: request.saga_id,
                customer_id: request.customer_id,
                order_id: request.order_id,
                price: request.price,
                created_at: Utc::now(),
                payment_status: PaymentStatus::Cancelled,
                failure_messages: vec![],
            };
            store
                .apply_credit(
                    request.saga_id,
                    request.customer_id,
                    common::Money::new(request.price),
                    response,
                )
                .await?
        }
    };

    match outcome {
        StepOutcome::Applied => {
            metrics::counter!("payment_request_total", "outcome" => "applied").increment(1);
        }
        StepOutcome::Stale => {
            tracing::info!("dropped duplicate payment request");
            metrics::counter!("outbox_dedupe_noop_total", "topic" => topics::PAYMENT_REQUEST)
                .increment(1);
        }
    }
    Ok(())
}

pub fn spawn_payment_request_consumer<S>(
    consumer: Arc<dyn LogConsumer>,
    store: Arc<S>,
    batch_size: usize,
) -> tokio::task::JoinHandle<()>
where
    S: PaymentStore + 'static,
{
    tokio::spawn(async move {
        loop {
            let batch = match consumer.poll_batch(topics::PAYMENT_REQUEST, batch_size).await {
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
                match serde_json::from_slice::<PaymentRequest>(&message.payload) {
                    Ok(request) => {
                        if let Err(err) = handle_payment_request(store.as_ref(), request).await {
                            tracing::error!(error = %err, "payment request handler failed, message left for redelivery");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryPaymentStore;
    use common::{CustomerId, Money, OrderId};
    use std::str::FromStr;

    fn sample_request(status: PaymentOrderStatus) -> PaymentRequest {
        PaymentRequest {
            saga_id: OrderId::new(),
            customer_id: CustomerId::new(),
            order_id: OrderId::new(),
            price: rust_decimal::Decimal::from_str("200").unwrap(),
            created_at: Utc::now(),
            payment_order_status: status,
        }
    }

    #[tokio::test]
    async fn pending_request_with_credit_completes() {
        let store = InMemoryPaymentStore::new();
        let request = sample_request(PaymentOrderStatus::Pending);
        store.seed_credit(request.customer_id, Money::from_str("200").unwrap());
        handle_payment_request(&store, request).await.unwrap();
        let rows = store.response_outbox_snapshot();
        let payload: PaymentResponse = serde_json::from_value(rows[0].payload.clone()).unwrap();
        assert_eq!(payload.payment_status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn pending_request_without_credit_fails() {
        let store = InMemoryPaymentStore::new();
        let request = sample_request(PaymentOrderStatus::Pending);
        handle_payment_request(&store, request).await.unwrap();
        let rows = store.response_outbox_snapshot();
        let payload: PaymentResponse = serde_json::from_value(rows[0].payload.clone()).unwrap();
        assert_eq!(payload.payment_status, PaymentStatus::Failed);
        assert_eq!(payload.failure_messages, vec!["Customer has no enough credit"]);
    }

    #[tokio::test]
    async fn cancelled_request_credits_back() {
        let store = InMemoryPaymentStore::new();
        let request = sample_request(PaymentOrderStatus::Cancelled);
        handle_payment_request(&store, request).await.unwrap();
        let rows = store.response_outbox_snapshot();
        let payload: PaymentResponse = serde_json::from_value(rows[0].payload.clone()).unwrap();
        assert_eq!(payload.payment_status, PaymentStatus::Cancelled);
    }
}
