use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use common::{CustomerId, Money, OrderId};
use messaging::PaymentResponse;
use outbox::{OutboxMessage, OutboxStatus, SagaStatus};

use crate::credit_history::CreditHistory;
use crate::error::Result;
use crate::store::{PaymentStore, StepOutcome};

/// In-process double for the credit-history table and the response outbox,
/// for exercising the consumer logic in unit tests without a database.
#[derive(Default)]
pub struct InMemoryPaymentStore {
    histories: Mutex<HashMap<CustomerId, CreditHistory>>,
    response_outbox: Mutex<Vec<OutboxMessage>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response_outbox_snapshot(&self) -> Vec<OutboxMessage> {
        self.response_outbox.lock().unwrap().clone()
    }

    pub fn seed_credit(&self, customer_id: CustomerId, amount: Money) {
        let mut histories = self.histories.lock().unwrap();
        let history = histories
            .entry(customer_id)
            .or_insert_with(|| CreditHistory::new(customer_id));
        history.credit(amount);
    }

    fn already_recorded(&self, saga_id: OrderId, saga_status: SagaStatus) -> bool {
        self.response_outbox
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.saga_id == saga_id && r.saga_status == saga_status)
    }

    fn record(
        &self,
        saga_id: OrderId,
        message_type: &str,
        response: &PaymentResponse,
        saga_status: SagaStatus,
    ) -> Result<()> {
        let row = OutboxMessage::new_started(
            saga_id,
            message_type,
            serde_json::to_value(response)?,
            String::new(),
            saga_status,
            Utc::now(),
        );
        self.response_outbox.lock().unwrap().push(row);
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn apply_debit(
        &self,
        saga_id: OrderId,
        customer_id: CustomerId,
        amount: Money,
        response_on_success: PaymentResponse,
        response_on_failure: PaymentResponse,
    ) -> Result<StepOutcome> {
        if self.already_recorded(saga_id, SagaStatus::Processing) {
            return Ok(StepOutcome::Stale);
        }
        let mut histories = self.histories.lock().unwrap();
        let history = histories
            .entry(customer_id)
            .or_insert_with(|| CreditHistory::new(customer_id));

        let response = if history.debit(amount).is_ok() {
            response_on_success
        } else {
            response_on_failure
        };
        drop(histories);

        self.record(saga_id, "PAY", &response, SagaStatus::Processing)?;
        Ok(StepOutcome::Applied)
    }

    async fn apply_credit(
        &self,
        saga_id: OrderId,
        customer_id: CustomerId,
        amount: Money,
        response: PaymentResponse,
    ) -> Result<StepOutcome> {
        if self.already_recorded(saga_id, SagaStatus::Compensated) {
            return Ok(StepOutcome::Stale);
        }
        let mut histories = self.histories.lock().unwrap();
        let history = histories
            .entry(customer_id)
            .or_insert_with(|| CreditHistory::new(customer_id));
        history.credit(amount);
        drop(histories);

        self.record(saga_id, "CANCEL", &response, SagaStatus::Compensated)?;
        Ok(StepOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use messaging::PaymentStatus;
    use std::str::FromStr;

    fn sample_response(saga_id: OrderId, customer_id: CustomerId, status: PaymentStatus) -> PaymentResponse {
        PaymentResponse {
            saga_id,
            customer_id,
            order_id: saga_id,
            price: rust_decimal::Decimal::from_str("200").unwrap(),
            created_at: Utc::now(),
            payment_status: status,
            failure_messages: vec![],
        }
    }

    #[tokio::test]
    async fn debit_without_credit_produces_failure_response() {
        let store = InMemoryPaymentStore::new();
        let saga_id = OrderId::new();
        let customer_id = CustomerId::new();
        let outcome = store
            .apply_debit(
                saga_id,
                customer_id,
                Money::from_str("200").unwrap(),
                sample_response(saga_id, customer_id, PaymentStatus::Completed),
                sample_response(saga_id, customer_id, PaymentStatus::Failed),
            )
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Applied);
        let rows = store.response_outbox_snapshot();
        assert_eq!(rows.len(), 1);
        let payload: PaymentResponse = serde_json::from_value(rows[0].payload.clone()).unwrap();
        assert_eq!(payload.payment_status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn debit_with_sufficient_credit_succeeds() {
        let store = InMemoryPaymentStore::new();
        let saga_id = OrderId::new();
        let customer_id = CustomerId::new();
        store.seed_credit(customer_id, Money::from_str("200").unwrap());
        let outcome = store
            .apply_debit(
                saga_id,
                customer_id,
                Money::from_str("200").unwrap(),
                sample_response(saga_id, customer_id, PaymentStatus::Completed),
                sample_response(saga_id, customer_id, PaymentStatus::Failed),
            )
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Applied);
        let rows = store.response_outbox_snapshot();
        let payload: PaymentResponse = serde_json::from_value(rows[0].payload.clone()).unwrap();
        assert_eq!(payload.payment_status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn duplicate_debit_delivery_is_dropped_as_stale() {
        let store = InMemoryPaymentStore::new();
        let saga_id = OrderId::new();
        let customer_id = CustomerId::new();
        store.seed_credit(customer_id, Money::from_str("200").unwrap());
        for _ in 0..2 {
            store
                .apply_debit(
                    saga_id,
                    customer_id,
                    Money::from_str("200").unwrap(),
                    sample_response(saga_id, customer_id, PaymentStatus::Completed),
                    sample_response(saga_id, customer_id, PaymentStatus::Failed),
                )
                .await
                .unwrap();
        }
        assert_eq!(store.response_outbox_snapshot().len(), 1);
    }
}
