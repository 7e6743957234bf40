use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use common::OrderId;
use order_domain::Order;
use outbox::{OutboxMessage, OutboxStatus, SagaStatus};
use serde_json::Value;

use crate::error::{Result, SagaError};
use crate::store::{SagaStore, StepOutcome};

/// In-process double for the Order service's three tables (orders,
/// payment_outbox, approval_outbox), for exercising the choreography
/// engine in unit tests without a database.
#[derive(Default)]
pub struct InMemorySagaStore {
    orders: Mutex<HashMap<OrderId, Order>>,
    payment_outbox: Mutex<Vec<OutboxMessage>>,
    approval_outbox: Mutex<Vec<OutboxMessage>>,
}

impl InMemorySagaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payment_outbox_snapshot(&self) -> Vec<OutboxMessage> {
        self.payment_outbox.lock().unwrap().clone()
    }

    pub fn approval_outbox_snapshot(&self) -> Vec<OutboxMessage> {
        self.approval_outbox.lock().unwrap().clone()
    }

    fn find_payment_row(&self, order_id: OrderId, status: SagaStatus) -> Option<OutboxMessage> {
        self.payment_outbox
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.saga_id == order_id && r.saga_status == status)
            .cloned()
    }

    fn find_approval_row(&self, order_id: OrderId, status: SagaStatus) -> Option<OutboxMessage> {
        self.approval_outbox
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.saga_id == order_id && r.saga_status == status)
            .cloned()
    }

    fn transition_payment_row(
        &self,
        id: uuid::Uuid,
        saga_status: SagaStatus,
        outbox_status: OutboxStatus,
    ) {
        let mut rows = self.payment_outbox.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.saga_status = saga_status;
            row.outbox_status = outbox_status;
            row.processed_at = Some(Utc::now());
            row.version = row.version.next();
        }
    }

    fn transition_approval_row(
        &self,
        id: uuid::Uuid,
        saga_status: SagaStatus,
        outbox_status: OutboxStatus,
    ) {
        let mut rows = self.approval_outbox.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.saga_status = saga_status;
            row.outbox_status = outbox_status;
            row.processed_at = Some(Utc::now());
            row.version = row.version.next();
        }
    }
}

#[async_trait]
impl SagaStore for InMemorySagaStore {
    async fn create_order(&self, order: &Order, payment_request_payload: Value) -> Result<()> {
        let row = OutboxMessage::new_started(
            order.order_id,
            "PAY",
            payment_request_payload,
            order.status.to_string(),
            SagaStatus::Started,
            Utc::now(),
        );
        self.orders.lock().unwrap().insert(order.order_id, order.clone());
        self.payment_outbox.lock().unwrap().push(row);
        Ok(())
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(&order_id).cloned())
    }

    async fn apply_payment_completed(
        &self,
        order_id: OrderId,
        approval_request_payload: Value,
    ) -> Result<StepOutcome> {
        let Some(row) = self.find_payment_row(order_id, SagaStatus::Started) else {
            return Ok(StepOutcome::Stale);
        };
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&order_id).ok_or(SagaError::OrderNotFound(order_id))?;
        if order.pay().is_err() {
            return Ok(StepOutcome::Stale);
        }
        let order_status = order.status.to_string();
        drop(orders);

        self.transition_payment_row(row.id, SagaStatus::Processing, OutboxStatus::Completed);
        let approval_row = OutboxMessage::new_started(
            order_id,
            "APPROVE",
            approval_request_payload,
            order_status,
            SagaStatus::Processing,
            Utc::now(),
        );
        self.approval_outbox.lock().unwrap().push(approval_row);
        Ok(StepOutcome::Applied)
    }

    async fn apply_payment_failed(
        &self,
        order_id: OrderId,
        failure_messages: Vec<String>,
    ) -> Result<StepOutcome> {
        let Some(row) = self.find_payment_row(order_id, SagaStatus::Started) else {
            return Ok(StepOutcome::Stale);
        };
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&order_id).ok_or(SagaError::OrderNotFound(order_id))?;
        if order.init_cancel(failure_messages).is_err() {
            return Ok(StepOutcome::Stale);
        }
        drop(orders);
        self.transition_payment_row(row.id, SagaStatus::Failed, OutboxStatus::Completed);
        Ok(StepOutcome::Applied)
    }

    async fn apply_payment_cancelled(&self, order_id: OrderId) -> Result<StepOutcome> {
        let Some(row) = self.find_payment_row(order_id, SagaStatus::Compensating) else {
            return Ok(StepOutcome::Stale);
        };
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&order_id).ok_or(SagaError::OrderNotFound(order_id))?;
        if order.cancel([]).is_err() {
            return Ok(StepOutcome::Stale);
        }
        drop(orders);
        self.transition_payment_row(row.id, SagaStatus::Compensated, OutboxStatus::Completed);
        Ok(StepOutcome::Applied)
    }

    async fn apply_approved(&self, order_id: OrderId) -> Result<StepOutcome> {
        let Some(row) = self.find_approval_row(order_id, SagaStatus::Processing) else {
            return Ok(StepOutcome::Stale);
        };
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&order_id).ok_or(SagaError::OrderNotFound(order_id))?;
        if order.approve().is_err() {
            return Ok(StepOutcome::Stale);
        }
        drop(orders);
        self.transition_approval_row(row.id, SagaStatus::Succeeded, OutboxStatus::Completed);
        Ok(StepOutcome::Applied)
    }

    async fn apply_rejected(
        &self,
        order_id: OrderId,
        failure_messages: Vec<String>,
        cancel_payment_request_payload: Value,
    ) -> Result<StepOutcome> {
        let Some(row) = self.find_approval_row(order_id, SagaStatus::Processing) else {
            return Ok(StepOutcome::Stale);
        };
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&order_id).ok_or(SagaError::OrderNotFound(order_id))?;
        if order.init_cancel(failure_messages).is_err() {
            return Ok(StepOutcome::Stale);
        }
        let order_status = order.status.to_string();
        drop(orders);

        self.transition_approval_row(row.id, SagaStatus::Compensating, OutboxStatus::Completed);
        let cancel_row = OutboxMessage::new_started(
            order_id,
            "CANCEL",
            cancel_payment_request_payload,
            order_status,
            SagaStatus::Compensating,
            Utc::now(),
        );
        self.payment_outbox.lock().unwrap().push(cancel_row);
        Ok(StepOutcome::Applied)
    }
}
