use async_trait::async_trait;
use common::OrderId;
use order_domain::Order;
use serde_json::Value;

use crate::error::Result;

/// Whether an inbound response actually changed anything. `Stale` covers
/// both flavors of no-op the spec requires: a duplicate delivery (the
/// expected prior outbox row no longer exists because a previous delivery
/// already advanced it) and a response that no longer matches the order's
/// current status (dropped as stale, per §4.2's tie-break rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    Stale,
}

/// The atomic combined writes the choreography engine needs. Each method
/// corresponds to exactly one of the transactions described in §4.2: it
/// mutates the Order row and the relevant outbox row(s) together, so the
/// *atomic enqueue* law holds — aggregate state and outbox rows commit
/// together or not at all.
#[async_trait]
pub trait SagaStore: Send + Sync {
    /// Order creation: persist the order (PENDING) and enqueue the initial
    /// payment request in one transaction.
    async fn create_order(&self, order: &Order, payment_request_payload: Value) -> Result<()>;

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// `PaymentCompleted`: PENDING -> PAID, PaymentOutbox STARTED ->
    /// (PROCESSING, COMPLETED), new ApprovalOutbox row STARTED.
    async fn apply_payment_completed(
        &self,
        order_id: OrderId,
        approval_request_payload: Value,
    ) -> Result<StepOutcome>;

    /// `PaymentFailed`: PENDING -> CANCELLED, PaymentOutbox STARTED ->
    /// (FAILED, COMPLETED).
    async fn apply_payment_failed(
        &self,
        order_id: OrderId,
        failure_messages: Vec<String>,
    ) -> Result<StepOutcome>;

    /// `PaymentCancelled` (compensation ack): CANCELLING -> CANCELLED,
    /// PaymentOutbox COMPENSATING -> (COMPENSATED, COMPLETED).
    async fn apply_payment_cancelled(&self, order_id: OrderId) -> Result<StepOutcome>;

    /// `Approved`: PAID -> APPROVED, ApprovalOutbox PROCESSING ->
    /// (SUCCEEDED, COMPLETED).
    async fn apply_approved(&self, order_id: OrderId) -> Result<StepOutcome>;

    /// `Rejected`: PAID -> CANCELLING, ApprovalOutbox PROCESSING ->
    /// (COMPENSATING, COMPLETED), new PaymentOutbox row COMPENSATING
    /// (type=CANCEL) requesting a credit.
    async fn apply_rejected(
        &self,
        order_id: OrderId,
        failure_messages: Vec<String>,
        cancel_payment_request_payload: Value,
    ) -> Result<StepOutcome>;
}
