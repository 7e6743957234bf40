use async_trait::async_trait;
use common::Money;
use messaging::PaymentResponse;

use crate::error::Result;

/// Whether this request was actually processed. `Stale` covers the dedupe
/// drop: the response-outbox insert for `(sagaId, sagaStatus)` already
/// exists, meaning some earlier delivery of the same request already ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    Stale,
}

/// The atomic combined write this service performs per inbound request:
/// apply the credit-history mutation and record the response-outbox row
/// (the dedupe key and the future outbound publish) in one local
/// transaction.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Applies a forward debit for `amount` against `customer_id`'s credit
    /// history and writes the resulting response into the response outbox.
    /// Returns `Stale` if this `(sagaId, type=PAY)` has already been
    /// recorded.
    async fn apply_debit(
        &self,
        saga_id: common::OrderId,
        customer_id: common::CustomerId,
        amount: Money,
        response_on_success: PaymentResponse,
        response_on_failure: PaymentResponse,
    ) -> Result<StepOutcome>;

    /// Applies a compensating credit for `amount` against `customer_id`'s
    /// credit history and writes the resulting response into the response
    /// outbox. Returns `Stale` if this `(sagaId, type=CANCEL)` has already
    /// been recorded.
    async fn apply_credit(
        &self,
        saga_id: common::OrderId,
        customer_id: common::CustomerId,
        amount: Money,
        response: PaymentResponse,
    ) -> Result<StepOutcome>;
}
