use async_trait::async_trait;
use common::{OrderId, ProductId, RestaurantId, Money};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    Stale,
}

/// One requested line item, as carried on an `ApprovalRequest`.
#[derive(Debug, Clone, Copy)]
pub struct RequestedProduct {
    pub id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

/// The atomic combined operation this service performs per inbound
/// approval request: look up its own authoritative restaurant listing,
/// validate the request against it, and record the response in the
/// dedupe-insert outbox, all in one local transaction.
#[async_trait]
pub trait RestaurantStore: Send + Sync {
    async fn apply_approval_request(
        &self,
        saga_id: OrderId,
        order_id: OrderId,
        restaurant_id: RestaurantId,
        requested: Vec<RequestedProduct>,
    ) -> Result<StepOutcome>;
}
