use std::sync::Arc;

use chrono::Utc;
use common::{CustomerId, Money, OrderId, ProductId, RestaurantId};
use messaging::{
    ApprovalProduct, ApprovalRequest, OrderApprovalStatus, PaymentOrderStatus, PaymentRequest,
    PaymentResponse, PaymentStatus, RestaurantOrderStatus,
};
use messaging::ApprovalResponse;
use order_domain::{DeliveryAddress, Order, OrderItem};

use crate::error::{Result, SagaError};
use crate::replica_store::{CustomerReplicaRepository, RestaurantReplicaRepository};
use crate::store::{SagaStore, StepOutcome};

/// Everything needed to validate and create a new order; the shape the
/// (out-of-scope) HTTP edge would hand the engine after `CreateOrder`.
pub struct CreateOrderCommand {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub restaurant_id: RestaurantId,
    pub delivery_address: DeliveryAddress,
    pub items: Vec<(ProductId, u32, Money)>,
    pub price: Money,
}

/// The choreographed SAGA engine for the Order service: no central
/// orchestration loop, just a handler per inbound response plus the
/// order-creation path that kicks the first step off. Each handler is a
/// single atomic transaction through `SagaStore`.
pub struct SagaEngine<S, R, C> {
    store: Arc<S>,
    restaurants: Arc<R>,
    customers: Arc<C>,
}

impl<S, R, C> SagaEngine<S, R, C>
where
    S: SagaStore,
    R: RestaurantReplicaRepository,
    C: CustomerReplicaRepository,
{
    pub fn new(store: Arc<S>, restaurants: Arc<R>, customers: Arc<C>) -> Self {
        Self {
            store,
            restaurants,
            customers,
        }
    }

    #[tracing::instrument(skip(self, cmd))]
    pub async fn create_order(&self, cmd: CreateOrderCommand) -> Result<Order> {
        if self.customers.find(cmd.customer_id).await?.is_none() {
            return Err(SagaError::CustomerNotFound(cmd.customer_id));
        }
        let restaurant = self
            .restaurants
            .find(cmd.restaurant_id)
            .await?
            .ok_or(SagaError::RestaurantNotFound(cmd.restaurant_id))?;

        let items = cmd
            .items
            .into_iter()
            .map(|(product_id, quantity, unit_price)| OrderItem::new(product_id, quantity, unit_price))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let order = Order::initialize(
            cmd.order_id,
            cmd.customer_id,
            cmd.restaurant_id,
            cmd.delivery_address,
            items,
            cmd.price,
            &restaurant,
        )?;

        let payment_request = PaymentRequest {
            saga_id: order.order_id,
            customer_id: order.customer_id,
            order_id: order.order_id,
            price: order.price.amount(),
            created_at: Utc::now(),
            payment_order_status: PaymentOrderStatus::Pending,
        };
        self.store
            .create_order(&order, serde_json::to_value(&payment_request)?)
            .await?;

        metrics::counter!("orders_saga_step_total", "step" => "payment", "outcome" => "requested")
            .increment(1);
        Ok(order)
    }

    #[tracing::instrument(skip(self, response))]
    pub async fn handle_payment_response(&self, response: PaymentResponse) -> Result<()> {
        let order_id = response.order_id;
        let outcome = match response.payment_status {
            PaymentStatus::Completed => {
                let order = self
                    .store
                    .find_order(order_id)
                    .await?
                    .ok_or(SagaError::OrderNotFound(order_id))?;
                let restaurant_id = order.restaurant_id;
                let products = order
                    .items
                    .iter()
                    .map(|item| ApprovalProduct {
                        id: item.product_id,
                        quantity: item.quantity,
                        price: item.unit_price.amount(),
                    })
                    .collect();
                let approval_request = ApprovalRequest {
                    saga_id: order_id,
                    order_id,
                    restaurant_id,
                    created_at: Utc::now(),
                    restaurant_order_status: RestaurantOrderStatus::Paid,
                    products,
                };
                self.store
                    .apply_payment_completed(order_id, serde_json::to_value(&approval_request)?)
                    .await?
            }
            PaymentStatus::Failed => {
                self.store
                    .apply_payment_failed(order_id, response.failure_messages)
                    .await?
            }
            PaymentStatus::Cancelled => self.store.apply_payment_cancelled(order_id).await?,
        };

        self.record_outcome("payment", outcome);
        Ok(())
    }

    #[tracing::instrument(skip(self, response))]
    pub async fn handle_approval_response(&self, response: ApprovalResponse) -> Result<()> {
        let order_id = response.order_id;
        let outcome = match response.order_approval_status {
            OrderApprovalStatus::Approved => self.store.apply_approved(order_id).await?,
            OrderApprovalStatus::Rejected => {
                let order = self
                    .store
                    .find_order(order_id)
                    .await?
                    .ok_or(SagaError::OrderNotFound(order_id))?;
                let cancel_request = PaymentRequest {
                    saga_id: order_id,
                    customer_id: order.customer_id,
                    order_id,
                    price: order.price.amount(),
                    created_at: Utc::now(),
                    payment_order_status: PaymentOrderStatus::Cancelled,
                };
                self.store
                    .apply_rejected(
                        order_id,
                        response.failure_messages,
                        serde_json::to_value(&cancel_request)?,
                    )
                    .await?
            }
        };

        self.record_outcome("approval", outcome);
        Ok(())
    }

    fn record_outcome(&self, step: &'static str, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Applied => {
                metrics::counter!("orders_saga_step_total", "step" => step, "outcome" => "applied")
                    .increment(1);
            }
            StepOutcome::Stale => {
                tracing::info!(step, "dropped stale or duplicate response");
                metrics::counter!("outbox_dedupe_noop_total", "topic" => step).increment(1);
            }
        }
    }
}
