use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, RestaurantId};
use messaging::{ApprovalResponse, OrderApprovalStatus};
use outbox::{OutboxMessage, SagaStatus};

use crate::domain::Restaurant;
use crate::error::Result;
use crate::store::{RequestedProduct, RestaurantStore, StepOutcome};

#[derive(Default)]
pub struct InMemoryRestaurantStore {
    restaurants: Mutex<HashMap<RestaurantId, Restaurant>>,
    response_outbox: Mutex<Vec<OutboxMessage>>,
}

impl InMemoryRestaurantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, restaurant: Restaurant) {
        self.restaurants.lock().unwrap().insert(restaurant.id, restaurant);
    }

    pub fn response_outbox_snapshot(&self) -> Vec<OutboxMessage> {
        self.response_outbox.lock().unwrap().clone()
    }
}

#[async_trait]
impl RestaurantStore for InMemoryRestaurantStore {
    async fn apply_approval_request(
        &self,
        saga_id: OrderId,
        order_id: OrderId,
        restaurant_id: RestaurantId,
        requested: Vec<RequestedProduct>,
    ) -> Result<StepOutcome> {
        let already_recorded = self
            .response_outbox
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.saga_id == saga_id && r.saga_status == SagaStatus::Succeeded);
        if already_recorded {
            return Ok(StepOutcome::Stale);
        }

        let restaurants = self.restaurants.lock().unwrap();
        let failures = match restaurants.get(&restaurant_id) {
            Some(restaurant) => restaurant.validate(
                &requested
                    .iter()
                    .map(|p| (p.id, p.quantity, p.price))
                    .collect::<Vec<_>>(),
            ),
            None => vec![format!("Restaurant {restaurant_id} not found")],
        };
        drop(restaurants);

        let response = ApprovalResponse {
            saga_id,
            order_id,
            created_at: Utc::now(),
            order_approval_status: if failures.is_empty() {
                OrderApprovalStatus::Approved
            } else {
                OrderApprovalStatus::Rejected
            },
            failure_messages: failures,
        };

        let row = OutboxMessage::new_started(
            saga_id,
            "APPROVAL_RESPONSE",
            serde_json::to_value(&response)?,
            String::new(),
            SagaStatus::Succeeded,
            Utc::now(),
        );
        self.response_outbox.lock().unwrap().push(row);
        Ok(StepOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Product;
    use common::{Money, ProductId};
    use std::str::FromStr;

    fn seeded_store() -> (InMemoryRestaurantStore, RestaurantId, ProductId) {
        let store = InMemoryRestaurantStore::new();
        let restaurant_id = RestaurantId::new();
        let product_id = ProductId::new();
        store.seed(Restaurant {
            id: restaurant_id,
            active: true,
            products: vec![Product {
                id: product_id,
                price: Money::from_str("50").unwrap(),
                available: true,
            }],
        });
        (store, restaurant_id, product_id)
    }

    #[tokio::test]
    async fn matching_request_is_approved() {
        let (store, restaurant_id, product_id) = seeded_store();
        let saga_id = OrderId::new();
        store
            .apply_approval_request(
                saga_id,
                saga_id,
                restaurant_id,
                vec![RequestedProduct {
                    id: product_id,
                    quantity: 1,
                    price: Money::from_str("50").unwrap(),
                }],
            )
            .await
            .unwrap();
        let rows = store.response_outbox_snapshot();
        let payload: ApprovalResponse = serde_json::from_value(rows[0].payload.clone()).unwrap();
        assert_eq!(payload.order_approval_status, OrderApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn mismatched_product_is_rejected() {
        let (store, restaurant_id, _) = seeded_store();
        let saga_id = OrderId::new();
        store
            .apply_approval_request(
                saga_id,
                saga_id,
                restaurant_id,
                vec![RequestedProduct {
                    id: ProductId::new(),
                    quantity: 1,
                    price: Money::from_str("50").unwrap(),
                }],
            )
            .await
            .unwrap();
        let rows = store.response_outbox_snapshot();
        let payload: ApprovalResponse = serde_json::from_value(rows[0].payload.clone()).unwrap();
        assert_eq!(payload.order_approval_status, OrderApprovalStatus::Rejected);
    }

    #[tokio::test]
    async fn duplicate_delivery_is_dropped_as_stale() {
        let (store, restaurant_id, product_id) = seeded_store();
        let saga_id = OrderId::new();
        for _ in 0..2 {
            store
                .apply_approval_request(
                    saga_id,
                    saga_id,
                    restaurant_id,
                    vec![RequestedProduct {
                        id: product_id,
                        quantity: 1,
                        price: Money::from_str("50").unwrap(),
                    }],
                )
                .await
                .unwrap();
        }
        assert_eq!(store.response_outbox_snapshot().len(), 1);
    }
}
