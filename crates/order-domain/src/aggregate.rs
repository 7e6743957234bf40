use common::{CustomerId, FailureMessages, Money, OrderId, RestaurantId, Version};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OrderError, Result};
use crate::status::OrderStatus;
use crate::value_objects::{DeliveryAddress, OrderItem, RestaurantSnapshot};

/// Opaque id exposed to the customer for order tracking; deliberately
/// distinct from `OrderId` so the tracking surface never leaks the
/// internal/saga identifier scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(Uuid);

impl TrackingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TrackingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TrackingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The Order aggregate: a flat product type plus free methods for its legal
/// transitions (§9 design note — no aggregate-root/entity/value-object
/// hierarchy is needed here). Mutated only through `initialize`, `pay`,
/// `approve`, `init_cancel`, `cancel`; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub restaurant_id: RestaurantId,
    pub delivery_address: DeliveryAddress,
    pub items: Vec<OrderItem>,
    pub price: Money,
    pub status: OrderStatus,
    pub failure_messages: FailureMessages,
    pub tracking_id: TrackingId,
    pub version: Version,
}

impl Order {
    /// Validates and constructs a brand-new order in `PENDING`.
    ///
    /// Checks, in order: items non-empty; (I1) declared price equals the
    /// sum of item sub-totals (each item already enforces (I2) at
    /// construction, §value_objects); restaurant is active and every item's
    /// product is listed at a matching price.
    pub fn initialize(
        order_id: OrderId,
        customer_id: CustomerId,
        restaurant_id: RestaurantId,
        delivery_address: DeliveryAddress,
        items: Vec<OrderItem>,
        price: Money,
        restaurant: &RestaurantSnapshot,
    ) -> Result<Self> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let computed = Money::sum(items.iter().map(|i| i.sub_total));
        if computed != price {
            return Err(OrderError::PriceMismatch {
                declared: price.to_string(),
                computed: computed.to_string(),
            });
        }

        if !restaurant.active {
            return Err(OrderError::RestaurantInactive(restaurant_id.to_string()));
        }

        for item in &items {
            let listed = restaurant.product(&item.product_id).ok_or_else(|| {
                OrderError::ProductNotListed {
                    restaurant_id: restaurant_id.to_string(),
                    product_id: item.product_id.to_string(),
                }
            })?;
            if !listed.available {
                return Err(OrderError::ProductNotListed {
                    restaurant_id: restaurant_id.to_string(),
                    product_id: item.product_id.to_string(),
                });
            }
            if listed.price != item.unit_price {
                return Err(OrderError::ProductPriceMismatch {
                    product_id: item.product_id.to_string(),
                    expected: listed.price.to_string(),
                    actual: item.unit_price.to_string(),
                });
            }
        }

        Ok(Self {
            order_id,
            customer_id,
            restaurant_id,
            delivery_address,
            items,
            price,
            status: OrderStatus::Pending,
            failure_messages: FailureMessages::new(),
            tracking_id: TrackingId::new(),
            version: Version::INITIAL,
        })
    }

    fn require(&self, allowed: bool, action: &'static str) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(OrderError::IllegalTransition {
                action,
                status: self.status.to_string(),
            })
        }
    }

    /// `PENDING -> PAID`, on a successful `PaymentCompleted` response.
    pub fn pay(&mut self) -> Result<()> {
        self.require(self.status.can_pay(), "pay")?;
        self.status = OrderStatus::Paid;
        self.version = self.version.next();
        Ok(())
    }

    /// `PAID -> APPROVED`, on a successful `Approved` response. Terminal.
    pub fn approve(&mut self) -> Result<()> {
        self.require(self.status.can_approve(), "approve")?;
        self.status = OrderStatus::Approved;
        self.version = self.version.next();
        Ok(())
    }

    /// `PENDING -> CANCELLED` (payment failed before approval ever started)
    /// or `PAID -> CANCELLING` (restaurant rejected, a payment compensation
    /// must now run). Appending failure messages is additive and
    /// idempotent on empty input.
    pub fn init_cancel(&mut self, failure_messages: impl IntoIterator<Item = String>) -> Result<()> {
        self.require(self.status.can_init_cancel(), "initCancel")?;
        self.failure_messages.extend(failure_messages);
        self.status = match self.status {
            OrderStatus::Pending => OrderStatus::Cancelled,
            OrderStatus::Paid => OrderStatus::Cancelling,
            _ => unreachable!("can_init_cancel guards to PENDING or PAID"),
        };
        self.version = self.version.next();
        Ok(())
    }

    /// `CANCELLING -> CANCELLED`, once the payment compensation has been
    /// acknowledged (`PaymentCancelled`). Terminal.
    pub fn cancel(&mut self, failure_messages: impl IntoIterator<Item = String>) -> Result<()> {
        self.require(self.status.can_cancel(), "cancel")?;
        self.failure_messages.extend(failure_messages);
        self.status = OrderStatus::Cancelled;
        self.version = self.version.next();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;
    use std::str::FromStr;

    fn sample_restaurant(product_id: ProductId, price: Money) -> (RestaurantId, RestaurantSnapshot) {
        let restaurant_id = RestaurantId::new();
        let snapshot = RestaurantSnapshot {
            id: restaurant_id,
            active: true,
            products: vec![crate::value_objects::RestaurantProduct {
                id: product_id,
                price,
                available: true,
            }],
        };
        (restaurant_id, snapshot)
    }

    fn sample_order() -> Order {
        let product_a = ProductId::new();
        let product_b = ProductId::new();
        let restaurant_id = RestaurantId::new();
        let snapshot = RestaurantSnapshot {
            id: restaurant_id,
            active: true,
            products: vec![
                crate::value_objects::RestaurantProduct {
                    id: product_a,
                    price: Money::from_str("50").unwrap(),
                    available: true,
                },
                crate::value_objects::RestaurantProduct {
                    id: product_b,
                    price: Money::from_str("150").unwrap(),
                    available: true,
                },
            ],
        };
        let items = vec![
            OrderItem::new(product_a, 1, Money::from_str("50").unwrap()).unwrap(),
            OrderItem::new(product_b, 1, Money::from_str("150").unwrap()).unwrap(),
        ];
        Order::initialize(
            OrderId::new(),
            CustomerId::new(),
            restaurant_id,
            DeliveryAddress {
                street: "1 Main St".into(),
                postal_code: "00000".into(),
                city: "Springfield".into(),
            },
            items,
            Money::from_str("200").unwrap(),
            &snapshot,
        )
        .unwrap()
    }

    #[test]
    fn initialize_rejects_empty_items() {
        let (restaurant_id, snapshot) = sample_restaurant(ProductId::new(), Money::from_str("1").unwrap());
        let err = Order::initialize(
            OrderId::new(),
            CustomerId::new(),
            restaurant_id,
            DeliveryAddress {
                street: "x".into(),
                postal_code: "x".into(),
                city: "x".into(),
            },
            vec![],
            Money::ZERO,
            &snapshot,
        )
        .unwrap_err();
        assert_eq!(err, OrderError::NoItems);
    }

    #[test]
    fn initialize_rejects_price_mismatch() {
        let product = ProductId::new();
        let (restaurant_id, snapshot) = sample_restaurant(product, Money::from_str("50").unwrap());
        let items = vec![OrderItem::new(product, 1, Money::from_str("50").unwrap()).unwrap()];
        let err = Order::initialize(
            OrderId::new(),
            CustomerId::new(),
            restaurant_id,
            DeliveryAddress {
                street: "x".into(),
                postal_code: "x".into(),
                city: "x".into(),
            },
            items,
            Money::from_str("999").unwrap(),
            &snapshot,
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::PriceMismatch { .. }));
    }

    #[test]
    fn initialize_rejects_price_not_matching_restaurant_listing() {
        let product = ProductId::new();
        let (restaurant_id, snapshot) = sample_restaurant(product, Money::from_str("999").unwrap());
        let items = vec![OrderItem::new(product, 1, Money::from_str("50").unwrap()).unwrap()];
        let err = Order::initialize(
            OrderId::new(),
            CustomerId::new(),
            restaurant_id,
            DeliveryAddress {
                street: "x".into(),
                postal_code: "x".into(),
                city: "x".into(),
            },
            items,
            Money::from_str("50").unwrap(),
            &snapshot,
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::ProductPriceMismatch { .. }));
    }

    #[test]
    fn happy_path_transitions_to_approved() {
        let mut order = sample_order();
        assert_eq!(order.status, OrderStatus::Pending);
        order.pay().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        order.approve().unwrap();
        assert_eq!(order.status, OrderStatus::Approved);
        assert!(order.failure_messages.is_empty());
    }

    #[test]
    fn payment_failure_path_cancels_directly_from_pending() {
        let mut order = sample_order();
        order
            .init_cancel(["Customer has no enough credit".to_string()])
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(!order.failure_messages.is_empty());
    }

    #[test]
    fn restaurant_rejection_path_traverses_cancelling_then_cancelled() {
        let mut order = sample_order();
        order.pay().unwrap();
        order
            .init_cancel(["Product X not available".to_string()])
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelling);
        order.cancel([]).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let mut order = sample_order();
        order.pay().unwrap();
        order.approve().unwrap();
        assert!(order.pay().is_err());
        assert!(order.init_cancel([]).is_err());
    }

    #[test]
    fn duplicate_init_cancel_with_empty_failures_is_idempotent_on_messages() {
        let mut order = sample_order();
        order.init_cancel(["same".to_string()]).unwrap();
        order.init_cancel([]).unwrap_err(); // already CANCELLED, illegal
        assert_eq!(order.failure_messages.clone().into_vec(), vec!["same"]);
    }

    #[test]
    fn version_increments_on_every_transition() {
        let mut order = sample_order();
        let v0 = order.version;
        order.pay().unwrap();
        assert_eq!(order.version, v0.next());
    }
}
