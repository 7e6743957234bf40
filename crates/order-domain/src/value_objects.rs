use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// One line item on an order. (I2) `sub_total` must equal `quantity *
/// unit_price`; checked at construction so a caller can never build an
/// inconsistent item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub sub_total: Money,
}

impl OrderItem {
    pub fn new(product_id: ProductId, quantity: u32, unit_price: Money) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidItem(
                "item quantity must be at least 1".into(),
            ));
        }
        if !unit_price.is_positive() {
            return Err(OrderError::InvalidItem(
                "item unit price must be greater than zero".into(),
            ));
        }
        let sub_total = unit_price * quantity;
        Ok(Self {
            product_id,
            quantity,
            unit_price,
            sub_total,
        })
    }

    /// Reconstructs an item already known to be valid (e.g. loaded from
    /// storage), re-checking (I2) rather than trusting the source.
    pub fn reconstruct(
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
        sub_total: Money,
    ) -> Result<Self, OrderError> {
        let item = Self::new(product_id, quantity, unit_price)?;
        if item.sub_total != sub_total {
            return Err(OrderError::InvalidItem(format!(
                "stored sub_total {sub_total} does not match quantity*unit_price {}",
                item.sub_total
            )));
        }
        Ok(item)
    }
}

/// Street/postal/city value object; the spec treats this as an opaque value
/// compared structurally, with no further validation in scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

/// A product as known to the restaurant read replica, consulted at order
/// creation to check listed price matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantProduct {
    pub id: ProductId,
    pub price: Money,
    pub available: bool,
}

/// The local, read-only snapshot of a restaurant, populated out of band
/// (§4.6 treats the equivalent customer replica as out of this crate's
/// write-side scope; the restaurant replica is exercised only for the
/// read used during order validation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSnapshot {
    pub id: common::RestaurantId,
    pub active: bool,
    pub products: Vec<RestaurantProduct>,
}

impl RestaurantSnapshot {
    pub fn product(&self, id: &ProductId) -> Option<&RestaurantProduct> {
        self.products.iter().find(|p| &p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn order_item_computes_sub_total() {
        let item = OrderItem::new(ProductId::new(), 3, Money::from_str("10").unwrap()).unwrap();
        assert_eq!(item.sub_total, Money::from_str("30").unwrap());
    }

    #[test]
    fn order_item_rejects_zero_quantity() {
        let err =
            OrderItem::new(ProductId::new(), 0, Money::from_str("10").unwrap()).unwrap_err();
        assert!(matches!(err, OrderError::InvalidItem(_)));
    }

    #[test]
    fn reconstruct_rejects_mismatched_sub_total() {
        let err = OrderItem::reconstruct(
            ProductId::new(),
            2,
            Money::from_str("10").unwrap(),
            Money::from_str("99").unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, OrderError::InvalidItem(_)));
    }
}
