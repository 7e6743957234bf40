use common::{Money, ProductId, RestaurantId};

/// A product as this service itself owns it (contrast with the Order
/// service's read-only replica of the same shape): authoritative price and
/// availability, consulted to validate an incoming approval request.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub price: Money,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub active: bool,
    pub products: Vec<Product>,
}

impl Restaurant {
    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }

    /// Checks every requested product against the listing: it must exist,
    /// be available, and match the recorded price and quantity. Returns the
    /// human-readable failure messages for whatever didn't match; empty
    /// means approved.
    pub fn validate(&self, requested: &[(ProductId, u32, Money)]) -> Vec<String> {
        let mut failures = Vec::new();

        if !self.active {
            failures.push(format!("Restaurant {} is not active", self.id));
            return failures;
        }

        for (product_id, quantity, price) in requested {
            let Some(listed) = self.product(product_id) else {
                failures.push(format!("Product {product_id} not available"));
                continue;
            };
            if !listed.available {
                failures.push(format!("Product {product_id} not available"));
                continue;
            }
            if listed.price != *price {
                failures.push(format!(
                    "Product {product_id} price {price} does not match listed price {}",
                    listed.price
                ));
            }
            if *quantity == 0 {
                failures.push(format!("Product {product_id} requested with zero quantity"));
            }
        }

        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_restaurant() -> Restaurant {
        Restaurant {
            id: RestaurantId::new(),
            active: true,
            products: vec![Product {
                id: ProductId::new(),
                price: Money::from_str("50").unwrap(),
                available: true,
            }],
        }
    }

    #[test]
    fn inactive_restaurant_rejects_everything() {
        let mut restaurant = sample_restaurant();
        restaurant.active = false;
        let failures = restaurant.validate(&[]);
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn unknown_product_is_rejected() {
        let restaurant = sample_restaurant();
        let failures = restaurant.validate(&[(ProductId::new(), 1, Money::from_str("50").unwrap())]);
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("not available"));
    }

    #[test]
    fn price_mismatch_is_rejected() {
        let restaurant = sample_restaurant();
        let product_id = restaurant.products[0].id;
        let failures = restaurant.validate(&[(product_id, 1, Money::from_str("999").unwrap())]);
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn matching_request_is_approved() {
        let restaurant = sample_restaurant();
        let product_id = restaurant.products[0].id;
        let failures = restaurant.validate(&[(product_id, 2, Money::from_str("50").unwrap())]);
        assert!(failures.is_empty());
    }
}
