use thiserror::Error;

/// Domain-rule violations raised by `Order` methods. At the edge (not built
/// here) these map to 4xx; inside the pipeline an illegal transition is
/// instead treated as a stale event and logged without retry (§7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("order items must not be empty")]
    NoItems,

    #[error("invalid order item: {0}")]
    InvalidItem(String),

    #[error("declared price {declared} does not match sum of item sub-totals {computed}")]
    PriceMismatch { declared: String, computed: String },

    #[error("restaurant {0} is not active")]
    RestaurantInactive(String),

    #[error("product {product_id} is not listed by restaurant {restaurant_id}")]
    ProductNotListed {
        restaurant_id: String,
        product_id: String,
    },

    #[error("product {product_id} price {expected} does not match order price {actual}")]
    ProductPriceMismatch {
        product_id: String,
        expected: String,
        actual: String,
    },

    #[error("customer {0} is not known to the local replica")]
    UnknownCustomer(String),

    #[error("illegal transition: cannot {action} an order in status {status}")]
    IllegalTransition { action: &'static str, status: String },
}

pub type Result<T> = std::result::Result<T, OrderError>;
