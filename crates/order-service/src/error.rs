use thiserror::Error;

#[derive(Debug, Error)]
pub enum SagaError {
    #[error(transparent)]
    Order(#[from] order_domain::OrderError),

    #[error(transparent)]
    Outbox(#[from] outbox::OutboxError),

    #[error(transparent)]
    Messaging(#[from] messaging::MessagingError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("order {0} not found")]
    OrderNotFound(common::OrderId),

    #[error("restaurant {0} not found in local replica")]
    RestaurantNotFound(common::RestaurantId),

    #[error("customer {0} not found in local replica")]
    CustomerNotFound(common::CustomerId),
}

pub type Result<T> = std::result::Result<T, SagaError>;
