use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestaurantError {
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
}

pub type Result<T> = std::result::Result<T, RestaurantError>;
