use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutboxError {
    /// Another writer already holds the current version; the caller's CAS
    /// lost the race. During inbound handling this is a silent no-op, not a
    /// failure to surface.
    #[error("optimistic lock conflict on outbox row {0}")]
    Conflict(uuid::Uuid),

    /// A `(sagaId, sagaStatus)` dedupe insert lost the unique-constraint
    /// race: some other delivery of the same response already won.
    #[error("dedupe conflict for saga {saga_id} status {saga_status}")]
    DedupeConflict {
        saga_id: uuid::Uuid,
        saga_status: String,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Messaging(#[from] messaging::MessagingError),
}

pub type Result<T> = std::result::Result<T, OutboxError>;
