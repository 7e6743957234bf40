use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("log publish failed: {0}")]
    Publish(String),

    #[error("log poll failed: {0}")]
    Poll(String),

    #[error("log commit failed: {0}")]
    Commit(String),

    #[error("poison message on topic {topic}: {reason}")]
    Poison { topic: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MessagingError>;
