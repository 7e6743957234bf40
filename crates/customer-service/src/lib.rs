//! The Customer service's write side is out of scope beyond one thing: it
//! is the sole producer onto the `customer` topic that the Order service's
//! local replica consumes. No other internal logic lives here.

use thiserror::Error;

use common::CustomerId;
use messaging::{CustomerModel, LogPort, topics};

#[derive(Debug, Error)]
pub enum CustomerServiceError {
    #[error(transparent)]
    Messaging(#[from] messaging::MessagingError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CustomerServiceError>;

/// Publishes one `CustomerCreated` record, keyed by `customerId` (not
/// `sagaId`, the only topic in this system without a saga in play).
pub async fn publish_customer_created(log: &dyn LogPort, model: CustomerModel) -> Result<()> {
    let payload = serde_json::to_vec(&model)?;
    log.publish(topics::CUSTOMER, &model.id.to_string(), payload).await?;
    Ok(())
}

pub fn new_customer(id: CustomerId, username: String, first_name: String, last_name: String) -> CustomerModel {
    CustomerModel {
        id,
        username,
        first_name,
        last_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use messaging::InMemoryLog;

    #[tokio::test]
    async fn publish_keys_by_customer_id() {
        let log = InMemoryLog::new();
        let model = new_customer(
            CustomerId::new(),
            "alice".to_string(),
            "Alice".to_string(),
            "Anderson".to_string(),
        );
        publish_customer_created(&log, model.clone()).await.unwrap();
        let published = log.drain(topics::CUSTOMER);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].key, model.id.to_string());
    }
}
