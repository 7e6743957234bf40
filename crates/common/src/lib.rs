//! Identifiers, money, optimistic-concurrency, and failure-message types
//! shared by every service in the food-ordering saga.

mod failure_messages;
mod ids;
mod money;
mod version;

pub use failure_messages::FailureMessages;
pub use ids::{CustomerId, OrderId, ProductId, RestaurantId, SagaId};
pub use money::Money;
pub use version::Version;
