//! The Log port: a partitioned, ordered, at-least-once publish/subscribe
//! abstraction keyed by saga id, plus the wire message types exchanged on
//! the five topics in §6 of the design.

mod error;
mod kafka;
mod memory;
mod messages;
mod port;
pub mod topics;

pub use error::{MessagingError, Result};
pub use kafka::{KafkaLogConsumer, KafkaLogPort};
pub use memory::InMemoryLog;
pub use messages::{
    ApprovalProduct, ApprovalRequest, ApprovalResponse, CustomerModel, OrderApprovalStatus,
    PaymentOrderStatus, PaymentRequest, PaymentResponse, PaymentStatus, RestaurantOrderStatus,
};
pub use port::{ConsumedMessage, LogConsumer, LogPort};
