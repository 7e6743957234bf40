//! The Payment service: the customer credit-history ledger and the
//! dedupe-insert response outbox that makes applying a `PaymentRequest`
//! idempotent under at-least-once redelivery.

pub mod config;
pub mod consumer;
mod credit_history;
mod error;
mod memory_store;
mod postgres_store;
mod store;

pub use consumer::{handle_payment_request, spawn_payment_request_consumer};
pub use credit_history::CreditHistory;
pub use error::{PaymentError, Result};
pub use memory_store::InMemoryPaymentStore;
pub use postgres_store::PostgresPaymentStore;
pub use store::{PaymentStore, StepOutcome};
