//! The Restaurant service: its own authoritative restaurant/product
//! listing, and the dedupe-insert response outbox that makes applying an
//! `ApprovalRequest` idempotent under at-least-once redelivery.

pub mod config;
pub mod consumer;
mod domain;
mod error;
mod memory_store;
mod postgres_store;
mod store;

pub use consumer::{handle_approval_request, spawn_approval_request_consumer};
pub use domain::{Product, Restaurant};
pub use error::{RestaurantError, Result};
pub use memory_store::InMemoryRestaurantStore;
pub use postgres_store::PostgresRestaurantStore;
pub use store::{RequestedProduct, RestaurantStore, StepOutcome};
