//! The Order service: the choreographed SAGA engine, its Postgres-backed
//! and in-memory persistence, and the consumers that feed it.

pub mod config;
pub mod consumers;
mod error;
mod memory_store;
mod postgres_store;
mod replica_store;
mod saga;
mod store;

pub use error::{Result, SagaError};
pub use memory_store::InMemorySagaStore;
pub use postgres_store::PostgresSagaStore;
pub use replica_store::{
    CustomerReplicaRepository, InMemoryCustomerReplica, InMemoryRestaurantReplica,
    PostgresCustomerReplica, PostgresRestaurantReplica, RestaurantReplicaRepository,
};
pub use saga::{CreateOrderCommand, SagaEngine};
pub use store::{SagaStore, StepOutcome};
