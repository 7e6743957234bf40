//! Per-table transactional outbox: outbound sweeper (publish + CAS status
//! update), a cleanup sweeper for completed rows, and the dedupe-insert
//! mechanism that makes inbound response handling idempotent.

mod cleanup;
mod error;
mod memory;
mod model;
mod postgres;
mod repository;
mod sweeper;

pub use cleanup::{CleanupConfig, cleanup_once, spawn_cleanup};
pub use error::{OutboxError, Result};
pub use memory::InMemoryOutboxRepository;
pub use model::{OutboxMessage, OutboxStatus, SagaStatus};
pub use postgres::PostgresOutboxRepository;
pub use repository::OutboxRepository;
pub use sweeper::{SweeperConfig, spawn_sweeper, sweep_once};
