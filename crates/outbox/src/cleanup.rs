use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::error::Result;
use crate::repository::OutboxRepository;

#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub interval: StdDuration,
    pub retention: Duration,
}

impl CleanupConfig {
    pub fn from_env() -> Self {
        Self {
            interval: StdDuration::from_secs(
                std::env::var("OUTBOX_CLEANUP_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3600),
            ),
            retention: Duration::hours(
                std::env::var("OUTBOX_RETENTION_HOURS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(24),
            ),
        }
    }
}

/// Deletes `COMPLETED` rows past retention. `FAILED` rows are never touched
/// here; they stay visible on the operator surface until an operator
/// resolves them.
pub async fn cleanup_once(repo: &dyn OutboxRepository, config: &CleanupConfig) -> Result<u64> {
    let deleted = repo.delete_completed_older_than(config.retention).await?;
    if deleted > 0 {
        tracing::info!(deleted, "swept completed outbox rows past retention");
    }
    Ok(deleted)
}

pub fn spawn_cleanup(
    repo: Arc<dyn OutboxRepository>,
    config: CleanupConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(err) = cleanup_once(repo.as_ref(), &config).await {
                tracing::error!(error = %err, "outbox cleanup cycle failed");
            }
            tokio::time::sleep(config.interval).await;
        }
    })
}
