use std::sync::Arc;

use messaging::{KafkaLogConsumer, KafkaLogPort, topics};
use outbox::{PostgresOutboxRepository, SweeperConfig};
use payment_service::config::Config;
use payment_service::PostgresPaymentStore;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> payment_service::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_level))
        .json()
        .init();

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install metrics recorder");
    std::mem::forget(metrics_handle);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    let store = Arc::new(PostgresPaymentStore::new(pool.clone()));
    store.run_migrations().await?;

    let response_outbox = Arc::new(PostgresOutboxRepository::new(
        pool.clone(),
        "payment_response_outbox",
    ));
    let log_port = Arc::new(KafkaLogPort::new(&config.kafka_brokers)?);
    outbox::spawn_sweeper(
        response_outbox.clone(),
        log_port,
        SweeperConfig::new(topics::PAYMENT_RESPONSE),
    );
    outbox::spawn_cleanup(response_outbox, outbox::CleanupConfig::from_env());

    let request_consumer = Arc::new(KafkaLogConsumer::new(
        &config.kafka_brokers,
        &config.consumer_group,
        &[topics::PAYMENT_REQUEST],
    )?);

    let handle = payment_service::spawn_payment_request_consumer(
        request_consumer,
        store,
        config.consumer_batch_size,
    );

    tracing::info!("payment-service started");
    let _ = handle.await;
    Ok(())
}
