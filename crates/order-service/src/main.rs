use std::sync::Arc;

use messaging::{KafkaLogConsumer, KafkaLogPort, topics};
use order_service::config::Config;
use order_service::{
    PostgresCustomerReplica, PostgresRestaurantReplica, PostgresSagaStore, SagaEngine,
};
use outbox::{PostgresOutboxRepository, SweeperConfig};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> order_service::Result<()> {
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

    let store = Arc::new(PostgresSagaStore::new(pool.clone()));
    store.run_migrations().await?;

    let restaurants = Arc::new(PostgresRestaurantReplica::new(pool.clone()));
    let customers = Arc::new(PostgresCustomerReplica::new(pool.clone()));
    let engine = Arc::new(SagaEngine::new(store.clone(), restaurants, customers.clone()));

    let payment_outbox = Arc::new(PostgresOutboxRepository::new(pool.clone(), "payment_outbox"));
    let approval_outbox = Arc::new(PostgresOutboxRepository::new(pool.clone(), "approval_outbox"));

    let log_port = Arc::new(KafkaLogPort::new(&config.kafka_brokers)?);
    outbox::spawn_sweeper(
        payment_outbox.clone(),
        log_port.clone(),
        SweeperConfig::new(topics::PAYMENT_REQUEST),
    );
    outbox::spawn_sweeper(
        approval_outbox.clone(),
        log_port,
        SweeperConfig::new(topics::RESTAURANT_APPROVAL_REQUEST),
    );
    outbox::spawn_cleanup(payment_outbox, outbox::CleanupConfig::from_env());
    outbox::spawn_cleanup(approval_outbox, outbox::CleanupConfig::from_env());

    let payment_response_consumer = Arc::new(KafkaLogConsumer::new(
        &config.kafka_brokers,
        &config.consumer_group,
        &[topics::PAYMENT_RESPONSE],
    )?);
    let approval_response_consumer = Arc::new(KafkaLogConsumer::new(
        &config.kafka_brokers,
        &config.consumer_group,
        &[topics::RESTAURANT_APPROVAL_RESPONSE],
    )?);
    let customer_consumer = Arc::new(KafkaLogConsumer::new(
        &config.kafka_brokers,
        &config.consumer_group,
        &[topics::CUSTOMER],
    )?);

    let handles = vec![
        order_service::consumers::spawn_payment_response_consumer(
            payment_response_consumer,
            engine.clone(),
            config.consumer_batch_size,
        ),
        order_service::consumers::spawn_approval_response_consumer(
            approval_response_consumer,
            engine,
            config.consumer_batch_size,
        ),
        order_service::consumers::spawn_customer_replica_consumer(
            customer_consumer,
            customers,
            config.consumer_batch_size,
        ),
    ];

    tracing::info!("order-service started");
    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}
