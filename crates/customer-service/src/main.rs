use common::CustomerId;
use messaging::KafkaLogPort;

/// Publishes a single `CustomerCreated` record from process arguments, then
/// exits. There is no HTTP edge or persistent process in scope here — this
/// binary exists only to exercise the Order service's replica consumer.
///
/// Usage: `customer-service <username> <first_name> <last_name>`
#[tokio::main]
async fn main() -> customer_service::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .json()
        .init();

    let mut args = std::env::args().skip(1);
    let username = args.next().unwrap_or_else(|| "customer".to_string());
    let first_name = args.next().unwrap_or_else(|| "First".to_string());
    let last_name = args.next().unwrap_or_else(|| "Last".to_string());

    let kafka_brokers = std::env::var("KAFKA_BROKERS").unwrap_or_else(|_| "localhost:9092".to_string());
    let log_port = KafkaLogPort::new(&kafka_brokers)?;

    let model = customer_service::new_customer(CustomerId::new(), username, first_name, last_name);
    customer_service::publish_customer_created(&log_port, model.clone()).await?;

    tracing::info!(customer_id = %model.id, "published CustomerCreated");
    Ok(())
}
