//! Process configuration loaded from environment variables.

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub kafka_brokers: String,
    pub log_level: String,
    pub consumer_group: String,
    pub consumer_batch_size: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/restaurant_service".to_string()),
            kafka_brokers: std::env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| "localhost:9092".to_string()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            consumer_group: std::env::var("CONSUMER_GROUP")
                .unwrap_or_else(|_| "restaurant-service".to_string()),
            consumer_batch_size: std::env::var("CONSUMER_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/restaurant_service".to_string(),
            kafka_brokers: "localhost:9092".to_string(),
            log_level: "info".to_string(),
            consumer_group: "restaurant-service".to_string(),
            consumer_batch_size: 50,
        }
    }
}
