//! Configuration Module
//!
//! Handles loading service configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8081";
pub const DEFAULT_CACHE_WARM_LIMIT: i64 = 100;
pub const DEFAULT_KAFKA_BROKERS: &str = "localhost:9092";
pub const DEFAULT_KAFKA_TOPIC: &str = "orders";
pub const DEFAULT_KAFKA_GROUP: &str = "orders-consumer";
pub const DEFAULT_STATIC_DIR: &str = "web";
pub const DEFAULT_DB_QUERY_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_DB_TX_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_RETRY_BASE_MS: u64 = 300;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Service configuration.
///
/// Everything but the database DSN has a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP listen address
    pub http_addr: SocketAddr,
    /// PostgreSQL connection string
    pub postgres_dsn: String,
    /// Number of recent orders preloaded at startup
    pub cache_warm_limit: i64,
    /// Comma-separated broker list
    pub kafka_brokers: String,
    pub kafka_topic: String,
    pub kafka_group: String,
    /// Directory served under `/ui`
    pub static_dir: String,
    /// Bound for each read query
    pub db_query_timeout: Duration,
    /// Bound for each write transaction
    pub db_tx_timeout: Duration,
    /// Base delay after a failed write
    pub retry_base: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `HTTP_ADDR` - Listen address, `host:port` or `:port` (default: 0.0.0.0:8081)
    /// - `POSTGRES_DSN` - Database DSN (required)
    /// - `CACHE_WARM_LIMIT` - Orders preloaded at startup (default: 100)
    /// - `KAFKA_BROKERS` - Broker list (default: localhost:9092)
    /// - `KAFKA_TOPIC` - Topic (default: orders)
    /// - `KAFKA_GROUP` - Consumer group (default: orders-consumer)
    /// - `STATIC_DIR` - UI directory (default: web)
    /// - `DB_QUERY_TIMEOUT_MS` - Read timeout (default: 2000)
    /// - `DB_TX_TIMEOUT_MS` - Transaction timeout (default: 5000)
    /// - `RETRY_BASE_MS` - Write retry base delay (default: 300)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let postgres_dsn = var("POSTGRES_DSN").ok_or(ConfigError::MissingVar("POSTGRES_DSN"))?;

        let http_addr_raw = var("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = parse_addr(&http_addr_raw).ok_or_else(|| ConfigError::Invalid {
            name: "HTTP_ADDR",
            value: http_addr_raw.clone(),
        })?;

        let cache_warm_limit = var("CACHE_WARM_LIMIT")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|limit| *limit >= 0)
            .unwrap_or(DEFAULT_CACHE_WARM_LIMIT);

        let millis = |name: &str, default: u64| {
            Duration::from_millis(
                var(name)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(default),
            )
        };

        Ok(Self {
            http_addr,
            postgres_dsn,
            cache_warm_limit,
            kafka_brokers: var("KAFKA_BROKERS").unwrap_or_else(|| DEFAULT_KAFKA_BROKERS.to_string()),
            kafka_topic: var("KAFKA_TOPIC").unwrap_or_else(|| DEFAULT_KAFKA_TOPIC.to_string()),
            kafka_group: var("KAFKA_GROUP").unwrap_or_else(|| DEFAULT_KAFKA_GROUP.to_string()),
            static_dir: var("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            db_query_timeout: millis("DB_QUERY_TIMEOUT_MS", DEFAULT_DB_QUERY_TIMEOUT_MS),
            db_tx_timeout: millis("DB_TX_TIMEOUT_MS", DEFAULT_DB_TX_TIMEOUT_MS),
            retry_base: millis("RETRY_BASE_MS", DEFAULT_RETRY_BASE_MS),
        })
    }

    /// Broker addresses, trimmed, blanks skipped.
    pub fn kafka_broker_list(&self) -> Vec<String> {
        self.kafka_brokers
            .split(',')
            .map(str::trim)
            .filter(|broker| !broker.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Parses `host:port`, or `:port` meaning all interfaces.
fn parse_addr(raw: &str) -> Option<SocketAddr> {
    let raw = raw.trim();
    match raw.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}").parse().ok(),
        None => raw.parse().ok(),
    }
}
