//! Order Stream - order ingestion and lookup service
//!
//! Consumes order records from a message stream, persists them to PostgreSQL
//! and serves cached lookups over HTTP.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use order_stream::api::{create_router, AppState};
use order_stream::cache::OrderCache;
use order_stream::config::Config;
use order_stream::store::{OrderStore, PgOrderStore};
use order_stream::tasks::{warm_cache, WARMUP_DEADLINE};

/// Main entry point for the order service.
///
/// # Startup Sequence
/// 1. Load `.env` and initialize tracing
/// 2. Load configuration from environment variables
/// 3. Connect the PostgreSQL pool and check it
/// 4. Warm the cache with recent orders
/// 5. Start the consumer task
/// 6. Serve HTTP until SIGINT/SIGTERM, then stop the consumer and close the pool
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_stream=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting order service");

    let config = Config::from_env().context("loading configuration")?;
    info!(
        http_addr = %config.http_addr,
        topic = %config.kafka_topic,
        group = %config.kafka_group,
        warm_limit = config.cache_warm_limit,
        "Configuration loaded"
    );

    let store = PgOrderStore::connect(
        &config.postgres_dsn,
        config.db_query_timeout,
        config.db_tx_timeout,
    )
    .await
    .context("connecting to postgres")?;
    store.ping().await.context("pinging postgres")?;
    info!("Postgres pool ready");

    let pool = store.pool().clone();
    let store: Arc<dyn OrderStore> = Arc::new(store);
    let cache = Arc::new(OrderCache::new());
    let cancel = CancellationToken::new();

    warm_cache(
        store.as_ref(),
        &cache,
        config.cache_warm_limit,
        WARMUP_DEADLINE,
        &cancel,
    )
    .await;

    let consumer_handle = start_consumer(&config, &store, &cache, &cancel)?;

    let state = AppState::new(cache, store).with_static_dir(&config.static_dir);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("binding {}", config.http_addr))?;
    info!("Server listening on http://{}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .context("serving http")?;

    cancel.cancel();
    if let Some(handle) = consumer_handle {
        if let Err(err) = handle.await {
            warn!(error = %err, "Consumer task ended abnormally");
        }
    }
    pool.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Starts the Kafka consumer task.
#[cfg(feature = "kafka")]
fn start_consumer(
    config: &Config,
    store: &Arc<dyn OrderStore>,
    cache: &Arc<OrderCache>,
    cancel: &CancellationToken,
) -> anyhow::Result<Option<tokio::task::JoinHandle<()>>> {
    use order_stream::ingest::{consumer::DEFAULT_RETRY_JITTER, Backoff, Consumer, KafkaSource};
    use order_stream::tasks::spawn_consumer_task;

    let source = KafkaSource::connect(
        &config.kafka_broker_list(),
        &config.kafka_group,
        &config.kafka_topic,
    )
    .context("creating kafka consumer")?;

    let backoff = Backoff::new(config.retry_base, DEFAULT_RETRY_JITTER);
    let consumer = Consumer::with_backoff(Arc::clone(store), Arc::clone(cache), backoff);

    Ok(Some(spawn_consumer_task(consumer, source, cancel.clone())))
}

/// Built with `--no-default-features` the service only serves reads.
#[cfg(not(feature = "kafka"))]
fn start_consumer(
    _config: &Config,
    _store: &Arc<dyn OrderStore>,
    _cache: &Arc<OrderCache>,
    _cancel: &CancellationToken,
) -> anyhow::Result<Option<tokio::task::JoinHandle<()>>> {
    warn!("Built without the kafka feature, ingestion disabled");
    Ok(None)
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM) or for `cancel`, which a
/// failed consumer fires.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
        _ = cancel.cancelled() => {
            warn!("Consumer stopped, initiating shutdown...");
        }
    }

    cancel.cancel();
}
