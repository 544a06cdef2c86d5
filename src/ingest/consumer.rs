//! Consumer Loop
//!
//! Drives each message through decode, validate, upsert, cache update and
//! acknowledgment, strictly one at a time.
//!
//! A message is acknowledged once it is either durably stored or known to be
//! unprocessable. When the store fails the message is left unacknowledged and
//! the loop backs off before moving on; redelivery happens from the last
//! committed offset after a restart.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::OrderCache;
use crate::ingest::decode::{decode, validate};
use crate::ingest::source::{Message, MessageSource, SourceError};
use crate::store::OrderStore;

// == Defaults ==
pub const DEFAULT_RETRY_BASE: Duration = Duration::from_millis(300);
pub const DEFAULT_RETRY_JITTER: Duration = Duration::from_millis(200);

// == Consumer Error ==
/// Why the loop stopped.
#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("consumer cancelled")]
    Cancelled,

    #[error("fetch failed: {0}")]
    Fetch(#[source] SourceError),
}

// == Outcome ==
/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Unprocessable; acknowledged without a write
    Dropped,
    /// Store failed; left unacknowledged
    Deferred,
    /// Persisted, cached and acknowledged
    Stored,
}

// == Backoff ==
/// Pause after a failed write: `base` plus a uniform jitter in `[0, jitter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub jitter: Duration,
}

impl Backoff {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// Draws the next delay.
    pub fn delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base;
        }
        self.base + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
    }

    /// Sleeps for one delay, returning early if `cancel` fires.
    async fn wait(&self, cancel: &CancellationToken) {
        let delay = self.delay();
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_BASE, DEFAULT_RETRY_JITTER)
    }
}

// == Consumer ==
pub struct Consumer {
    store: Arc<dyn OrderStore>,
    cache: Arc<OrderCache>,
    backoff: Backoff,
}

impl Consumer {
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<OrderCache>) -> Self {
        Self::with_backoff(store, cache, Backoff::default())
    }

    pub fn with_backoff(
        store: Arc<dyn OrderStore>,
        cache: Arc<OrderCache>,
        backoff: Backoff,
    ) -> Self {
        Self {
            store,
            cache,
            backoff,
        }
    }

    // == Run ==
    /// Fetches and handles messages until cancelled or the source fails.
    ///
    /// Never returns `Ok`: the loop only ends with [`ConsumerError::Cancelled`]
    /// or a fetch error.
    pub async fn run<S>(&self, source: &mut S, cancel: &CancellationToken) -> Result<(), ConsumerError>
    where
        S: MessageSource + ?Sized,
    {
        info!("Consumer loop started");

        loop {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ConsumerError::Cancelled),
                fetched = source.fetch() => fetched,
            };

            let message = match fetched {
                Ok(message) => message,
                Err(SourceError::Cancelled) => return Err(ConsumerError::Cancelled),
                Err(err) => return Err(ConsumerError::Fetch(err)),
            };

            self.handle(source, &message, cancel).await;
        }
    }

    // == Handle ==
    /// Processes one message, acknowledging it unless the store failed.
    pub async fn handle<S>(&self, source: &mut S, message: &Message, cancel: &CancellationToken) -> Outcome
    where
        S: MessageSource + ?Sized,
    {
        let order = match decode(&message.payload) {
            Ok(order) => order,
            Err(err) => {
                warn!(
                    partition = message.partition,
                    offset = message.offset,
                    error = %err,
                    "Dropping undecodable message"
                );
                acknowledge(source, message).await;
                return Outcome::Dropped;
            }
        };

        if let Some(key) = message.key_str() {
            if key != order.order_uid {
                warn!(
                    key,
                    order_uid = %order.order_uid,
                    offset = message.offset,
                    "Message key differs from order_uid, using payload id"
                );
            }
        }

        if let Err(err) = validate(&order) {
            warn!(
                order_uid = %order.order_uid,
                offset = message.offset,
                reason = %err,
                "Dropping invalid order"
            );
            acknowledge(source, message).await;
            return Outcome::Dropped;
        }

        // Cache the stored form, not the decoded one; they differ below microseconds.
        let stored = match self.store.upsert_order(&order).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(
                    order_uid = %order.order_uid,
                    partition = message.partition,
                    offset = message.offset,
                    error = %err,
                    "Persist failed, leaving message unacknowledged"
                );
                self.backoff.wait(cancel).await;
                return Outcome::Deferred;
            }
        };

        let order_uid = stored.order_uid.clone();
        self.cache.set(order_uid.clone(), stored).await;
        acknowledge(source, message).await;

        debug!(
            order_uid = %order_uid,
            partition = message.partition,
            offset = message.offset,
            "Order stored"
        );
        Outcome::Stored
    }
}

/// Commits the message; a failure is logged and the message may be redelivered.
async fn acknowledge<S>(source: &mut S, message: &Message)
where
    S: MessageSource + ?Sized,
{
    if let Err(err) = source.commit(message).await {
        warn!(
            partition = message.partition,
            offset = message.offset,
            error = %err,
            "Commit failed"
        );
    }
}
