//! Cache Warm-up Task
//!
//! Preloads the most recently created orders into the cache at startup.
//! Runs under one overall deadline; any failure is logged and skipped.

use std::time::Duration;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cache::OrderCache;
use crate::store::OrderStore;

/// Overall bound for the warm-up
pub const WARMUP_DEADLINE: Duration = Duration::from_secs(15);

/// Tally of one warm-up run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarmupReport {
    /// Ids returned by the listing
    pub listed: usize,
    /// Orders placed in the cache
    pub loaded: usize,
    /// Orders that could not be read
    pub failed: usize,
    /// The deadline or cancellation cut the run short
    pub interrupted: bool,
}

/// Fills `cache` with up to `limit` of the newest orders.
///
/// Never fails: listing errors, read errors, the deadline and cancellation
/// all end or skip work and are reflected in the report.
pub async fn warm_cache(
    store: &dyn OrderStore,
    cache: &OrderCache,
    limit: i64,
    deadline: Duration,
    cancel: &CancellationToken,
) -> WarmupReport {
    let mut report = WarmupReport::default();
    if limit <= 0 {
        return report;
    }

    let finished = tokio::select! {
        _ = cancel.cancelled() => false,
        result = timeout(deadline, load(store, cache, limit, &mut report)) => result.is_ok(),
    };
    report.interrupted = !finished;

    if report.interrupted {
        warn!(
            loaded = report.loaded,
            listed = report.listed,
            "Cache warm-up interrupted"
        );
    } else {
        info!(
            loaded = report.loaded,
            failed = report.failed,
            "Cache warm-up complete"
        );
    }
    report
}

async fn load(store: &dyn OrderStore, cache: &OrderCache, limit: i64, report: &mut WarmupReport) {
    let ids = match store.list_recent_ids(limit).await {
        Ok(ids) => ids,
        Err(err) => {
            warn!(error = %err, "Cache warm-up listing failed");
            return;
        }
    };
    report.listed = ids.len();

    for order_uid in ids {
        match store.get_order(&order_uid).await {
            Ok(order) => {
                cache.set(order_uid, order).await;
                report.loaded += 1;
            }
            Err(err) => {
                warn!(order_uid = %order_uid, error = %err, "Cache warm-up read failed");
                report.failed += 1;
            }
        }
    }
}
