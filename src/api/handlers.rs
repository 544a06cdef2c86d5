//! API Handlers
//!
//! HTTP request handlers for the order read path.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use tower_http::request_id::RequestId;
use tracing::error;

use crate::cache::OrderCache;
use crate::error::{ApiError, StoreError, StoreResult};
use crate::models::{HealthResponse, Order};
use crate::store::{check_identifier, OrderStore};

/// Methods served on every API route.
const ALLOWED_METHODS: &str = "GET, HEAD";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Orders by id, shared with the consumer
    pub cache: Arc<OrderCache>,
    /// Durable store consulted on cache misses
    pub store: Arc<dyn OrderStore>,
    /// Directory served under `/ui`
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(cache: Arc<OrderCache>, store: Arc<dyn OrderStore>) -> Self {
        Self {
            cache,
            store,
            static_dir: PathBuf::from(crate::config::DEFAULT_STATIC_DIR),
        }
    }

    pub fn with_static_dir(mut self, static_dir: impl Into<PathBuf>) -> Self {
        self.static_dir = static_dir.into();
        self
    }

    /// Cache-aside lookup: the cache first, then the store, backfilling the
    /// cache on a store hit.
    ///
    /// The backfill never overwrites: if the consumer cached a newer version
    /// while the store read was in flight, that version is kept and returned.
    ///
    /// Bad identifiers are rejected before either is consulted.
    pub async fn lookup_order(&self, order_uid: &str) -> StoreResult<Order> {
        check_identifier(order_uid)?;

        if let Some(order) = self.cache.get(order_uid).await {
            return Ok(order);
        }

        let order = self.store.get_order(order_uid).await?;
        Ok(self.cache.fill(order_uid, order).await)
    }
}

/// Request id assigned by the request-id middleware, if any.
fn request_id_of(request_id: Option<Extension<RequestId>>) -> Option<String> {
    request_id.and_then(|Extension(id)| id.header_value().to_str().ok().map(str::to_string))
}

/// Handler for GET /order/:order_uid
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(order_uid): Path<String>,
    request_id: Option<Extension<RequestId>>,
) -> Response {
    let request_id = request_id_of(request_id);

    match state.lookup_order(&order_uid).await {
        Ok(order) => Json(order).into_response(),
        Err(err) => {
            if matches!(err, StoreError::Inconsistent(_) | StoreError::Storage { .. }) {
                error!(
                    order_uid = %order_uid,
                    request_id = request_id.as_deref().unwrap_or_default(),
                    error = %err,
                    "Order lookup failed"
                );
            }
            ApiError::from(err).into_response_with(request_id)
        }
    }
}

/// Handler for GET /order without an id
pub async fn order_usage_handler(request_id: Option<Extension<RequestId>>) -> Response {
    ApiError::BadRequest("use /order/{order_uid}".to_string())
        .into_response_with(request_id_of(request_id))
}

/// Handler for GET|HEAD /healthz
///
/// Reports liveness and cache counters; never touches the store.
pub async fn health_handler(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
) -> Json<HealthResponse> {
    let stats = state.cache.stats().await;
    Json(HealthResponse::ok(
        &stats,
        env!("CARGO_PKG_VERSION"),
        request_id_of(request_id),
    ))
}

/// Handler for GET /
pub async fn root_handler() -> Redirect {
    Redirect::temporary("/ui/")
}

/// Fallback for unknown paths
pub async fn not_found_handler(request_id: Option<Extension<RequestId>>) -> Response {
    ApiError::NotFound("no such route".to_string()).into_response_with(request_id_of(request_id))
}

/// Fallback for a known path with an unsupported method
pub async fn method_not_allowed_handler(request_id: Option<Extension<RequestId>>) -> Response {
    let mut response = ApiError::MethodNotAllowed.into_response_with(request_id_of(request_id));
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use crate::store::MemoryOrderStore;

    fn order(uid: &str) -> Order {
        let mut order = Order {
            order_uid: uid.to_string(),
            track_number: "TRK".to_string(),
            ..Default::default()
        };
        order.payment.currency = "USD".to_string();
        order
    }

    fn state_with(store: Arc<MemoryOrderStore>) -> AppState {
        AppState::new(Arc::new(OrderCache::new()), store)
    }

    #[tokio::test]
    async fn test_lookup_backfills_cache() {
        let store = Arc::new(MemoryOrderStore::new());
        store.upsert_order(&order("u1")).await.unwrap();
        let state = state_with(store.clone());

        assert!(state.lookup_order("u1").await.is_ok());
        assert!(state.lookup_order("u1").await.is_ok());

        let stats = state.cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_lookup_prefers_cache() {
        let store = Arc::new(MemoryOrderStore::new());
        let state = state_with(store.clone());
        state.cache.set("u1", order("u1")).await;

        assert_eq!(state.lookup_order("u1").await.unwrap().order_uid, "u1");
        assert_eq!(store.storage_accesses(), 0);
    }

    #[tokio::test]
    async fn test_lookup_miss_does_not_cache() {
        let state = state_with(Arc::new(MemoryOrderStore::new()));

        assert!(matches!(
            state.lookup_order("u-missing").await,
            Err(StoreError::NotFound)
        ));
        assert!(state.cache.is_empty().await);
    }

    /// Store whose read races with a consumer write: it caches `newer` before
    /// returning `older`.
    struct RacingStore {
        cache: Arc<OrderCache>,
        older: Order,
        newer: Order,
    }

    #[async_trait::async_trait]
    impl OrderStore for RacingStore {
        async fn get_order(&self, _order_uid: &str) -> StoreResult<Order> {
            self.cache.set(self.newer.order_uid.clone(), self.newer.clone()).await;
            Ok(self.older.clone())
        }

        async fn list_recent_ids(&self, _limit: i64) -> StoreResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn upsert_order(&self, order: &Order) -> StoreResult<Order> {
            Ok(order.clone())
        }

        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_lookup_backfill_keeps_newer_cached_order() {
        let cache = Arc::new(OrderCache::new());
        let older = order("u1");
        let mut newer = order("u1");
        newer.payment.amount = 99;
        let store = Arc::new(RacingStore {
            cache: cache.clone(),
            older,
            newer: newer.clone(),
        });
        let state = AppState::new(cache.clone(), store);

        assert_eq!(state.lookup_order("u1").await.unwrap(), newer);
        assert_eq!(cache.get("u1").await, Some(newer));
    }

    #[tokio::test]
    async fn test_lookup_bad_identifier_skips_cache_and_store() {
        let store = Arc::new(MemoryOrderStore::new());
        let state = state_with(store.clone());

        assert!(matches!(
            state.lookup_order("").await,
            Err(StoreError::BadIdentifier)
        ));
        assert_eq!(state.cache.stats().await.misses, 0);
        assert_eq!(store.storage_accesses(), 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let state = state_with(Arc::new(MemoryOrderStore::new()));
        let response = health_handler(State(state), None).await;

        assert_eq!(response.status, "ok");
        assert_eq!(response.cache_size, 0);
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_method_not_allowed_sets_allow() {
        let response = method_not_allowed_handler(None).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], ALLOWED_METHODS);
    }
}
