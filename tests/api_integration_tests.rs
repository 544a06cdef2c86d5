//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle against an in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use order_stream::{
    api::create_router,
    cache::OrderCache,
    models::{Item, Order},
    store::{FailPoint, MemoryOrderStore, OrderStore},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn order(uid: &str) -> Order {
    let mut order = Order {
        order_uid: uid.to_string(),
        track_number: "WBILMTESTTRACK".to_string(),
        entry: "WBIL".to_string(),
        shard_key: "9".to_string(),
        date_created: Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap(),
        items: vec![Item {
            chrt_id: 9934930,
            price: 453,
            name: "Mascaras".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    };
    order.payment.transaction_id = uid.to_string();
    order.payment.currency = "USD".to_string();
    order.payment.amount = 1817;
    order.delivery.city = "Kiryat Mozkin".to_string();
    order
}

struct TestApp {
    app: Router,
    store: Arc<MemoryOrderStore>,
    cache: Arc<OrderCache>,
}

async fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryOrderStore::new());
    store.upsert_order(&order("u1")).await.unwrap();
    let cache = Arc::new(OrderCache::new());
    let state = AppState::new(cache.clone(), store.clone());

    TestApp {
        app: create_router(state),
        store,
        cache,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Order Endpoint Tests ==

#[tokio::test]
async fn test_get_order_success() {
    let test = create_test_app().await;

    let response = test.app.oneshot(get("/order/u1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["order_uid"], "u1");
    assert_eq!(json["shardkey"], "9");
    assert_eq!(json["payment"]["transaction"], "u1");
    assert_eq!(json["payment"]["amount"], 1817);
    assert_eq!(json["delivery"]["city"], "Kiryat Mozkin");
    assert_eq!(json["items"][0]["chrt_id"], 9934930);
    assert_eq!(json["date_created"], "2021-11-26T06:22:19Z");
}

#[tokio::test]
async fn test_get_order_fills_cache() {
    let test = create_test_app().await;

    let response = test.app.clone().oneshot(get("/order/u1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let accesses = test.store.storage_accesses();

    let response = test.app.oneshot(get("/order/u1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(test.store.storage_accesses(), accesses);
    assert_eq!(test.cache.len().await, 1);
}

#[tokio::test]
async fn test_get_order_not_found() {
    let test = create_test_app().await;

    let response = test.app.oneshot(get("/order/u-missing")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "not_found");
    assert!(json["request_id"].is_string());
    assert!(test.cache.is_empty().await);
}

#[tokio::test]
async fn test_get_order_too_long_id() {
    let test = create_test_app().await;
    let uri = format!("/order/{}", "x".repeat(101));

    let response = test.app.oneshot(get(&uri)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "bad_request");
    assert_eq!(test.store.storage_accesses(), 1);
}

#[tokio::test]
async fn test_get_order_usage_hint() {
    let test = create_test_app().await;

    let response = test.app.oneshot(get("/order")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["message"], "use /order/{order_uid}");
}

#[tokio::test]
async fn test_get_order_storage_failure_hides_cause() {
    let test = create_test_app().await;
    test.store.set_fail_point(Some(FailPoint::Read));

    let response = test.app.oneshot(get("/order/u1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "internal");
    assert_eq!(json["message"], "internal error");
}

#[tokio::test]
async fn test_get_order_inconsistent_is_internal() {
    let test = create_test_app().await;
    test.store.remove_delivery("u1").await;

    let response = test.app.oneshot(get("/order/u1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_order_method_not_allowed() {
    let test = create_test_app().await;

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/order/u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "GET, HEAD");
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "method_not_allowed");
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let test = create_test_app().await;
    test.cache.set("u1", order("u1")).await;

    let response = test.app.oneshot(get("/healthz")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["cache_size"], 1);
    assert!(json["version"].is_string());
    assert!(json["request_id"].is_string());
}

#[tokio::test]
async fn test_health_head_has_empty_body() {
    let test = create_test_app().await;

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("HEAD")
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_health_post_not_allowed() {
    let test = create_test_app().await;

    let response = test
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// == Request Id Tests ==

#[tokio::test]
async fn test_request_id_generated() {
    let test = create_test_app().await;

    let response = test.app.oneshot(get("/order/u-missing")).await.unwrap();

    let header = response.headers()["x-request-id"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(!header.is_empty());
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["request_id"], header);
}

#[tokio::test]
async fn test_request_id_propagated() {
    let test = create_test_app().await;

    let response = test
        .app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "abc-123");
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["request_id"], "abc-123");
}

// == Fallback and Static Tests ==

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let test = create_test_app().await;

    let response = test.app.oneshot(get("/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_root_redirects_to_ui() {
    let test = create_test_app().await;

    let response = test.app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()["location"], "/ui/");
}

#[tokio::test]
async fn test_ui_serves_static_files() {
    let dir = std::env::temp_dir().join(format!("order_stream_ui_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>orders</h1>").unwrap();

    let state = AppState::new(
        Arc::new(OrderCache::new()),
        Arc::new(MemoryOrderStore::new()),
    )
    .with_static_dir(&dir);
    let app = create_router(state);

    let response = app.oneshot(get("/ui/index.html")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"<h1>orders</h1>");

    std::fs::remove_dir_all(&dir).ok();
}
