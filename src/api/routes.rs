//! API Routes
//!
//! Configures the Axum router for the order service.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers::{
    get_order_handler, health_handler, method_not_allowed_handler, not_found_handler,
    order_usage_handler, root_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /order/:order_uid` - Order lookup, cache first
/// - `GET /order` - Usage hint
/// - `GET|HEAD /healthz` - Liveness and cache counters
/// - `GET /` - Redirect to the UI
/// - `/ui` - Static files
///
/// # Middleware
/// Outermost first: request id assignment, CORS, tracing, request id
/// propagation onto the response.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route(
            "/order/:order_uid",
            get(get_order_handler).fallback(method_not_allowed_handler),
        )
        .route(
            "/order",
            get(order_usage_handler).fallback(method_not_allowed_handler),
        )
        .route(
            "/order/",
            get(order_usage_handler).fallback(method_not_allowed_handler),
        )
        .route(
            "/healthz",
            get(health_handler).fallback(method_not_allowed_handler),
        )
        .route("/", get(root_handler))
        .nest_service("/ui", static_files)
        .fallback(not_found_handler)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
