//! API Module
//!
//! HTTP handlers and routing for the order read path.
//!
//! # Endpoints
//! - `GET /order/:order_uid` - Look up an order by id
//! - `GET /healthz` - Health check with cache counters
//! - `GET /` and `/ui` - Static UI

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
