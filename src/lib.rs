//! Order Stream - order ingestion and lookup service
//!
//! Consumes order records from a message stream, persists each one
//! atomically across a normalized PostgreSQL schema and serves point lookups
//! through a cache-aside HTTP read path.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::OrderCache;
pub use config::Config;
pub use store::{MemoryOrderStore, OrderStore, PgOrderStore};
