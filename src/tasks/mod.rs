//! Background Tasks Module
//!
//! Tasks started alongside the HTTP server.
//!
//! # Tasks
//! - Warm-up: preloads recent orders into the cache before serving
//! - Consumer: runs the ingest loop until shutdown

mod consumer;
mod warmup;

pub use consumer::spawn_consumer_task;
pub use warmup::{warm_cache, WarmupReport, WARMUP_DEADLINE};
