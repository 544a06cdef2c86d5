//! Cache Module
//!
//! Provides the in-memory order cache that fronts the order store.

mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use stats::{CacheStats, StatsRecorder};
pub use store::OrderCache;

// == Public Constants ==
/// Initial map capacity; sized for a typical warm-up
pub const INITIAL_CAPACITY: usize = 256;
