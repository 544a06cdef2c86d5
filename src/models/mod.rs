//! Data models for the order service
//!
//! The order record itself plus the DTOs used for HTTP response bodies.

pub mod order;
pub mod responses;

// Re-export commonly used types
pub use order::{Delivery, Item, Order, Payment};
pub use responses::{ErrorResponse, HealthResponse};
