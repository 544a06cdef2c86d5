//! Order Store Module
//!
//! Durable persistence for orders across the four relational tables
//! (`orders`, `order_payment`, `order_delivery`, `order_items`).
//!
//! The store is the only writer of durable state. Reads assemble an order
//! from its four sub-records; writes replace an order as a whole inside one
//! transaction, so a failed write leaves no trace.

mod batch;
mod memory;
mod postgres;
mod queries;


use std::time::Duration;

use async_trait::async_trait;
use chrono::SubsecRound;

use crate::error::{StoreError, StoreResult};
use crate::models::Order;

pub use batch::{Statement, WriteBatch};
pub use memory::{FailPoint, MemoryOrderStore};
pub use postgres::PgOrderStore;

// == Public Constants ==
/// Maximum allowed `order_uid` length in bytes
pub const MAX_UID_LEN: usize = 100;

/// Default bound for each individual read query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bound for a whole write transaction
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(5);

// == Order Store Trait ==
/// Point reads and whole-order upserts.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Loads an order with its payment, delivery and items.
    ///
    /// # Errors
    /// - [`StoreError::BadIdentifier`] for an empty or over-long id, before any storage access
    /// - [`StoreError::NotFound`] when no header row exists
    /// - [`StoreError::Inconsistent`] when the payment or delivery row is missing
    /// - [`StoreError::Storage`] for any timeout or backend failure
    async fn get_order(&self, order_uid: &str) -> StoreResult<Order>;

    /// Returns up to `limit` ids, newest `date_created` first.
    ///
    /// `limit <= 0` returns an empty list without touching storage.
    async fn list_recent_ids(&self, limit: i64) -> StoreResult<Vec<String>>;

    /// Inserts or replaces the whole order atomically and returns it as
    /// persisted (see [`prepare_for_write`]).
    ///
    /// Applying the same order twice leaves the same state as applying it once.
    async fn upsert_order(&self, order: &Order) -> StoreResult<Order>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;
}

// == Identifier Check ==
/// Rejects ids outside the 1..=100 byte range.
pub fn check_identifier(order_uid: &str) -> StoreResult<()> {
    if order_uid.is_empty() || order_uid.len() > MAX_UID_LEN {
        return Err(StoreError::BadIdentifier);
    }
    Ok(())
}

// == Write Preparation ==
/// Runs the cheap pre-transaction checks and returns the order in its
/// canonical stored form.
///
/// `date_created` is already UTC by type; it is truncated to microseconds, the
/// resolution of `timestamptz`, so that a read returns exactly what was written.
pub fn prepare_for_write(order: &Order) -> StoreResult<Order> {
    check_identifier(&order.order_uid)?;
    if order.payment.amount < 0 {
        return Err(StoreError::Inconsistent("negative amount".to_string()));
    }

    let mut normalized = order.clone();
    normalized.date_created = order.date_created.trunc_subsecs(6);
    Ok(normalized)
}
