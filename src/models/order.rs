//! Order Model
//!
//! The order record as it arrives on the stream, as it is stored across the
//! four relational tables, and as it is served over HTTP.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Order ==
/// Root record, identified by an immutable `order_uid`.
///
/// Every field defaults to its zero value when absent from the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct Order {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    #[serde(rename = "shardkey")]
    #[sqlx(rename = "shardkey")]
    pub shard_key: String,
    pub sm_id: i32,
    pub date_created: DateTime<Utc>,
    pub oof_shard: String,
    /// Loaded separately from `order_delivery`
    #[sqlx(skip)]
    pub delivery: Delivery,
    /// Loaded separately from `order_payment`
    #[sqlx(skip)]
    pub payment: Payment,
    /// Loaded separately from `order_items`, in insertion order
    #[sqlx(skip)]
    pub items: Vec<Item>,
}

// == Delivery ==
/// Recipient contact and address, 1:1 with its order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

// == Payment ==
/// Transaction details, 1:1 with its order. `amount` is never negative once stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct Payment {
    #[serde(rename = "transaction")]
    pub transaction_id: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i32,
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i32,
    pub goods_total: i32,
    pub custom_fee: i32,
}

// == Item ==
/// One line item. Items are replaced wholesale on every write of their order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i32,
    pub rid: String,
    pub name: String,
    pub sale: i32,
    pub size: String,
    pub total_price: i32,
    pub nm_id: i64,
    pub brand: String,
    pub status: i32,
}
