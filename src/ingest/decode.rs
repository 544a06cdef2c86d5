//! Decoding and validation of inbound order payloads.

use thiserror::Error;

use crate::models::Order;
use crate::store::MAX_UID_LEN;

/// Payload is not a JSON order.
#[derive(Error, Debug)]
#[error("decode: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// First rule a decoded order breaks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl ValidationError {
    fn new(field: &'static str, reason: &'static str) -> Self {
        Self { field, reason }
    }
}

/// Parses a raw payload. Absent fields take their zero values.
pub fn decode(raw: &[u8]) -> Result<Order, DecodeError> {
    Ok(serde_json::from_slice(raw)?)
}

/// Checks the fields the store relies on. Rules are checked in order and the
/// first failure wins.
pub fn validate(order: &Order) -> Result<(), ValidationError> {
    if order.order_uid.is_empty() {
        return Err(ValidationError::new("order_uid", "empty"));
    }
    if order.order_uid.len() > MAX_UID_LEN {
        return Err(ValidationError::new("order_uid", "too long"));
    }
    if order.track_number.is_empty() {
        return Err(ValidationError::new("track_number", "empty"));
    }
    if order.payment.currency.is_empty() {
        return Err(ValidationError::new("currency", "empty"));
    }
    if order.payment.amount < 0 {
        return Err(ValidationError::new("amount", "negative"));
    }
    Ok(())
}
