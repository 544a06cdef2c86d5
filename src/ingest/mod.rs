//! Ingest Module
//!
//! Everything between the message stream and the order store.

pub mod consumer;
pub mod decode;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod source;

pub use consumer::{Backoff, Consumer, ConsumerError, Outcome};
pub use decode::{decode, validate, DecodeError, ValidationError};
#[cfg(feature = "kafka")]
pub use kafka::KafkaSource;
pub use source::{Message, MessageSource, SourceError};
