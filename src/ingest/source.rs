//! Message Source Module
//!
//! The consumer's view of the stream: fetch the next message, acknowledge a
//! handled one.

use async_trait::async_trait;
use thiserror::Error;

// == Message ==
/// One record read from the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl Message {
    /// Key decoded as UTF-8, when present and valid.
    pub fn key_str(&self) -> Option<&str> {
        self.key
            .as_deref()
            .and_then(|key| std::str::from_utf8(key).ok())
    }
}

// == Source Error ==
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source was shut down while waiting
    #[error("source cancelled")]
    Cancelled,

    /// Broker or transport failure
    #[error("transport: {0}")]
    Transport(String),
}

// == Message Source Trait ==
/// A stream with explicit, per-message acknowledgment.
#[async_trait]
pub trait MessageSource: Send {
    /// Waits for the next message.
    async fn fetch(&mut self) -> Result<Message, SourceError>;

    /// Marks `message` as fully handled so it is not redelivered.
    async fn commit(&mut self, message: &Message) -> Result<(), SourceError>;
}
