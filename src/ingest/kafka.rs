//! Kafka Message Source
//!
//! [`MessageSource`] over an `rdkafka` stream consumer with manual offset
//! commits. Offsets start from the earliest record for a new group.

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::{Message as _, Offset, TopicPartitionList};
use tracing::info;

use crate::ingest::source::{Message, MessageSource, SourceError};

pub struct KafkaSource {
    consumer: StreamConsumer,
}

impl KafkaSource {
    /// Creates the consumer and subscribes it to `topic`.
    pub fn connect(brokers: &[String], group: &str, topic: &str) -> Result<Self, KafkaError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers.join(","))
            .set("group.id", group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()?;
        consumer.subscribe(&[topic])?;

        info!(brokers = %brokers.join(","), group, topic, "Kafka consumer subscribed");
        Ok(Self { consumer })
    }
}

#[async_trait]
impl MessageSource for KafkaSource {
    async fn fetch(&mut self) -> Result<Message, SourceError> {
        let record = self.consumer.recv().await.map_err(transport)?;

        Ok(Message {
            key: record.key().map(<[u8]>::to_vec),
            payload: record.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            topic: record.topic().to_string(),
            partition: record.partition(),
            offset: record.offset(),
        })
    }

    /// Commits the offset after `message`, synchronously.
    ///
    /// The sync commit blocks on the broker, so it runs under `block_in_place`;
    /// this needs the multi-threaded runtime.
    async fn commit(&mut self, message: &Message) -> Result<(), SourceError> {
        let offsets = next_offsets(message).map_err(transport)?;
        let consumer = &self.consumer;

        tokio::task::block_in_place(|| consumer.commit(&offsets, CommitMode::Sync))
            .map_err(transport)
    }
}

/// Position to resume from once `message` is processed.
fn next_offsets(message: &Message) -> Result<TopicPartitionList, KafkaError> {
    let mut offsets = TopicPartitionList::new();
    offsets.add_partition_offset(
        &message.topic,
        message.partition,
        Offset::Offset(message.offset + 1),
    )?;
    Ok(offsets)
}

fn transport(err: KafkaError) -> SourceError {
    SourceError::Transport(err.to_string())
}
