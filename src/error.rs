//! Error types for the click-log pipeline.

use thiserror::Error;

/// Result alias for producer, consumer and transport operations.
pub type Result<T> = std::result::Result<T, ClickLogError>;

/// Errors that can occur while producing or consuming click logs.
#[derive(Error, Debug)]
pub enum ClickLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid click log: {0}")]
    InvalidClickLog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    #[error("Partition not found: {topic}/{partition}")]
    PartitionNotFound { topic: String, partition: i32 },

    #[error("Invalid offset: {0}")]
    InvalidOffset(i64),

    #[error("Consumer group error: {0}")]
    ConsumerGroup(String),
}
