//! In-process broker with Kafka semantics, used as a transport in tests.

mod client;
mod partitioner;
mod topic;

pub use client::{MemoryConsumer, MemoryProducer, TopicPartition};
pub use partitioner::{murmur2, partition_for_key};
pub use topic::{BrokerConfig, MemoryBroker, TopicConfig};
