//! clicklog: click-log producer and consumer over Kafka.

pub mod app;
pub mod broker;
pub mod config;
pub mod consumer;
pub mod error;
pub mod input;
pub mod kafka;
pub mod observability;
pub mod producer;
pub mod transport;
pub mod types;

pub use broker::{BrokerConfig, MemoryBroker, MemoryConsumer, MemoryProducer, TopicConfig};
pub use config::{ConsumerConfig, ProducerConfig};
pub use consumer::{ClickLogConsumer, StopHandle};
pub use error::{ClickLogError, Result};
pub use kafka::{KafkaSink, KafkaSource};
pub use producer::{ClickLogProducer, SampleReport};
pub use transport::{RecordSink, RecordSource};
pub use types::{ClickLog, Delivery, ReceivedRecord, Record};
