//! rdkafka-backed transport: `FutureProducer` sink and `StreamConsumer` source.

use crate::config::{ConsumerConfig, ProducerConfig};
use crate::error::Result;
use crate::transport::{RecordSink, RecordSource};
use crate::types::{Delivery, ReceivedRecord, Record};
use async_trait::async_trait;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use std::time::Duration;
use tracing::{debug, info};

pub struct KafkaSink {
    producer: FutureProducer,
    send_timeout: Duration,
}

impl KafkaSink {
    pub fn new(config: &ProducerConfig) -> Result<Self> {
        config.validate()?;
        let producer: FutureProducer = config.client_config().create()?;
        info!(
            bootstrap = %config.bootstrap_servers,
            acks = %config.acks,
            "kafka producer created"
        );
        Ok(Self {
            producer,
            send_timeout: config.send_timeout,
        })
    }
}

#[async_trait]
impl RecordSink for KafkaSink {
    async fn send(&self, topic: &str, record: Record) -> Result<Delivery> {
        let mut future_record = FutureRecord::<str, str>::to(topic).payload(record.value.as_str());
        if let Some(key) = record.key.as_deref() {
            future_record = future_record.key(key);
        }
        let delivery = self
            .producer
            .send(future_record, self.send_timeout)
            .await
            .map_err(|(err, _)| err)?;
        Ok(Delivery {
            topic: topic.to_string(),
            partition: delivery.partition,
            offset: delivery.offset,
        })
    }

    async fn flush(&self, timeout: Duration) -> Result<()> {
        // librdkafka's flush blocks the calling thread until the queue drains.
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(timeout)).await??;
        Ok(())
    }
}

pub struct KafkaSource {
    consumer: StreamConsumer,
}

impl KafkaSource {
    pub fn new(config: &ConsumerConfig) -> Result<Self> {
        config.validate()?;
        let consumer: StreamConsumer = config.client_config().create()?;
        info!(
            bootstrap = %config.bootstrap_servers,
            group = %config.group_id,
            "kafka consumer created"
        );
        Ok(Self { consumer })
    }

    async fn recv_within(&self, timeout: Duration) -> Result<Option<ReceivedRecord>> {
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => Ok(None),
            Ok(Err(e)) => Err(e.into()),
            Ok(Ok(msg)) => Ok(Some(ReceivedRecord::from_bytes(
                msg.topic(),
                msg.partition(),
                msg.offset(),
                msg.key(),
                msg.payload(),
            ))),
        }
    }
}

#[async_trait]
impl RecordSource for KafkaSource {
    async fn subscribe(&mut self, topics: &[String]) -> Result<()> {
        let topics: Vec<&str> = topics.iter().map(String::as_str).collect();
        self.consumer.subscribe(&topics)?;
        Ok(())
    }

    async fn poll(&mut self, timeout: Duration, max_records: usize) -> Result<Vec<ReceivedRecord>> {
        let mut batch = Vec::new();
        let Some(first) = self.recv_within(timeout).await? else {
            return Ok(batch);
        };
        batch.push(first);
        // Drain what librdkafka already has queued without waiting again.
        while batch.len() < max_records {
            match self.recv_within(Duration::ZERO).await? {
                Some(record) => batch.push(record),
                None => break,
            }
        }
        debug!(records = batch.len(), "polled batch");
        Ok(batch)
    }

    async fn commit(&mut self) -> Result<()> {
        self.consumer.commit_consumer_state(CommitMode::Sync)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.consumer.unsubscribe();
        Ok(())
    }
}
