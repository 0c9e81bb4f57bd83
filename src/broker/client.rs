//! Producer and consumer clients for the in-memory broker.

use super::MemoryBroker;
use crate::error::{ClickLogError, Result};
use crate::transport::{RecordSink, RecordSource};
use crate::types::{Delivery, ReceivedRecord, Record};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Topic partition assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: i32,
}

pub struct MemoryProducer {
    broker: Arc<MemoryBroker>,
}

impl MemoryProducer {
    pub fn new(broker: Arc<MemoryBroker>) -> Self {
        Self { broker }
    }
}

#[async_trait]
impl RecordSink for MemoryProducer {
    async fn send(&self, topic: &str, record: Record) -> Result<Delivery> {
        let (partition, offset) = self.broker.produce(topic, None, record)?;
        Ok(Delivery {
            topic: topic.to_string(),
            partition,
            offset,
        })
    }

    async fn flush(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}

/// Consumer over the in-memory broker. Without a committed offset a group
/// starts at the beginning of each partition.
pub struct MemoryConsumer {
    broker: Arc<MemoryBroker>,
    group_id: Option<String>,
    assignment: Vec<TopicPartition>,
    /// Next offset to read per assigned partition.
    positions: HashMap<TopicPartition, i64>,
}

impl MemoryConsumer {
    pub fn new(broker: Arc<MemoryBroker>) -> Self {
        Self {
            broker,
            group_id: None,
            assignment: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn assignment(&self) -> &[TopicPartition] {
        &self.assignment
    }

    /// Current position (next offset to read) for a partition.
    pub fn position(&self, topic: &str, partition: i32) -> Result<i64> {
        let tp = TopicPartition {
            topic: topic.to_string(),
            partition,
        };
        self.positions
            .get(&tp)
            .copied()
            .ok_or_else(|| ClickLogError::PartitionNotFound {
                topic: topic.to_string(),
                partition,
            })
    }

    pub fn seek(&mut self, topic: &str, partition: i32, offset: i64) -> Result<()> {
        let tp = TopicPartition {
            topic: topic.to_string(),
            partition,
        };
        if !self.assignment.contains(&tp) {
            return Err(ClickLogError::PartitionNotFound {
                topic: topic.to_string(),
                partition,
            });
        }
        self.positions.insert(tp, offset);
        Ok(())
    }

    fn committed_or_earliest(&self, topic: &str, partition: i32) -> Result<i64> {
        match &self.group_id {
            Some(group) => Ok(self
                .broker
                .offset_fetch(group, topic, partition)?
                .unwrap_or(0)),
            None => Ok(0),
        }
    }

    fn fetch_available(&mut self, max_records: usize) -> Result<Vec<ReceivedRecord>> {
        let mut batch = Vec::new();
        for tp in &self.assignment {
            let remaining = max_records - batch.len();
            if remaining == 0 {
                break;
            }
            let start = self.positions.get(tp).copied().unwrap_or(0);
            let records = self
                .broker
                .fetch(&tp.topic, tp.partition, start, remaining)?;
            if let Some(last) = records.last() {
                self.positions.insert(tp.clone(), last.offset + 1);
            }
            batch.extend(records);
        }
        Ok(batch)
    }
}

#[async_trait]
impl RecordSource for MemoryConsumer {
    /// Assigns every partition of each topic.
    async fn subscribe(&mut self, topics: &[String]) -> Result<()> {
        let mut assignment = Vec::new();
        for topic in topics {
            self.broker.ensure_topic(topic)?;
            for partition in 0..self.broker.num_partitions(topic)? {
                let tp = TopicPartition {
                    topic: topic.clone(),
                    partition,
                };
                if !self.positions.contains_key(&tp) {
                    let start = self.committed_or_earliest(topic, partition)?;
                    self.positions.insert(tp.clone(), start);
                }
                assignment.push(tp);
            }
        }
        self.assignment = assignment;
        Ok(())
    }

    async fn poll(&mut self, timeout: Duration, max_records: usize) -> Result<Vec<ReceivedRecord>> {
        let broker = Arc::clone(&self.broker);
        let appended = broker.appended().notified();
        tokio::pin!(appended);
        appended.as_mut().enable();

        let batch = self.fetch_available(max_records)?;
        if !batch.is_empty() || timeout.is_zero() {
            return Ok(batch);
        }
        if tokio::time::timeout(timeout, appended).await.is_err() {
            return Ok(batch);
        }
        self.fetch_available(max_records)
    }

    async fn commit(&mut self) -> Result<()> {
        let group_id = self
            .group_id
            .as_ref()
            .ok_or_else(|| ClickLogError::ConsumerGroup("No group_id set".into()))?;
        for tp in &self.assignment {
            let offset = self.positions.get(tp).copied().unwrap_or(0);
            self.broker
                .offset_commit(group_id, &tp.topic, tp.partition, offset)?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.assignment.clear();
        Ok(())
    }
}
