//! In-memory broker: topics, partition logs and committed group offsets.

use super::partitioner::partition_for_key;
use crate::error::{ClickLogError, Result};
use crate::types::{ReceivedRecord, Record};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Per-topic configuration.
#[derive(Clone, Debug)]
pub struct TopicConfig {
    pub num_partitions: i32,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self { num_partitions: 1 }
    }
}

/// Broker-wide configuration.
#[derive(Clone, Debug, Default)]
pub struct BrokerConfig {
    /// Used for topics created implicitly by produce or subscribe.
    pub default_topic_config: TopicConfig,
}

/// Append-only log of one partition; offsets are indexes into `records`.
#[derive(Default)]
struct PartitionLog {
    records: RwLock<Vec<Record>>,
}

impl PartitionLog {
    fn append(&self, record: Record) -> i64 {
        let mut records = self.records.write();
        records.push(record);
        records.len() as i64 - 1
    }

    fn high_water_mark(&self) -> i64 {
        self.records.read().len() as i64
    }

    fn read_range(&self, start_offset: i64, max_records: usize) -> Result<Vec<(i64, Record)>> {
        let records = self.records.read();
        if start_offset < 0 || start_offset > records.len() as i64 {
            return Err(ClickLogError::InvalidOffset(start_offset));
        }
        Ok(records
            .iter()
            .enumerate()
            .skip(start_offset as usize)
            .take(max_records)
            .map(|(offset, record)| (offset as i64, record.clone()))
            .collect())
    }
}

struct Topic {
    partitions: Vec<Arc<PartitionLog>>,
    /// Next partition for unkeyed records.
    round_robin: AtomicUsize,
}

/// Kafka-semantics broker living inside the process.
pub struct MemoryBroker {
    config: BrokerConfig,
    topics: DashMap<String, Arc<Topic>>,
    /// Committed offsets: (group_id, topic, partition) -> next offset to read.
    offsets: DashMap<(String, String, i32), i64>,
    appended: Notify,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

impl MemoryBroker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            topics: DashMap::new(),
            offsets: DashMap::new(),
            appended: Notify::new(),
        }
    }

    /// Create a topic. Idempotent, but the partition count cannot change.
    pub fn create_topic(&self, name: impl AsRef<str>, config: Option<TopicConfig>) -> Result<()> {
        let name = name.as_ref();
        let config = config.unwrap_or_else(|| self.config.default_topic_config.clone());
        if config.num_partitions < 1 {
            return Err(ClickLogError::Config(format!(
                "Topic {} needs at least one partition",
                name
            )));
        }
        if let Some(existing) = self.topics.get(name) {
            if existing.partitions.len() != config.num_partitions as usize {
                return Err(ClickLogError::Config(format!(
                    "Topic {} exists with {} partitions, cannot change to {}",
                    name,
                    existing.partitions.len(),
                    config.num_partitions
                )));
            }
            return Ok(());
        }
        let topic = Topic {
            partitions: (0..config.num_partitions)
                .map(|_| Arc::new(PartitionLog::default()))
                .collect(),
            round_robin: AtomicUsize::new(0),
        };
        self.topics
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(topic));
        Ok(())
    }

    /// Ensure topic exists (create with default config if not).
    pub fn ensure_topic(&self, name: impl AsRef<str>) -> Result<()> {
        let name = name.as_ref();
        if !self.topics.contains_key(name) {
            self.create_topic(name, None)?;
        }
        Ok(())
    }

    fn topic(&self, name: &str) -> Result<Arc<Topic>> {
        self.topics
            .get(name)
            .map(|t| Arc::clone(&t))
            .ok_or_else(|| ClickLogError::TopicNotFound(name.to_string()))
    }

    fn partition_log(&self, topic: &str, partition: i32) -> Result<Arc<PartitionLog>> {
        let t = self.topic(topic)?;
        usize::try_from(partition)
            .ok()
            .and_then(|idx| t.partitions.get(idx))
            .cloned()
            .ok_or_else(|| ClickLogError::PartitionNotFound {
                topic: topic.to_string(),
                partition,
            })
    }

    /// Append a record; returns (partition, offset).
    ///
    /// Without an explicit partition, keyed records are hashed and unkeyed
    /// records are spread round-robin.
    pub fn produce(
        &self,
        topic: impl AsRef<str>,
        partition: Option<i32>,
        record: Record,
    ) -> Result<(i32, i64)> {
        let topic_name = topic.as_ref();
        self.ensure_topic(topic_name)?;
        let topic = self.topic(topic_name)?;
        let num_partitions = topic.partitions.len() as i32;
        let partition_id = match (partition, record.key.as_deref()) {
            (Some(p), _) => p,
            (None, Some(key)) => partition_for_key(key.as_bytes(), num_partitions),
            (None, None) => {
                (topic.round_robin.fetch_add(1, Ordering::Relaxed) % num_partitions as usize)
                    as i32
            }
        };
        let log = self.partition_log(topic_name, partition_id)?;
        let offset = log.append(record);
        self.appended.notify_waiters();
        Ok((partition_id, offset))
    }

    /// Read from `start_offset` (inclusive) up to `max_records`.
    pub fn fetch(
        &self,
        topic: &str,
        partition: i32,
        start_offset: i64,
        max_records: usize,
    ) -> Result<Vec<ReceivedRecord>> {
        let log = self.partition_log(topic, partition)?;
        Ok(log
            .read_range(start_offset, max_records)?
            .into_iter()
            .map(|(offset, record)| ReceivedRecord {
                topic: topic.to_string(),
                partition,
                offset,
                key: record.key,
                value: Some(record.value),
            })
            .collect())
    }

    /// Next offset to be assigned in a partition.
    pub fn high_water_mark(&self, topic: &str, partition: i32) -> Result<i64> {
        Ok(self.partition_log(topic, partition)?.high_water_mark())
    }

    pub fn num_partitions(&self, topic: &str) -> Result<i32> {
        Ok(self.topic(topic)?.partitions.len() as i32)
    }

    /// Commit the next offset to read for a consumer group.
    pub fn offset_commit(
        &self,
        group_id: &str,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<()> {
        let log = self.partition_log(topic, partition)?;
        if offset < 0 || offset > log.high_water_mark() {
            return Err(ClickLogError::InvalidOffset(offset));
        }
        self.offsets
            .insert((group_id.to_string(), topic.to_string(), partition), offset);
        Ok(())
    }

    /// Committed offset of a group, `None` if the group never committed.
    pub fn offset_fetch(&self, group_id: &str, topic: &str, partition: i32) -> Result<Option<i64>> {
        let _ = self.partition_log(topic, partition)?;
        Ok(self
            .offsets
            .get(&(group_id.to_string(), topic.to_string(), partition))
            .map(|r| *r))
    }

    /// Notified after every append.
    pub(super) fn appended(&self) -> &Notify {
        &self.appended
    }
}
