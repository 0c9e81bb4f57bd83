//! Transport seams between the click-log core and a broker.

use crate::error::Result;
use crate::types::{Delivery, ReceivedRecord, Record};
use async_trait::async_trait;
use std::time::Duration;

/// Destination for outgoing records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Send one record and wait for the broker acknowledgement.
    async fn send(&self, topic: &str, record: Record) -> Result<Delivery>;

    /// Wait for in-flight records to be delivered.
    async fn flush(&self, timeout: Duration) -> Result<()>;
}

/// Source of records for a consumer group member.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSource: Send {
    async fn subscribe(&mut self, topics: &[String]) -> Result<()>;

    /// Wait up to `timeout` for records; returns at most `max_records`.
    /// An empty batch means the timeout elapsed.
    async fn poll(&mut self, timeout: Duration, max_records: usize) -> Result<Vec<ReceivedRecord>>;

    /// Commit the current position of every assigned partition.
    async fn commit(&mut self) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}
