//! Click-log consumer: poll, decode, report, commit.

use crate::config::ConsumerConfig;
use crate::error::{ClickLogError, Result};
use crate::observability::observability;
use crate::transport::RecordSource;
use crate::types::{ClickLog, ReceivedRecord};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Stops a running consume loop after its current poll.
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!("stop signal received");
    }

    pub fn is_stopped(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }
}

pub struct ClickLogConsumer<S> {
    source: S,
    topic: String,
    poll_timeout: Duration,
    max_poll_records: usize,
    running: Arc<AtomicBool>,
    message_count: AtomicUsize,
}

impl<S: RecordSource> ClickLogConsumer<S> {
    pub fn new(source: S, config: &ConsumerConfig) -> Self {
        Self {
            source,
            topic: config.topic.clone(),
            poll_timeout: config.poll_timeout,
            max_poll_records: config.max_poll_records,
            running: Arc::new(AtomicBool::new(true)),
            message_count: AtomicUsize::new(0),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Successfully decoded messages so far.
    pub fn message_count(&self) -> usize {
        self.message_count.load(Ordering::SeqCst)
    }

    /// Subscribe and run the poll loop until stopped.
    ///
    /// Offsets are committed after every non-empty batch. A poll or commit
    /// failure ends the loop; the source is closed either way.
    pub async fn start_consuming<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.source.subscribe(std::slice::from_ref(&self.topic)).await?;
        info!(topic = %self.topic, "starting to consume messages");
        writeln!(out, "=== Kafka Click Log Consumer Started ===")?;
        writeln!(out, "Listening for messages... (Press Ctrl+C to stop)")?;
        writeln!(out)?;

        let result = self.consume_loop(out).await;
        if let Err(e) = &result {
            error!(error = %e, "error while consuming messages");
        }
        if let Err(e) = self.source.close().await {
            error!(error = %e, "failed to close consumer");
        }
        info!("consumer closed");
        result
    }

    async fn consume_loop<W: Write>(&mut self, out: &mut W) -> Result<()> {
        while self.running.load(Ordering::SeqCst) {
            let records = self
                .source
                .poll(self.poll_timeout, self.max_poll_records)
                .await?;
            for record in &records {
                self.process_message(record, out)?;
            }
            if !records.is_empty() {
                self.source.commit().await?;
                observability().record_commit();
            }
        }
        Ok(())
    }

    /// Decode and report one record. Undecodable records are reported and
    /// skipped; only write failures are returned.
    pub fn process_message<W: Write>(&self, record: &ReceivedRecord, out: &mut W) -> Result<()> {
        let raw = record.value.as_deref().unwrap_or("null");
        match decode(record) {
            Ok(click_log) => {
                let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;
                observability().record_consumed();
                writeln!(out, "📨 Message #{} received:", count)?;
                writeln!(out, "   Key: {}", record.key.as_deref().unwrap_or("null"))?;
                writeln!(out, "   Partition: {}", record.partition)?;
                writeln!(out, "   Offset: {}", record.offset)?;
                writeln!(out, "   Click Log: {}", click_log)?;
                writeln!(out, "   Raw JSON: {}", raw)?;
                writeln!(out, "   ---")?;
                info!(
                    count,
                    user = %click_log.user_id,
                    page = %click_log.page,
                    element = %click_log.element,
                    "processed message"
                );
            }
            Err(e) => {
                observability().record_parse_failure();
                error!(
                    error = %e,
                    partition = record.partition,
                    offset = record.offset,
                    "failed to process message"
                );
                writeln!(out, "❌ Failed to parse message: {}", raw)?;
                writeln!(out, "   Error: {}", e)?;
                writeln!(out, "   ---")?;
            }
        }
        Ok(())
    }
}

fn decode(record: &ReceivedRecord) -> Result<ClickLog> {
    let value = record
        .value
        .as_deref()
        .ok_or_else(|| ClickLogError::InvalidClickLog("record has no value".into()))?;
    ClickLog::from_json(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockRecordSource;
    use chrono::NaiveDate;

    fn click_record(offset: i64) -> ReceivedRecord {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let json = ClickLog::new("user1", "homepage", "login-button", ts)
            .to_json()
            .unwrap();
        ReceivedRecord {
            topic: "click-logs".into(),
            partition: 0,
            offset,
            key: Some("user1".into()),
            value: Some(json),
        }
    }

    fn config() -> ConsumerConfig {
        ConsumerConfig {
            poll_timeout: Duration::from_millis(10),
            ..ConsumerConfig::default()
        }
    }

    #[tokio::test]
    async fn poll_failure_ends_the_loop_and_closes() {
        let mut source = MockRecordSource::new();
        source.expect_subscribe().times(1).returning(|_| Ok(()));
        source
            .expect_poll()
            .times(1)
            .returning(|_, _| Err(ClickLogError::ConsumerGroup("coordinator lost".into())));
        source.expect_commit().never();
        source.expect_close().times(1).returning(|| Ok(()));

        let mut consumer = ClickLogConsumer::new(source, &config());
        let err = consumer
            .start_consuming(&mut Vec::<u8>::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClickLogError::ConsumerGroup(_)));
        assert_eq!(consumer.message_count(), 0);
    }

    #[tokio::test]
    async fn commit_failure_after_a_batch_ends_the_loop_and_closes() {
        let mut source = MockRecordSource::new();
        source.expect_subscribe().times(1).returning(|_| Ok(()));
        source
            .expect_poll()
            .times(1)
            .returning(|_, _| Ok(vec![click_record(0), click_record(1)]));
        source
            .expect_commit()
            .times(1)
            .returning(|| Err(ClickLogError::InvalidOffset(2)));
        source.expect_close().times(1).returning(|| Ok(()));

        let mut consumer = ClickLogConsumer::new(source, &config());
        let mut out = Vec::<u8>::new();
        let err = consumer.start_consuming(&mut out).await.unwrap_err();
        assert!(matches!(err, ClickLogError::InvalidOffset(2)));
        assert_eq!(consumer.message_count(), 2);
        assert!(String::from_utf8(out).unwrap().contains("📨 Message #2 received:"));
    }

    #[tokio::test]
    async fn empty_poll_is_not_committed() {
        let mut source = MockRecordSource::new();
        source.expect_subscribe().returning(|_| Ok(()));
        source.expect_commit().never();
        source.expect_close().times(1).returning(|| Ok(()));

        let mut consumer = ClickLogConsumer::new(source, &config());
        let stop = consumer.stop_handle();
        consumer.source.expect_poll().times(1).returning(move |_, _| {
            stop.stop();
            Ok(Vec::new())
        });
        consumer.start_consuming(&mut Vec::<u8>::new()).await.unwrap();
    }
}
