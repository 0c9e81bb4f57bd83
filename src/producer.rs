//! Click-log producer: validate, encode as JSON, send keyed by user id.

use crate::error::{ClickLogError, Result};
use crate::input::sample_click_logs;
use crate::observability::observability;
use crate::transport::RecordSink;
use crate::types::{ClickLog, Delivery, Record};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of the start-up sample sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleReport {
    pub sent: usize,
    pub total: usize,
}

pub struct ClickLogProducer<S> {
    sink: S,
    topic: String,
}

impl<S: RecordSink> ClickLogProducer<S> {
    pub fn new(sink: S, topic: impl Into<String>) -> Self {
        Self {
            sink,
            topic: topic.into(),
        }
    }

    /// Send one click log and wait for the acknowledgement.
    ///
    /// Invalid click logs are rejected before anything reaches the sink.
    pub async fn send_click_log(&self, click_log: &ClickLog) -> Result<Delivery> {
        if !click_log.is_valid() {
            warn!(%click_log, "invalid click log data");
            observability().record_invalid();
            return Err(ClickLogError::InvalidClickLog(click_log.to_string()));
        }

        let record = Record::from_click_log(click_log)?;
        let started = Instant::now();
        match self.sink.send(&self.topic, record).await {
            Ok(delivery) => {
                observability().record_send(started.elapsed(), true);
                info!(
                    topic = %delivery.topic,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    "message sent successfully"
                );
                Ok(delivery)
            }
            Err(e) => {
                observability().record_send(started.elapsed(), false);
                error!(error = %e, user_id = %click_log.user_id, "failed to send click log");
                Err(e)
            }
        }
    }

    /// Send the built-in samples, pausing `delay` between sends.
    pub async fn send_samples(&self, delay: Duration) -> SampleReport {
        let samples = sample_click_logs();
        let total = samples.len();
        let mut sent = 0;
        for (i, sample) in samples.iter().enumerate() {
            if self.send_click_log(sample).await.is_ok() {
                sent += 1;
            }
            if i + 1 < total && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        SampleReport { sent, total }
    }

    /// Flush pending sends.
    pub async fn close(&self) -> Result<()> {
        self.sink.flush(CLOSE_TIMEOUT).await?;
        info!("producer closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockRecordSink;
    use chrono::NaiveDate;

    fn click(user: &str) -> ClickLog {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        ClickLog::new(user, "homepage", "login-button", ts)
    }

    #[tokio::test]
    async fn sends_json_keyed_by_user() {
        let mut sink = MockRecordSink::new();
        sink.expect_send()
            .withf(|topic, record| {
                &topic[..] == "click-logs"
                    && record.key.as_deref() == Some("user123")
                    && record.value.contains("\"userId\":\"user123\"")
            })
            .times(1)
            .returning(|topic, _| {
                Ok(Delivery {
                    topic: topic.to_string(),
                    partition: 2,
                    offset: 41,
                })
            });

        let producer = ClickLogProducer::new(sink, "click-logs");
        let delivery = producer.send_click_log(&click("user123")).await.unwrap();
        assert_eq!(delivery.partition, 2);
        assert_eq!(delivery.offset, 41);
    }

    #[tokio::test]
    async fn invalid_click_log_never_reaches_the_sink() {
        let mut sink = MockRecordSink::new();
        sink.expect_send().never();

        let producer = ClickLogProducer::new(sink, "click-logs");
        let err = producer.send_click_log(&click("   ")).await.unwrap_err();
        assert!(matches!(err, ClickLogError::InvalidClickLog(_)));
    }

    #[tokio::test]
    async fn sink_failure_is_returned_not_panicked() {
        let mut sink = MockRecordSink::new();
        sink.expect_send()
            .returning(|_, _| Err(ClickLogError::TopicNotFound("click-logs".into())));

        let producer = ClickLogProducer::new(sink, "click-logs");
        assert!(producer.send_click_log(&click("user1")).await.is_err());
    }

    #[tokio::test]
    async fn samples_count_partial_failures() {
        let mut sink = MockRecordSink::new();
        sink.expect_send().times(5).returning(|topic, record| {
            if record.key.as_deref() == Some("user002") {
                Err(ClickLogError::ConsumerGroup("broker unavailable".into()))
            } else {
                Ok(Delivery {
                    topic: topic.to_string(),
                    partition: 0,
                    offset: 0,
                })
            }
        });

        let producer = ClickLogProducer::new(sink, "click-logs");
        let report = producer.send_samples(Duration::ZERO).await;
        assert_eq!(report, SampleReport { sent: 3, total: 5 });
    }

    #[tokio::test]
    async fn close_flushes_the_sink() {
        let mut sink = MockRecordSink::new();
        sink.expect_flush().times(1).returning(|_| Ok(()));

        let producer = ClickLogProducer::new(sink, "click-logs");
        producer.close().await.unwrap();
    }
}
