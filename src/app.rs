//! Console sessions behind the `producer` and `consumer` binaries.

use crate::consumer::ClickLogConsumer;
use crate::error::Result;
use crate::input::{parse_line, InputLine, INPUT_EXAMPLE, INPUT_FORMAT};
use crate::producer::{ClickLogProducer, SampleReport};
use crate::transport::{RecordSink, RecordSource};
use std::future::Future;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info};

/// What an interactive producer session did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerSummary {
    pub samples: Option<SampleReport>,
    pub sent: usize,
    pub failed: usize,
    pub rejected_lines: usize,
}

impl ProducerSummary {
    pub fn log(&self) {
        info!(
            sent = self.sent,
            failed = self.failed,
            rejected = self.rejected_lines,
            "producer session finished"
        );
    }
}

/// Send the samples, then one click log per input line until `exit` or EOF.
/// The producer is closed before returning, whatever happened.
pub async fn run_producer<S, R, W>(
    producer: &ClickLogProducer<S>,
    input: R,
    out: &mut W,
    sample_delay: Duration,
) -> Result<ProducerSummary>
where
    S: RecordSink,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let result = producer_session(producer, input, out, sample_delay).await;
    if let Err(e) = producer.close().await {
        error!(error = %e, "failed to close producer");
    }
    writeln!(out, "Producer application closed")?;
    result
}

async fn producer_session<S, R, W>(
    producer: &ClickLogProducer<S>,
    input: R,
    out: &mut W,
    sample_delay: Duration,
) -> Result<ProducerSummary>
where
    S: RecordSink,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut summary = ProducerSummary::default();
    writeln!(out, "=== Kafka Click Log Producer ===")?;
    writeln!(out, "Enter click log data (type 'exit' to quit)")?;
    writeln!(out, "Format: {}", INPUT_FORMAT)?;
    writeln!(out, "Example: {}", INPUT_EXAMPLE)?;
    writeln!(out)?;

    writeln!(out, "Sending sample click logs...")?;
    let report = producer.send_samples(sample_delay).await;
    writeln!(
        out,
        "Sample data sent: {}/{} messages",
        report.sent, report.total
    )?;
    writeln!(out)?;
    summary.samples = Some(report);

    let mut lines = input.lines();
    loop {
        write!(out, "Enter click log data: ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_line(&line) {
            InputLine::Exit => break,
            InputLine::Empty => {
                summary.rejected_lines += 1;
                writeln!(out, "Please enter valid data or 'exit' to quit")?;
            }
            InputLine::InvalidFormat => {
                summary.rejected_lines += 1;
                writeln!(out, "Invalid format. Use: {}", INPUT_FORMAT)?;
            }
            InputLine::Click(click_log) => match producer.send_click_log(&click_log).await {
                Ok(_) => {
                    summary.sent += 1;
                    writeln!(out, "✅ Click log sent successfully!")?;
                }
                Err(_) => {
                    summary.failed += 1;
                    writeln!(out, "❌ Failed to send click log")?;
                }
            },
        }
    }
    Ok(summary)
}

/// Consume until `shutdown` resolves, then print the totals.
/// Returns the number of messages processed.
pub async fn run_consumer<S, W, F>(
    mut consumer: ClickLogConsumer<S>,
    out: &mut W,
    shutdown: F,
) -> Result<usize>
where
    S: RecordSource,
    W: Write,
    F: Future<Output = ()> + Send + 'static,
{
    let stop = consumer.stop_handle();
    let trigger = stop.clone();
    let watcher = tokio::spawn(async move {
        shutdown.await;
        trigger.stop();
    });

    let result = consumer.start_consuming(out).await;
    watcher.abort();

    if stop.is_stopped() {
        writeln!(out)?;
        writeln!(out, "Shutdown signal received...")?;
    }
    let total = consumer.message_count();
    writeln!(out, "Total messages processed: {}", total)?;
    writeln!(out, "Consumer application stopped.")?;
    result.map(|()| total)
}
