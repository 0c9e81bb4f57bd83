//! Interactive click-log producer: samples first, then one click per stdin line.
//!
//! Broker and topic come from CLICKLOG_BOOTSTRAP_SERVERS and CLICKLOG_TOPIC.

use clicklog::{app, observability, ClickLogProducer, KafkaSink, ProducerConfig};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_tracing()?;

    let config = ProducerConfig::from_env()?;
    let sink = KafkaSink::new(&config)?;
    let producer = ClickLogProducer::new(sink, config.topic.clone());

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let summary = app::run_producer(&producer, stdin, &mut stdout, config.sample_delay).await?;

    summary.log();
    observability::log_metrics_snapshot();
    Ok(())
}
