//! Click-log consumer: prints every record of the topic until Ctrl+C.
//!
//! Broker, topic and group come from CLICKLOG_BOOTSTRAP_SERVERS,
//! CLICKLOG_TOPIC and CLICKLOG_GROUP_ID.

use clicklog::{app, observability, ClickLogConsumer, ConsumerConfig, KafkaSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_tracing()?;

    let config = ConsumerConfig::from_env()?;
    let source = KafkaSource::new(&config)?;
    let consumer = ClickLogConsumer::new(source, &config);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    let mut stdout = std::io::stdout();
    let result = app::run_consumer(consumer, &mut stdout, shutdown).await;
    observability::log_metrics_snapshot();
    result?;
    Ok(())
}
