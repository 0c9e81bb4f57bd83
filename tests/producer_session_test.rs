//! Interactive producer session driven from an in-memory stdin.

use std::sync::Arc;
use std::time::Duration;

use clicklog::app::{run_producer, ProducerSummary};
use clicklog::{ClickLog, ClickLogProducer, MemoryBroker, MemoryProducer, SampleReport};

fn producer(broker: &Arc<MemoryBroker>) -> ClickLogProducer<MemoryProducer> {
    ClickLogProducer::new(MemoryProducer::new(Arc::clone(broker)), "click-logs")
}

fn published(broker: &MemoryBroker) -> Vec<ClickLog> {
    let mut all = Vec::new();
    for p in 0..broker.num_partitions("click-logs").unwrap() {
        for r in broker.fetch("click-logs", p, 0, 1000).unwrap() {
            all.push(ClickLog::from_json(r.value.as_deref().unwrap()).unwrap());
        }
    }
    all
}

#[tokio::test]
async fn samples_then_lines_until_exit() {
    let broker = Arc::new(MemoryBroker::default());
    let producer = producer(&broker);
    let input: &[u8] = b"user9,search,submit\n\nbad-line\nuser9, ,x\nEXIT\nuser10,never,sent\n";
    let mut out = Vec::new();

    let summary = run_producer(&producer, input, &mut out, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(
        summary,
        ProducerSummary {
            samples: Some(SampleReport { sent: 5, total: 5 }),
            sent: 1,
            failed: 1,
            rejected_lines: 2,
        }
    );

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("=== Kafka Click Log Producer ===\n"));
    assert!(text.contains("Format: userId,page,element\n"));
    assert!(text.contains("Sample data sent: 5/5 messages\n"));
    assert!(text.contains("✅ Click log sent successfully!\n"));
    assert!(text.contains("Please enter valid data or 'exit' to quit\n"));
    assert!(text.contains("Invalid format. Use: userId,page,element\n"));
    assert!(text.contains("❌ Failed to send click log\n"));
    assert!(text.ends_with("Producer application closed\n"));

    let logs = published(&broker);
    assert_eq!(logs.len(), 6);
    assert!(logs.iter().any(|c| c.user_id == "user9" && c.page == "search"));
    assert!(!logs.iter().any(|c| c.user_id == "user10"));
}

#[tokio::test]
async fn end_of_input_behaves_like_exit() {
    let broker = Arc::new(MemoryBroker::default());
    let producer = producer(&broker);
    let input: &[u8] = b"user1,home,logo";
    let mut out = Vec::new();

    let summary = run_producer(&producer, input, &mut out, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(summary.sent, 1);
    assert_eq!(published(&broker).len(), 6);
    assert!(String::from_utf8(out)
        .unwrap()
        .ends_with("Producer application closed\n"));
}
