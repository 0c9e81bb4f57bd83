//! Process-wide counters and tracing setup.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LATENCY_WINDOW: usize = 10_000;

pub struct Observability {
    records_sent_total: AtomicU64,
    send_failures_total: AtomicU64,
    invalid_click_logs_total: AtomicU64,
    records_consumed_total: AtomicU64,
    parse_failures_total: AtomicU64,
    commits_total: AtomicU64,
    send_latency_ms: Mutex<VecDeque<u64>>,
}

impl Observability {
    fn new() -> Self {
        Self {
            records_sent_total: AtomicU64::new(0),
            send_failures_total: AtomicU64::new(0),
            invalid_click_logs_total: AtomicU64::new(0),
            records_consumed_total: AtomicU64::new(0),
            parse_failures_total: AtomicU64::new(0),
            commits_total: AtomicU64::new(0),
            send_latency_ms: Mutex::new(VecDeque::with_capacity(LATENCY_WINDOW)),
        }
    }

    pub fn record_send(&self, latency: Duration, ok: bool) {
        if ok {
            self.records_sent_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.send_failures_total.fetch_add(1, Ordering::Relaxed);
        }
        let mut window = self.send_latency_ms.lock();
        if window.len() >= LATENCY_WINDOW {
            window.pop_front();
        }
        window.push_back(latency.as_millis() as u64);
    }

    pub fn record_invalid(&self) {
        self.invalid_click_logs_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_consumed(&self) {
        self.records_consumed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit(&self) {
        self.commits_total.fetch_add(1, Ordering::Relaxed);
    }

    fn p99_send_latency_ms(&self) -> u64 {
        let window = self.send_latency_ms.lock();
        if window.is_empty() {
            return 0;
        }
        let mut v: Vec<u64> = window.iter().copied().collect();
        v.sort_unstable();
        let idx = ((v.len() as f64) * 0.99).floor() as usize;
        v[idx.min(v.len() - 1)]
    }

    /// Prometheus text exposition of all counters.
    pub fn render_prometheus(&self) -> String {
        let counters = [
            ("clicklog_records_sent_total", &self.records_sent_total),
            ("clicklog_send_failures_total", &self.send_failures_total),
            (
                "clicklog_invalid_click_logs_total",
                &self.invalid_click_logs_total,
            ),
            ("clicklog_records_consumed_total", &self.records_consumed_total),
            ("clicklog_parse_failures_total", &self.parse_failures_total),
            ("clicklog_commits_total", &self.commits_total),
        ];
        let mut out = String::new();
        for (name, value) in counters {
            out.push_str(&format!("# TYPE {} counter\n", name));
            out.push_str(&format!("{} {}\n", name, value.load(Ordering::Relaxed)));
        }
        out.push_str("# TYPE clicklog_send_latency_p99_ms gauge\n");
        out.push_str(&format!(
            "clicklog_send_latency_p99_ms {}\n",
            self.p99_send_latency_ms()
        ));
        out
    }
}

static OBS: OnceLock<Observability> = OnceLock::new();

pub fn observability() -> &'static Observability {
    OBS.get_or_init(Observability::new)
}

const DEFAULT_LOG_FILTER: &str = "clicklog=info";

/// Install the fmt subscriber on stderr; stdout belongs to the console UI.
/// `RUST_LOG` replaces the default `clicklog=info` filter when set.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref())?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

fn log_filter(directives: Option<&str>) -> anyhow::Result<EnvFilter> {
    let directives = directives
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER);
    Ok(EnvFilter::try_new(directives)?)
}

/// Log the counters at debug level, typically once on exit.
pub fn log_metrics_snapshot() {
    debug!("{}", observability().render_prometheus());
}
