//! Producer and consumer configuration, overridable from the environment.

use crate::error::{ClickLogError, Result};
use rdkafka::config::ClientConfig;
use std::time::Duration;

/// Topic click logs are published to.
pub const DEFAULT_TOPIC: &str = "click-logs";
pub const DEFAULT_BOOTSTRAP_SERVERS: &str = "localhost:9092";
pub const DEFAULT_GROUP_ID: &str = "click-log-consumer-group";

pub const ENV_BOOTSTRAP_SERVERS: &str = "CLICKLOG_BOOTSTRAP_SERVERS";
pub const ENV_TOPIC: &str = "CLICKLOG_TOPIC";
pub const ENV_GROUP_ID: &str = "CLICKLOG_GROUP_ID";
pub const ENV_MAX_POLL_RECORDS: &str = "CLICKLOG_MAX_POLL_RECORDS";
pub const ENV_POLL_TIMEOUT_MS: &str = "CLICKLOG_POLL_TIMEOUT_MS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProducerConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    /// Required acknowledgements (`all` waits for every in-sync replica).
    pub acks: String,
    pub retries: u32,
    pub batch_size: u32,
    pub linger_ms: u64,
    /// Total bytes the client may buffer before sends block.
    pub buffer_memory: u64,
    /// Queue timeout for a single send.
    pub send_timeout: Duration,
    /// Pause between the start-up sample sends.
    pub sample_delay: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: DEFAULT_BOOTSTRAP_SERVERS.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            acks: "all".to_string(),
            retries: 3,
            batch_size: 16_384,
            linger_ms: 1,
            buffer_memory: 33_554_432,
            send_timeout: Duration::from_secs(5),
            sample_delay: Duration::from_millis(100),
        }
    }
}

impl ProducerConfig {
    /// Defaults overridden by `CLICKLOG_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(servers) = lookup(ENV_BOOTSTRAP_SERVERS) {
            config.bootstrap_servers = servers;
        }
        if let Some(topic) = lookup(ENV_TOPIC) {
            config.topic = topic;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("bootstrap servers", &self.bootstrap_servers)?;
        require_non_empty("topic", &self.topic)
    }

    /// librdkafka properties for a `FutureProducer`.
    pub fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("acks", &self.acks)
            .set("message.send.max.retries", self.retries.to_string())
            .set("batch.size", self.batch_size.to_string())
            .set("linger.ms", self.linger_ms.to_string())
            .set(
                "queue.buffering.max.kbytes",
                (self.buffer_memory / 1024).to_string(),
            )
            .set(
                "message.timeout.ms",
                self.send_timeout.as_millis().to_string(),
            );
        client_config
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    pub group_id: String,
    /// Where a group without a committed offset starts reading.
    pub auto_offset_reset: String,
    pub enable_auto_commit: bool,
    pub auto_commit_interval_ms: u64,
    pub session_timeout_ms: u64,
    /// Upper bound on records handed to the processing loop per poll.
    pub max_poll_records: usize,
    pub poll_timeout: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: DEFAULT_BOOTSTRAP_SERVERS.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            group_id: DEFAULT_GROUP_ID.to_string(),
            auto_offset_reset: "earliest".to_string(),
            enable_auto_commit: true,
            auto_commit_interval_ms: 1000,
            session_timeout_ms: 30_000,
            max_poll_records: 100,
            poll_timeout: Duration::from_millis(1000),
        }
    }
}

impl ConsumerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(servers) = lookup(ENV_BOOTSTRAP_SERVERS) {
            config.bootstrap_servers = servers;
        }
        if let Some(topic) = lookup(ENV_TOPIC) {
            config.topic = topic;
        }
        if let Some(group_id) = lookup(ENV_GROUP_ID) {
            config.group_id = group_id;
        }
        if let Some(raw) = lookup(ENV_MAX_POLL_RECORDS) {
            config.max_poll_records = parse_number(ENV_MAX_POLL_RECORDS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_POLL_TIMEOUT_MS) {
            config.poll_timeout = Duration::from_millis(parse_number(ENV_POLL_TIMEOUT_MS, &raw)?);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("bootstrap servers", &self.bootstrap_servers)?;
        require_non_empty("topic", &self.topic)?;
        require_non_empty("group id", &self.group_id)?;
        if self.max_poll_records == 0 {
            return Err(ClickLogError::Config(
                "max poll records must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// librdkafka properties for a `StreamConsumer`.
    pub fn client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("group.id", &self.group_id)
            .set("auto.offset.reset", &self.auto_offset_reset)
            .set("enable.auto.commit", self.enable_auto_commit.to_string())
            .set(
                "auto.commit.interval.ms",
                self.auto_commit_interval_ms.to_string(),
            )
            .set("session.timeout.ms", self.session_timeout_ms.to_string());
        client_config
    }
}

fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClickLogError::Config(format!("{} must not be empty", what)));
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ClickLogError::Config(format!("{} is not a valid number: {:?}", name, raw)))
}
