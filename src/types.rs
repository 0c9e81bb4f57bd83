//! Core types shared by the producer and consumer.

use crate::error::{ClickLogError, Result};
use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire format of `ClickLog::timestamp` (ISO-8601 with a literal `Z`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One user interaction, published as the JSON value of a Kafka record.
///
/// The user id doubles as the record key so that every click of a user lands
/// on the same partition. Unknown JSON fields are ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickLog {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub page: String,
    pub element: String,
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
}

impl ClickLog {
    pub fn new(
        user_id: impl Into<String>,
        page: impl Into<String>,
        element: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            page: page.into(),
            element: element.into(),
            timestamp,
        }
    }

    /// Click log stamped with the current local time (whole seconds).
    pub fn now(
        user_id: impl Into<String>,
        page: impl Into<String>,
        element: impl Into<String>,
    ) -> Self {
        let now = Local::now().naive_local();
        let timestamp = now.with_nanosecond(0).unwrap_or(now);
        Self::new(user_id, page, element, timestamp)
    }

    /// All text fields must be non-blank.
    pub fn is_valid(&self) -> bool {
        !self.user_id.trim().is_empty()
            && !self.page.trim().is_empty()
            && !self.element.trim().is_empty()
    }

    /// Record key (the user id).
    pub fn key(&self) -> &str {
        &self.user_id
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(ClickLogError::from)
    }
}

impl fmt::Display for ClickLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClickLog{{userId='{}', page='{}', element='{}', timestamp={}}}",
            self.user_id,
            self.page,
            self.element,
            self.timestamp.format(DISPLAY_TIMESTAMP_FORMAT)
        )
    }
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Outgoing record: UTF-8 key and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Option<String>,
    pub value: String,
}

impl Record {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            key: None,
            value: value.into(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Encode a click log as a record keyed by its user id.
    pub fn from_click_log(click_log: &ClickLog) -> Result<Self> {
        Ok(Self::new(click_log.to_json()?).with_key(click_log.key()))
    }
}

/// Acknowledgement of a sent record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// Record read back from a topic, with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<String>,
    pub value: Option<String>,
}

impl ReceivedRecord {
    /// Build from raw bytes; invalid UTF-8 is replaced lossily.
    pub fn from_bytes(
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        key: Option<&[u8]>,
        value: Option<&[u8]>,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            key: key.map(|k| String::from_utf8_lossy(k).into_owned()),
            value: value.map(|v| String::from_utf8_lossy(v).into_owned()),
        }
    }
}
