//! Core data models used throughout the snippet manager.
//!
//! [`Snippet`] is the persisted unit shared by every storage backend and
//! by the JSON import/export format. Field names serialize in PascalCase
//! (`Key`, `Value`, `Score`, ...) so files exported by earlier releases of
//! the plugin load unchanged.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A key–value text template with usage statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Snippet {
    /// Unique identifier; every store operation keys off it.
    pub key: String,
    /// Template text, possibly containing `{name}` placeholders.
    pub value: String,
    /// Manually assigned weight.
    #[serde(default)]
    pub score: i64,
    /// Timestamp of the last persisted mutation.
    #[serde(default, with = "timestamp::option")]
    pub update_time: Option<DateTime<Utc>>,
    /// Number of times the snippet has been used.
    #[serde(default)]
    pub usage_count: i64,
    /// When the snippet was last used.
    #[serde(default, with = "timestamp::option")]
    pub last_used_time: Option<DateTime<Utc>>,
    /// Manual pin.
    #[serde(default)]
    pub is_favorite: bool,
}

impl Snippet {
    /// A fresh snippet with default score and usage state.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            score: 0,
            update_time: None,
            usage_count: 0,
            last_used_time: None,
            is_favorite: false,
        }
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }
}

impl std::fmt::Display for Snippet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key: {}, Value: {}, Score: {}", self.key, self.value, self.score)
    }
}

/// Format used for DATETIME columns; matches what SQLite's
/// `CURRENT_TIMESTAMP` writes, plus milliseconds.
const DB_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Truncate `ts` to the millisecond precision DATETIME columns keep, so a
/// timestamp reads back identically from either backend.
pub fn stored_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

/// Current time at stored precision.
pub fn now_stamp() -> DateTime<Utc> {
    stored_precision(Utc::now())
}

/// Render a timestamp for a DATETIME column.
pub fn format_db_time(ts: &DateTime<Utc>) -> String {
    ts.format(DB_TIME_FORMAT).to_string()
}

/// Parse a timestamp read back from storage or an imported file.
///
/// Accepts RFC 3339 and zone-less `YYYY-MM-DD[ T]HH:MM:SS[.fff]`
/// (interpreted as UTC). Returns `None` for anything else.
pub fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub(crate) mod timestamp {
    pub mod option {
        use chrono::{DateTime, SecondsFormat, Utc};
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(ts) => {
                    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                }
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw {
                None => Ok(None),
                Some(s) if s.trim().is_empty() => Ok(None),
                Some(s) => super::super::parse_time(&s)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", s))),
            }
        }
    }
}
