//! Envelope built from a single log call.
//!
//! A [`LogEnvelope`] captures the origin host, the arrival time, the sink
//! name, the level, the message, and optional structured metadata. It is
//! built once when a record reaches a sink and is never mutated afterwards,
//! so the timestamp reflects when the record arrived rather than when it was
//! eventually published.

use std::fmt;

use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::level::Level;

static HOSTNAME: Lazy<String> = Lazy::new(|| {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_owned())
});

/// Hostname of the current process, resolved on first use.
pub fn hostname() -> &'static str {
    HOSTNAME.as_str()
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEnvelope {
    /// Hostname of the emitting process.
    pub host: String,
    /// Arrival time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Name of the sink that accepted the record.
    pub name: String,
    pub level: Level,
    pub message: String,
    /// Arbitrary structured metadata; serialised as `null` when absent.
    #[serde(default)]
    pub meta: Option<Value>,
}

impl LogEnvelope {
    /// Build an envelope stamped with the process hostname and the current time.
    pub fn new(name: &str, level: Level, message: &str, meta: Option<Value>) -> Self {
        Self::at(hostname(), now_millis(), name, level, message, meta)
    }

    /// Build an envelope with an explicit host and timestamp.
    ///
    /// A JSON `null` metadata value is stored as `None`.
    pub fn at(
        host: &str,
        timestamp: i64,
        name: &str,
        level: Level,
        message: &str,
        meta: Option<Value>,
    ) -> Self {
        Self {
            host: host.to_owned(),
            timestamp,
            name: name.to_owned(),
            level,
            message: message.to_owned(),
            meta: meta.filter(|value| !value.is_null()),
        }
    }
}

impl fmt::Display for LogEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.name, self.level, self.message)
    }
}
