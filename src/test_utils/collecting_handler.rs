//! A simple sink that accumulates records in memory for test assertions.

use crate::handler::{Ack, LogSink};
use crate::level::Level;
use crate::log_record::LogEnvelope;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Sink that stores every record it receives for later inspection.
#[derive(Clone)]
pub struct CollectingSink {
    name: String,
    level: Level,
    records: Arc<Mutex<Vec<LogEnvelope>>>,
    failing: bool,
}

impl CollectingSink {
    /// Create a new empty sink accepting records up to `level`.
    pub fn new(name: &str, level: Level) -> Self {
        Self {
            name: name.to_owned(),
            level,
            records: Arc::new(Mutex::new(Vec::new())),
            failing: false,
        }
    }

    /// A sink that records everything but acknowledges with an error.
    pub fn failing(name: &str, level: Level) -> Self {
        Self {
            failing: true,
            ..Self::new(name, level)
        }
    }

    /// Return a snapshot of all records received so far.
    pub fn collected(&self) -> Vec<LogEnvelope> {
        self.records.lock().clone()
    }
}

impl LogSink for CollectingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Level {
        self.level
    }

    fn log(&self, level: Level, message: &str, meta: Option<Value>, ack: Ack) {
        self.records
            .lock()
            .push(LogEnvelope::new(&self.name, level, message, meta));
        if self.failing {
            ack(Err(crate::handler::SinkError::Publish("collector closed".into())));
        } else {
            ack(Ok(()));
        }
    }
}
