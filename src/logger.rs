//! Dispatching logger.
//!
//! [`Logger`] owns the registered sinks and performs level filtering before
//! invoking them, so sinks only ever see records they accept. Failures
//! reported through a sink's acknowledgement are counted and surfaced as
//! rate-limited warnings.

use std::sync::Arc;
use std::time::Duration;

use log::warn;
use parking_lot::RwLock;
use serde_json::Value;

use crate::handler::{Ack, LogSink};
use crate::level::Level;
use crate::rate_limited_warner::{DEFAULT_WARN_INTERVAL, RateLimitedWarner};

pub struct Logger {
    sinks: RwLock<Vec<Arc<dyn LogSink>>>,
    warner: Arc<RateLimitedWarner>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub fn new() -> Self {
        Self::with_warn_interval(DEFAULT_WARN_INTERVAL)
    }

    pub fn with_warn_interval(interval: Duration) -> Self {
        Self {
            sinks: RwLock::new(Vec::new()),
            warner: Arc::new(RateLimitedWarner::new(interval)),
        }
    }

    pub fn add_sink(&self, sink: Arc<dyn LogSink>) {
        self.sinks.write().push(sink);
    }

    /// Return `true` if at least one sink accepts `level`.
    pub fn is_enabled_for(&self, level: Level) -> bool {
        self.sinks.read().iter().any(|sink| level.passes(sink.level()))
    }

    /// Route a record to every sink whose level admits it.
    ///
    /// Returns the number of sinks the record was handed to.
    pub fn log(&self, level: Level, message: &str, meta: Option<Value>) -> usize {
        let sinks: Vec<_> = self
            .sinks
            .read()
            .iter()
            .filter(|sink| level.passes(sink.level()))
            .cloned()
            .collect();
        for sink in &sinks {
            sink.log(level, message, meta.clone(), self.failure_ack(sink.name()));
        }
        sinks.len()
    }

    /// Number of sink failures not yet reported.
    pub fn unreported_failures(&self) -> u64 {
        self.warner.pending()
    }

    /// Report any sink failures immediately.
    pub fn flush_warnings(&self) {
        self.warner.flush(|count| {
            warn!("Logger: {count} records failed in the last interval");
        });
    }

    fn failure_ack(&self, sink_name: &str) -> Ack {
        let warner = Arc::clone(&self.warner);
        let sink_name = sink_name.to_owned();
        Box::new(move |result| {
            if let Err(err) = result {
                warner.record_failure();
                warner.warn_if_due(|count| {
                    warn!("Logger: sink '{sink_name}' failed {count} records; latest: {err}");
                });
            }
        })
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .sinks
            .read()
            .iter()
            .map(|sink| sink.name().to_owned())
            .collect();
        f.debug_struct("Logger").field("sinks", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::CollectingSink;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn sinks() -> (CollectingSink, CollectingSink) {
        (
            CollectingSink::new("errors", Level::Error),
            CollectingSink::new("everything", Level::Silly),
        )
    }

    fn logger_with(sinks: &(CollectingSink, CollectingSink)) -> Logger {
        let logger = Logger::new();
        logger.add_sink(Arc::new(sinks.0.clone()));
        logger.add_sink(Arc::new(sinks.1.clone()));
        logger
    }

    #[rstest]
    fn filters_by_sink_level(sinks: (CollectingSink, CollectingSink)) {
        let logger = logger_with(&sinks);
        assert_eq!(logger.log(Level::Info, "routine", None), 1);
        assert_eq!(logger.log(Level::Error, "broken", Some(json!({"code": 7}))), 2);

        let errors = sinks.0.collected();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "broken");
        assert_eq!(errors[0].meta, Some(json!({"code": 7})));
        assert_eq!(sinks.1.collected().len(), 2);
    }

    #[rstest]
    fn enabled_when_any_sink_accepts(sinks: (CollectingSink, CollectingSink)) {
        let logger = Logger::new();
        assert!(!logger.is_enabled_for(Level::Error));
        logger.add_sink(Arc::new(sinks.0.clone()));
        assert!(logger.is_enabled_for(Level::Error));
        assert!(!logger.is_enabled_for(Level::Warn));
    }

    #[rstest]
    fn counts_failed_acknowledgements() {
        let logger = Logger::with_warn_interval(Duration::from_secs(60));
        logger.add_sink(Arc::new(CollectingSink::failing("flaky", Level::Info)));
        logger.log(Level::Info, "one", None);
        logger.log(Level::Info, "two", None);
        assert_eq!(logger.unreported_failures(), 1);
        logger.flush_warnings();
        assert_eq!(logger.unreported_failures(), 0);
    }
}
