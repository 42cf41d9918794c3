//! Compatibility bridge for the Rust `log` crate.
//!
//! [`LogBridge`] implements `log::Log` and forwards records into a
//! [`Logger`], carrying the record's target and source location as metadata.
//! Records emitted by this crate are skipped so a failing sink cannot feed
//! its own warnings back into itself.

use std::sync::{Arc, OnceLock};

use log::{Metadata, Record};
use serde_json::json;

use crate::level::Level;
use crate::logger::Logger;

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Adapter implementing the Rust `log::Log` trait.
pub struct LogBridge {
    logger: Arc<Logger>,
}

impl LogBridge {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        !is_own_target(metadata.target()) && self.logger.is_enabled_for(metadata.level().into())
    }

    fn log(&self, record: &Record<'_>) {
        if !log::Log::enabled(self, record.metadata()) {
            return;
        }
        let meta = json!({
            "target": record.target(),
            "module_path": record.module_path(),
            "file": record.file(),
            "line": record.line(),
        });
        self.logger.log(
            Level::from(record.level()),
            &record.args().to_string(),
            Some(meta),
        );
    }

    fn flush(&self) {
        self.logger.flush_warnings();
    }
}

static INSTALL_RESULT: OnceLock<bool> = OnceLock::new();

/// Install a bridge to `logger` as the global Rust logger.
///
/// Returns `true` on success. When a different global logger is already set,
/// installation fails and `false` is returned. Subsequent calls return the
/// cached outcome.
pub fn install_global_logger(logger: Arc<Logger>) -> bool {
    *INSTALL_RESULT.get_or_init(|| {
        if log::set_boxed_logger(Box::new(LogBridge::new(logger))).is_err() {
            return false;
        }
        log::set_max_level(log::LevelFilter::Trace);
        true
    })
}
