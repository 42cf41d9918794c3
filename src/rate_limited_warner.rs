use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default minimum gap between two warnings about failed records.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

/// Helper that rate limits warnings about records that failed to publish.
///
/// Callers count failures with [`record_failure`](Self::record_failure). The
/// next call to [`warn_if_due`](Self::warn_if_due) reports the accumulated
/// count through the callback once the interval has elapsed since the last
/// report. [`flush`](Self::flush) reports immediately.
#[derive(Debug)]
pub struct RateLimitedWarner {
    origin: Instant,
    interval_ms: u64,
    /// Milliseconds since `origin` of the last report, offset by one so zero
    /// means "never reported".
    last_warn: AtomicU64,
    failed: AtomicU64,
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}

impl RateLimitedWarner {
    /// Create a warner whose first report can be emitted immediately.
    pub fn new(interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            last_warn: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis())
            .unwrap_or(u64::MAX)
            .saturating_add(1)
    }

    /// Increment the failure counter.
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of failures not yet reported.
    pub fn pending(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Report accumulated failures if the interval has elapsed.
    pub fn warn_if_due(&self, mut warn: impl FnMut(u64)) {
        let now = self.elapsed_ms();
        let prev = self.last_warn.load(Ordering::Relaxed);
        if prev != 0 && now.saturating_sub(prev) < self.interval_ms {
            return;
        }
        let count = self.failed.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            self.last_warn.store(now, Ordering::Relaxed);
        }
    }

    /// Report accumulated failures immediately.
    pub fn flush(&self, mut warn: impl FnMut(u64)) {
        let count = self.failed.swap(0, Ordering::Relaxed);
        if count > 0 {
            warn(count);
            self.last_warn.store(self.elapsed_ms(), Ordering::Relaxed);
        }
    }
}
