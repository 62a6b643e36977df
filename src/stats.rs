use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Request counters reported by the health endpoint.
#[derive(Default)]
pub struct ServerStats {
    requests_processed: AtomicU64,
    requests_failed: AtomicU64,
    total_execution_time: AtomicU64, // in microseconds
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, elapsed: Duration, failed: bool) {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_execution_time.fetch_add(micros, Ordering::Relaxed);
    }

    /// (requests, failed requests, average handler time in ms)
    pub fn get_stats(&self) -> (u64, u64, f64) {
        let count = self.requests_processed.load(Ordering::Relaxed);
        let failed = self.requests_failed.load(Ordering::Relaxed);
        let total_time = self.total_execution_time.load(Ordering::Relaxed);
        let avg_time_ms = if count > 0 {
            total_time as f64 / count as f64 / 1000.0
        } else {
            0.0
        };
        (count, failed, avg_time_ms)
    }
}
