// Application state module
// Process-scoped runtime state shared by every request

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::types::Config;
use crate::telemetry::Tracer;

/// Request counter and process start time
#[derive(Debug)]
pub struct RequestMetrics {
    request_count: AtomicU64,
    started: Instant,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self {
            request_count: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Count one request, returning the new total
    pub fn record_request(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Application state
pub struct AppState {
    pub config: Config,
    pub metrics: RequestMetrics,
    pub tracer: Arc<dyn Tracer>,

    // Handler tasks currently running, reported by /api/metrics
    in_flight: AtomicUsize,
}

impl AppState {
    pub fn new(config: &Config, tracer: Arc<dyn Tracer>) -> Self {
        Self {
            config: config.clone(),
            metrics: RequestMetrics::new(),
            tracer,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// State with tracing disabled
    #[cfg(test)]
    pub fn untraced(config: &Config) -> Self {
        Self::new(config, Arc::new(crate::telemetry::NoopTracer))
    }

    /// Mark a request as in flight until the guard is dropped
    pub fn enter_request(&self) -> InFlightGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            counter: &self.in_flight,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Whether connections and requests are written to the access log
    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}

/// Decrements the in-flight gauge on drop
pub struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
