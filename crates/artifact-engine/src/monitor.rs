//! Live run statistics and progress sinks

use artifact_types::{ProgressEvent, ProgressReporter, TicketState};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Point-in-time view of a run's counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Transfers currently in flight
    pub in_flight: usize,
    /// Highest number of simultaneous transfers observed
    pub peak_in_flight: usize,
    /// Transfer attempts started, first attempts included
    pub attempts: u64,
    /// Retries started
    pub retries: u64,
    /// Bytes read from the source by successful attempts
    pub bytes_read: u64,
    /// Bytes written to the destination by successful attempts
    pub bytes_written: u64,
    /// Time since the collector was created
    pub elapsed: Duration,
}

impl Statistics {
    /// Average write throughput over the run, in bytes per second
    pub fn bytes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes_written as f64 / secs
        } else {
            0.0
        }
    }
}

/// Lock-free counters shared by every worker of a run
#[derive(Debug)]
pub struct StatisticsCollector {
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    attempts: AtomicU64,
    retries: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    start_time: Instant,
}

impl StatisticsCollector {
    /// Create a collector with zeroed counters
    pub fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            attempts: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Count a transfer as in flight until the returned guard drops
    pub fn start_transfer(&self) -> InFlightGuard<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlightGuard { collector: self }
    }

    /// Record a transfer attempt
    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a retry
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the byte counts of a successful transfer
    pub fn record_bytes(&self, read: u64, written: u64) {
        self.bytes_read.fetch_add(read, Ordering::Relaxed);
        self.bytes_written.fetch_add(written, Ordering::Relaxed);
    }

    /// Current counter values
    pub fn snapshot(&self) -> Statistics {
        Statistics {
            in_flight: self.in_flight.load(Ordering::SeqCst),
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            elapsed: self.start_time.elapsed(),
        }
    }
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight count on drop, including on unwind
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    collector: &'a StatisticsCollector,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.collector.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Progress sink that writes every event to `tracing`
///
/// Used when a run is verbose and no reporter was injected.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report_progress(&self, event: &ProgressEvent) {
        match event.state {
            TicketState::Failed => warn!(
                path = %event.path,
                state = %event.state,
                attempt = event.attempt,
                "Item failed"
            ),
            _ => info!(
                path = %event.path,
                state = %event.state,
                attempt = event.attempt,
                "Item progress"
            ),
        }
    }
}
