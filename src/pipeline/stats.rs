//! Pipeline counters and the periodic stats monitor.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Counters shared by the workers.  All updates are relaxed increments.
#[derive(Debug, Default)]
pub struct PipelineStats {
    frames_fed: AtomicU64,
    capture_errors: AtomicU64,
    feed_errors: AtomicU64,
    frames_dropped: AtomicU64,
    frames_accumulated: AtomicU64,
    fetch_failures: AtomicU64,
    classifications: AtomicU64,
    inference_failures: AtomicU64,
    events_emitted: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_fed: u64,
    pub capture_errors: u64,
    pub feed_errors: u64,
    pub frames_dropped: u64,
    pub frames_accumulated: u64,
    pub fetch_failures: u64,
    pub classifications: u64,
    pub inference_failures: u64,
    pub events_emitted: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fed(&self) {
        self.frames_fed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture_error(&self) {
        self.capture_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_feed_error(&self) {
        self.feed_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Chunks the front-end queue discarded because it was full.
    pub fn record_dropped(&self, chunks: u64) {
        self.frames_dropped.fetch_add(chunks, Ordering::Relaxed);
    }

    pub fn record_accumulated(&self) {
        self.frames_accumulated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classification(&self) {
        self.classifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference_failure(&self) {
        self.inference_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_fed: self.frames_fed.load(Ordering::Relaxed),
            capture_errors: self.capture_errors.load(Ordering::Relaxed),
            feed_errors: self.feed_errors.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_accumulated: self.frames_accumulated.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            classifications: self.classifications.load(Ordering::Relaxed),
            inference_failures: self.inference_failures.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
        }
    }

    /// Log the counters once at `info`, together with the fixed footprint
    /// of the sample buffers.
    pub fn log_snapshot(&self, buffer_bytes: usize) {
        let s = self.snapshot();
        log::info!(
            "stats: buffers={} KiB fed={} capture_err={} feed_err={} dropped={} \
             accumulated={} fetch_fail={} classified={} infer_fail={} events={}",
            buffer_bytes / 1024,
            s.frames_fed,
            s.capture_errors,
            s.feed_errors,
            s.frames_dropped,
            s.frames_accumulated,
            s.fetch_failures,
            s.classifications,
            s.inference_failures,
            s.events_emitted,
        );
    }
}

/// Spawn the `monitor` thread, which calls [`PipelineStats::log_snapshot`]
/// every `interval` for the rest of the process.
pub fn spawn_monitor(
    stats: Arc<PipelineStats>,
    interval: Duration,
    buffer_bytes: usize,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("monitor".into())
        .spawn(move || loop {
            thread::sleep(interval);
            stats.log_snapshot(buffer_bytes);
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
