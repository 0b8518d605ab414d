//! `detect` worker: front end → ring buffer → feature window.

use std::sync::{Arc, PoisonError};
use std::thread;

use crate::audio::{FrontEnd, FrontEndError, RingBuffer};
use crate::pipeline::{Backoff, PipelineStats, SharedWindow};

/// Fetches enhanced frames, appends them to the ring buffer it owns, and
/// rebuilds the shared feature window after every frame.
///
/// The ring is touched without any lock since this worker is its only user;
/// the window lock is held only for the O(C) rebuild.
pub struct AccumulateStage {
    front_end: Arc<dyn FrontEnd>,
    ring: RingBuffer<f32>,
    window: SharedWindow,
    backoff: Backoff,
    stats: Arc<PipelineStats>,
}

impl AccumulateStage {
    /// The ring is sized to match the window.
    pub fn new(
        front_end: Arc<dyn FrontEnd>,
        window: SharedWindow,
        backoff: Backoff,
        stats: Arc<PipelineStats>,
    ) -> Self {
        let capacity = window.lock().unwrap_or_else(PoisonError::into_inner).len();
        Self {
            front_end,
            ring: RingBuffer::new(capacity),
            window,
            backoff,
            stats,
        }
    }

    /// Bytes held by the ring plus the window it rebuilds.
    pub fn footprint_bytes(&self) -> usize {
        let window = self
            .window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .footprint_bytes();
        self.ring.footprint_bytes() + window
    }

    /// One fetch-append-rebuild iteration.
    pub fn step(&mut self) {
        let frame = match self.front_end.fetch() {
            Ok(frame) if !frame.is_empty() => frame,
            Ok(_) => {
                self.retry_later("empty frame");
                return;
            }
            Err(e @ FrontEndError::Timeout(_)) => {
                self.retry_later(&e.to_string());
                return;
            }
            Err(e) => {
                log::warn!("detect: fetch failed: {e}");
                self.retry_later(&e.to_string());
                return;
            }
        };
        self.backoff.reset();

        self.ring.push_slice(&frame);
        self.window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rebuild_from(&self.ring);
        self.stats.record_accumulated();
    }

    fn retry_later(&mut self, reason: &str) {
        self.stats.record_fetch_failure();
        let delay = self.backoff.next();
        log::debug!("detect: no frame ({reason}); retrying in {delay:?}");
        thread::sleep(delay);
    }

    pub fn run(mut self) {
        loop {
            self.step();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
