//! `feed` worker: capture device → front end.

use std::sync::Arc;
use std::thread;

use crate::audio::{CaptureDevice, FrontEnd, FrontEndError};
use crate::pipeline::{Backoff, PipelineError, PipelineStats};

/// Reads raw interleaved frames from a capture device and feeds them to the
/// front end, forever.
///
/// A failed read is logged, counted, and followed by a bounded backoff
/// sleep.  A full front-end queue drops the newest audio rather than
/// blocking.
pub struct CaptureEnhanceStage<D: CaptureDevice> {
    device: D,
    front_end: Arc<dyn FrontEnd>,
    frame: Vec<i16>,
    backoff: Backoff,
    stats: Arc<PipelineStats>,
}

impl<D: CaptureDevice> CaptureEnhanceStage<D> {
    /// The frame buffer holds `feed_chunk_size × channels` samples and is
    /// allocated once here.
    pub fn new(
        device: D,
        front_end: Arc<dyn FrontEnd>,
        backoff: Backoff,
        stats: Arc<PipelineStats>,
    ) -> Result<Self, PipelineError> {
        let channels = front_end.feed_channels();
        if device.channels() != channels {
            return Err(PipelineError::ChannelMismatch {
                device: device.channels(),
                front_end: channels,
            });
        }

        let frame = vec![0i16; front_end.feed_chunk_size() * channels];
        Ok(Self {
            device,
            front_end,
            frame,
            backoff,
            stats,
        })
    }

    /// One read-and-feed iteration.
    pub fn step(&mut self) {
        if let Err(e) = self.device.read(&mut self.frame) {
            self.stats.record_capture_error();
            let delay = self.backoff.next();
            log::warn!("feed: capture read failed: {e}; retrying in {delay:?}");
            thread::sleep(delay);
            return;
        }
        self.backoff.reset();

        match self.front_end.feed(&self.frame) {
            Ok(()) => self.stats.record_fed(),
            Err(FrontEndError::QueueFull { dropped }) => {
                self.stats.record_fed();
                self.stats.record_dropped(dropped as u64);
                log::debug!("feed: front-end queue full, dropped {dropped} chunk(s)");
            }
            Err(e) => {
                self.stats.record_feed_error();
                log::warn!("feed: front end rejected frame: {e}");
            }
        }
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
