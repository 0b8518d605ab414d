//! Enhancement front end: the stage between raw capture and the ring buffer.
//!
//! [`FrontEnd`] is the seam the pipeline talks to: the feed worker pushes
//! raw interleaved frames in with [`FrontEnd::feed`], the detect worker pulls
//! enhanced mono frames out with [`FrontEnd::fetch`].  The two sides run on
//! different threads, so implementations are `Send + Sync` and take `&self`.
//!
//! [`QueueFrontEnd`] is the built-in implementation:
//!
//! ```text
//! feed(i16 × channels) → average mic channels → noise suppression
//!     → gain → re-chunk to fetch size → bounded queue → fetch()
//! ```
//!
//! The queue never blocks the feeding side: when it is full the newest chunk
//! is dropped and reported as [`FrontEndError::QueueFull`].

use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;

use crate::audio::dsp::{apply_gain, db_to_linear, NoiseSuppressor};
use crate::audio::i16_to_f32;
use crate::config::FrontEndConfig;

// ---------------------------------------------------------------------------
// FrontEndError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrontEndError {
    #[error("fed frame has {len} samples, expected {expected}")]
    FrameShape { len: usize, expected: usize },

    #[error("front-end queue full, dropped {dropped} chunk(s)")]
    QueueFull { dropped: usize },

    #[error("no enhanced frame within {0:?}")]
    Timeout(Duration),

    #[error("front-end queue closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// FrontEnd trait
// ---------------------------------------------------------------------------

/// Blocking feed/fetch interface of an audio enhancement front end.
pub trait FrontEnd: Send + Sync {
    /// Samples per channel the front end expects in every fed frame.
    fn feed_chunk_size(&self) -> usize;

    /// Samples in every fetched frame.
    fn fetch_chunk_size(&self) -> usize;

    /// Interleaved channels per fed frame.
    fn feed_channels(&self) -> usize;

    /// Ingest one raw frame of `feed_chunk_size() × feed_channels()` samples.
    fn feed(&self, frame: &[i16]) -> Result<(), FrontEndError>;

    /// Block until one enhanced frame is ready.  An empty vector counts as
    /// "nothing this time".
    fn fetch(&self) -> Result<Vec<f32>, FrontEndError>;
}

// Compile-time assertion: Arc<dyn FrontEnd> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn FrontEnd>) {}
};

// ---------------------------------------------------------------------------
// QueueFrontEnd
// ---------------------------------------------------------------------------

/// Built-in front end: channel selection, noise suppression, gain, and a
/// bounded hand-off queue.
pub struct QueueFrontEnd {
    mic_channels: usize,
    total_channels: usize,
    feed_chunk_size: usize,
    fetch_chunk_size: usize,
    suppressor: Option<NoiseSuppressor>,
    gain: f32,
    fetch_timeout: Duration,
    /// Enhanced samples waiting to fill a whole fetch chunk.
    pending: Mutex<Vec<f32>>,
    tx: mpsc::SyncSender<Vec<f32>>,
    rx: Mutex<mpsc::Receiver<Vec<f32>>>,
}

impl QueueFrontEnd {
    /// Build the front end from its static configuration.  Noise
    /// suppression works on 10 ms blocks at `sample_rate`.
    ///
    /// Features the built-in front end does not implement (echo
    /// cancellation, VAD, wake-word detection) are logged and ignored.
    pub fn from_config(config: &FrontEndConfig, sample_rate: u32) -> Self {
        if config.echo_cancellation {
            log::warn!("front end: echo cancellation is not supported, reference channels ignored");
        }
        if config.voice_activity_detection {
            log::warn!("front end: voice activity detection is not supported, ignoring");
        }
        if config.wake_word_detection {
            log::warn!("front end: wake-word detection is not supported, ignoring");
        }

        let suppressor = config
            .noise_suppression
            .then(|| NoiseSuppressor::for_sample_rate(config.ns_mode, config.noise_floor, sample_rate));

        let mut gain = config.linear_gain;
        if config.voice_communication && config.voice_communication_agc {
            gain *= db_to_linear(f32::from(config.agc_gain_db));
        }

        let (tx, rx) = mpsc::sync_channel(config.queue_frames.max(1));

        log::info!(
            "front end: {} mic + {} ref channels, feed {} / fetch {} samples, ns={}, gain={gain:.2}",
            config.mic_channels,
            config.ref_channels,
            config.feed_chunk_size,
            config.fetch_chunk_size,
            config.noise_suppression,
        );

        Self {
            mic_channels: config.mic_channels as usize,
            total_channels: config.total_channels(),
            feed_chunk_size: config.feed_chunk_size,
            fetch_chunk_size: config.fetch_chunk_size,
            suppressor,
            gain,
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            pending: Mutex::new(Vec::with_capacity(
                config.feed_chunk_size + config.fetch_chunk_size,
            )),
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Average the microphone channels of each interleaved instant.
    fn mic_mono(&self, frame: &[i16]) -> Vec<f32> {
        frame
            .chunks_exact(self.total_channels)
            .map(|instant| {
                instant[..self.mic_channels]
                    .iter()
                    .map(|&s| i16_to_f32(s))
                    .sum::<f32>()
                    / self.mic_channels as f32
            })
            .collect()
    }
}

impl FrontEnd for QueueFrontEnd {
    fn feed_chunk_size(&self) -> usize {
        self.feed_chunk_size
    }

    fn fetch_chunk_size(&self) -> usize {
        self.fetch_chunk_size
    }

    fn feed_channels(&self) -> usize {
        self.total_channels
    }

    fn feed(&self, frame: &[i16]) -> Result<(), FrontEndError> {
        let expected = self.feed_chunk_size * self.total_channels;
        if frame.len() != expected {
            return Err(FrontEndError::FrameShape {
                len: frame.len(),
                expected,
            });
        }

        let mut mono = self.mic_mono(frame);
        if let Some(ns) = &self.suppressor {
            ns.process(&mut mono);
        }
        apply_gain(&mut mono, self.gain);

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.extend_from_slice(&mono);

        let mut dropped = 0;
        while pending.len() >= self.fetch_chunk_size {
            let chunk: Vec<f32> = pending.drain(..self.fetch_chunk_size).collect();
            match self.tx.try_send(chunk) {
                Ok(()) => {}
                Err(mpsc::TrySendError::Full(_)) => dropped += 1,
                Err(mpsc::TrySendError::Disconnected(_)) => return Err(FrontEndError::Closed),
            }
        }

        if dropped > 0 {
            return Err(FrontEndError::QueueFull { dropped });
        }
        Ok(())
    }

    fn fetch(&self) -> Result<Vec<f32>, FrontEndError> {
        let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
        rx.recv_timeout(self.fetch_timeout).map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => FrontEndError::Timeout(self.fetch_timeout),
            mpsc::RecvTimeoutError::Disconnected => FrontEndError::Closed,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
