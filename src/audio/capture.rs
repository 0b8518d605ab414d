//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/stream lifecycle.  Call
//! [`AudioCapture::start`] to begin streaming [`AudioChunk`]s; it returns a
//! [`StreamHandle`] RAII guard (dropping it stops the cpal stream) and a
//! [`CaptureReader`], the `Send` half that the feed worker owns.
//!
//! [`CaptureReader`] implements [`CaptureDevice`]: every `read` blocks until
//! one interleaved 16-bit frame is available.  Device audio is downmixed to
//! mono, resampled to the pipeline rate, and copied onto every microphone
//! channel; reference channels carry silence because the host has no
//! playback loopback.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use crate::audio::{downmix, f32_to_i16, StreamResampler};
use crate::config::{AudioConfig, FrontEndConfig};

/// Device chunks buffered between the cpal callback and the reader.
const CHUNK_QUEUE_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// A single buffer of raw audio as delivered by the cpal callback.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Interleaved PCM samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Sample rate of this chunk in Hz (e.g. 44100, 48000, 16000).
    pub sample_rate: u32,
    /// Number of interleaved channels (1 = mono, 2 = stereo, …).
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or reading the audio capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("input device {0:?} not found")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("no audio from the device within {0:?}")]
    Timeout(Duration),

    #[error("audio stream disconnected")]
    Disconnected,

    #[error("frame of {len} samples does not fit {channels} channels")]
    FrameShape { len: usize, channels: usize },
}

// ---------------------------------------------------------------------------
// CaptureDevice
// ---------------------------------------------------------------------------

/// Blocking source of interleaved 16-bit frames.
///
/// The caller sizes the frame (`chunk × channels()` samples); `read` fills
/// all of it or returns an error and leaves it unspecified.
pub trait CaptureDevice: Send {
    /// Interleaved channels per sample instant.
    fn channels(&self) -> usize;

    /// Block until `frame` has been filled.
    fn read(&mut self, frame: &mut [i16]) -> Result<(), CaptureError>;
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// `cpal::Stream` is not `Send` on every platform, so this stays on the
/// thread that created it.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Microphone capture device wrapper built on top of `cpal`.
///
/// # Example
///
/// ```rust,no_run
/// use cry_monitor::audio::{AudioCapture, CaptureDevice};
/// use cry_monitor::config::AppConfig;
///
/// let config = AppConfig::default();
/// let capture = AudioCapture::new(None).unwrap();
/// let (_handle, mut reader) = capture.start(&config.audio, &config.front_end).unwrap();
/// let mut frame = vec![0i16; 512 * reader.channels()];
/// reader.read(&mut frame).unwrap();
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    /// Native sample rate reported by the device (Hz).
    sample_rate: u32,
    /// Number of interleaved channels reported by the device.
    channels: u16,
}

impl AudioCapture {
    /// Open the input device called `name`, or the system default when
    /// `name` is `None`.
    ///
    /// # Errors
    ///
    /// [`CaptureError::NoDevice`] / [`CaptureError::DeviceNotFound`] when no
    /// matching input exists, [`CaptureError::DefaultConfig`] when the device
    /// cannot report a default stream configuration.
    pub fn new(name: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = match name {
            None => host.default_input_device().ok_or(CaptureError::NoDevice)?,
            Some(wanted) => host
                .input_devices()?
                .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceNotFound(wanted.to_string()))?,
        };

        let supported = device.default_input_config()?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start the stream and return its guard plus a reader producing frames
    /// in the layout `front_end` expects.
    ///
    /// The cpal callback never blocks: when the reader falls
    /// `CHUNK_QUEUE_DEPTH` chunks behind, new chunks are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// if the platform rejects the stream configuration.
    pub fn start(
        &self,
        audio: &AudioConfig,
        front_end: &FrontEndConfig,
    ) -> Result<(StreamHandle, CaptureReader), CaptureError> {
        let (tx, rx) = mpsc::sync_channel::<AudioChunk>(CHUNK_QUEUE_DEPTH);
        let sample_rate = self.sample_rate;
        let channels = self.channels;

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let chunk = AudioChunk {
                    samples: data.to_vec(),
                    sample_rate,
                    channels,
                };
                if let Err(mpsc::TrySendError::Full(_)) = tx.try_send(chunk) {
                    log::debug!("capture: reader behind, dropping device chunk");
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;

        let reader = CaptureReader::new(
            rx,
            audio.sample_rate,
            front_end.mic_channels,
            front_end.ref_channels,
            Duration::from_millis(audio.read_timeout_ms),
        );
        Ok((StreamHandle { _stream: stream }, reader))
    }

    /// Native sample rate of the capture stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels delivered by the device.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// CaptureReader
// ---------------------------------------------------------------------------

/// Receiving half of a capture stream; turns device chunks into pipeline
/// frames.
pub struct CaptureReader {
    rx: mpsc::Receiver<AudioChunk>,
    /// Mono samples at `target_rate` not yet handed out.
    pending: VecDeque<f32>,
    /// Carries the resampling phase from one device chunk to the next.
    resampler: StreamResampler,
    target_rate: u32,
    mic_channels: u16,
    ref_channels: u16,
    timeout: Duration,
}

impl CaptureReader {
    pub fn new(
        rx: mpsc::Receiver<AudioChunk>,
        target_rate: u32,
        mic_channels: u16,
        ref_channels: u16,
        timeout: Duration,
    ) -> Self {
        Self {
            rx,
            pending: VecDeque::new(),
            resampler: StreamResampler::new(target_rate, target_rate),
            target_rate,
            mic_channels,
            ref_channels,
            timeout,
        }
    }

    fn fill_pending(&mut self, needed: usize) -> Result<(), CaptureError> {
        while self.pending.len() < needed {
            let chunk = self.rx.recv_timeout(self.timeout).map_err(|e| match e {
                mpsc::RecvTimeoutError::Timeout => CaptureError::Timeout(self.timeout),
                mpsc::RecvTimeoutError::Disconnected => CaptureError::Disconnected,
            })?;
            if self.resampler.source_rate() != chunk.sample_rate {
                self.resampler = StreamResampler::new(chunk.sample_rate, self.target_rate);
            }
            let mono = downmix(&chunk.samples, chunk.channels);
            self.pending.extend(self.resampler.process(&mono));
        }
        Ok(())
    }
}

impl CaptureDevice for CaptureReader {
    fn channels(&self) -> usize {
        self.mic_channels as usize + self.ref_channels as usize
    }

    fn read(&mut self, frame: &mut [i16]) -> Result<(), CaptureError> {
        let channels = self.channels();
        if channels == 0 || frame.len() % channels != 0 {
            return Err(CaptureError::FrameShape {
                len: frame.len(),
                channels,
            });
        }

        let needed = frame.len() / channels;
        self.fill_pending(needed)?;

        let mics = self.mic_channels as usize;
        for (slot, sample) in frame
            .chunks_exact_mut(channels)
            .zip(self.pending.drain(..needed))
        {
            let (mic, reference) = slot.split_at_mut(mics);
            mic.fill(f32_to_i16(sample));
            reference.fill(0);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
