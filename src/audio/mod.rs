//! Audio side of the pipeline: capture → front end → ring buffer → window.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → CaptureReader
//!           → i16 frame → FrontEnd::feed ⋯ FrontEnd::fetch → f32 frame
//!           → RingBuffer → FeatureWindow
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cry_monitor::audio::{AudioCapture, CaptureDevice, FrontEnd, QueueFrontEnd};
//! use cry_monitor::config::AppConfig;
//!
//! let config = AppConfig::default();
//! let front_end = QueueFrontEnd::from_config(&config.front_end, config.audio.sample_rate);
//! let capture = AudioCapture::new(None).unwrap();
//! let (_handle, mut reader) = capture.start(&config.audio, &config.front_end).unwrap();
//!
//! let mut frame = vec![0i16; front_end.feed_chunk_size() * reader.channels()];
//! reader.read(&mut frame).unwrap();
//! front_end.feed(&frame).unwrap();
//! let enhanced = front_end.fetch().unwrap();
//! println!("{} enhanced samples", enhanced.len());
//! ```

pub mod buffer;
pub mod capture;
pub mod dsp;
pub mod front_end;
pub mod resample;
pub mod window;

pub use buffer::RingBuffer;
pub use capture::{AudioCapture, AudioChunk, CaptureDevice, CaptureError, CaptureReader, StreamHandle};
pub use dsp::{rms, NoiseSuppressor};
pub use front_end::{FrontEnd, FrontEndError, QueueFrontEnd};
pub use resample::{downmix, f32_to_i16, i16_to_f32, StreamResampler};
pub use window::FeatureWindow;
