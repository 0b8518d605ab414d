//! Continuous audio event detection.
//!
//! Microphone audio flows through a three-stage pipeline of pinned worker
//! threads (`feed`, `detect`, `action`) into a rolling feature window that
//! is classified once per cadence period.  Debounced transitions of the
//! primary label are handed to an [`notify::EventSink`].

pub mod audio;
pub mod classify;
pub mod config;
pub mod notify;
pub mod pipeline;
