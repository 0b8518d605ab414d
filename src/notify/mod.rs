//! Delivery of debounced detection transitions.
//!
//! This module provides:
//! * [`EventSink`]: synchronous observer called by the `action` worker.
//! * [`LogSink`] / [`ChannelSink`]: built-in sinks.
//! * [`Publisher`]: async trait for outbound delivery, with
//!   [`HttpPublisher`] and [`LogPublisher`].
//! * [`run_notifier`]: async loop bridging a [`ChannelSink`] to a publisher.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cry_monitor::notify::{run_notifier, ChannelSink, EventSink, LogPublisher};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (mut sink, rx) = ChannelSink::channel(8);
//!     let notifier = tokio::spawn(run_notifier(rx, Arc::new(LogPublisher), "nursery".into()));
//!
//!     sink.notify(true);
//!     drop(sink);
//!     notifier.await.unwrap();
//! }
//! ```

pub mod publisher;
pub mod sink;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use publisher::{payload, run_notifier, HttpPublisher, LogPublisher, PublishError, Publisher};
pub use sink::{ChannelSink, EventSink, LogSink};
