//! Three-stage detection pipeline.
//!
//! ```text
//! CaptureDevice ─▶ [feed] ─▶ FrontEnd queue ─▶ [detect] ─▶ RingBuffer
//!                                                   │
//!                                      rebuild under lock
//!                                                   ▼
//!                EventSink ◀─ debounce ◀─ [action] ◀─ FeatureWindow
//! ```
//!
//! Each bracketed stage is a perpetual OS thread of the same name, pinned to
//! its configured core when the platform allows.  The front end's queue is
//! the only hand-off between `feed` and `detect`; a single mutex guards the
//! feature window shared by `detect` and `action`.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cry_monitor::audio::{AudioCapture, QueueFrontEnd};
//! use cry_monitor::classify::EnergyClassifier;
//! use cry_monitor::config::AppConfig;
//! use cry_monitor::notify::LogSink;
//! use cry_monitor::pipeline::Pipeline;
//!
//! let config = AppConfig::default();
//! let capture = AudioCapture::new(None).unwrap();
//! let (_stream, reader) = capture.start(&config.audio, &config.front_end).unwrap();
//!
//! let pipeline = Pipeline::new(&config);
//! let workers = pipeline
//!     .start(
//!         reader,
//!         Arc::new(QueueFrontEnd::from_config(&config.front_end, config.audio.sample_rate)),
//!         EnergyClassifier::from_config(&config.classifier, config.audio.sample_rate),
//!         LogSink,
//!     )
//!     .unwrap();
//! workers.join();
//! ```

pub mod action;
pub mod backoff;
pub mod detect;
pub mod feed;
pub mod stats;

#[cfg(test)]
mod doubles;

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use thiserror::Error;

use crate::audio::{CaptureDevice, FeatureWindow, FrontEnd};
use crate::classify::Classifier;
use crate::config::{AppConfig, ClassifierConfig, WorkerConfig};
use crate::notify::EventSink;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use action::ClassifyStage;
pub use backoff::Backoff;
pub use detect::AccumulateStage;
pub use feed::CaptureEnhanceStage;
pub use stats::{spawn_monitor, PipelineStats, StatsSnapshot};

/// The feature window shared by the `detect` and `action` workers.
pub type SharedWindow = Arc<Mutex<FeatureWindow>>;

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("capture device delivers {device} channels, front end expects {front_end}")]
    ChannelMismatch { device: usize, front_end: usize },

    #[error("failed to spawn {name} worker: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Explicit pipeline context: the shared window, the counters, and the
/// settings the workers are built from.
///
/// The window (and, inside [`AccumulateStage`], the ring) are allocated
/// once here and live for the rest of the process.
pub struct Pipeline {
    window: SharedWindow,
    stats: Arc<PipelineStats>,
    classifier: ClassifierConfig,
    workers: WorkerConfig,
}

/// Join handles of the three workers.
pub struct Workers {
    pub feed: JoinHandle<()>,
    pub detect: JoinHandle<()>,
    pub action: JoinHandle<()>,
    /// Bytes held by the ring buffer and the feature window.
    pub buffer_bytes: usize,
}

impl Workers {
    /// Block on the workers.  They never return on their own, so this only
    /// comes back if one of them panics.
    pub fn join(self) {
        for (name, handle) in [
            ("feed", self.feed),
            ("detect", self.detect),
            ("action", self.action),
        ] {
            if handle.join().is_err() {
                log::error!("{name}: worker panicked");
            }
        }
    }
}

impl Pipeline {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            window: Arc::new(Mutex::new(FeatureWindow::new(config.audio.window_capacity))),
            stats: Arc::new(PipelineStats::new()),
            classifier: config.classifier.clone(),
            workers: config.workers.clone(),
        }
    }

    pub fn window(&self) -> SharedWindow {
        Arc::clone(&self.window)
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Bytes held by the feature window.  The ring is allocated by
    /// [`Pipeline::start`]; [`Workers::buffer_bytes`] covers both.
    pub fn window_bytes(&self) -> usize {
        self.window
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .footprint_bytes()
    }

    /// Build the three stages and spawn them as the `feed`, `detect` and
    /// `action` threads.
    ///
    /// Configuration mismatches are reported before any thread starts.
    pub fn start<D, C, S>(
        self,
        device: D,
        front_end: Arc<dyn FrontEnd>,
        classifier: C,
        sink: S,
    ) -> Result<Workers, PipelineError>
    where
        D: CaptureDevice + 'static,
        C: Classifier + 'static,
        S: EventSink + 'static,
    {
        let backoff = Backoff::from_config(&self.workers);

        let feed = CaptureEnhanceStage::new(
            device,
            Arc::clone(&front_end),
            backoff.clone(),
            self.stats(),
        )?;
        let detect = AccumulateStage::new(front_end, self.window(), backoff, self.stats());
        let action = ClassifyStage::new(
            classifier,
            sink,
            self.window(),
            &self.classifier,
            self.stats(),
        );

        let buffer_bytes = detect.footprint_bytes();

        Ok(Workers {
            buffer_bytes,
            feed: spawn_worker("feed", self.workers.feed_core, move || feed.run())?,
            detect: spawn_worker("detect", self.workers.detect_core, move || detect.run())?,
            action: spawn_worker("action", self.workers.action_core, move || action.run())?,
        })
    }
}

// ---------------------------------------------------------------------------
// Thread helpers
// ---------------------------------------------------------------------------

fn spawn_worker<F>(
    name: &'static str,
    core: Option<usize>,
    body: F,
) -> Result<JoinHandle<()>, PipelineError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.into())
        .spawn(move || {
            if let Some(core) = core {
                pin_to_core(name, core);
            }
            log::info!("{name}: worker started");
            body();
        })
        .map_err(|source| PipelineError::Spawn { name, source })
}

/// Pin the calling thread to `core`.  Failure is logged, never fatal.
fn pin_to_core(name: &str, core: usize) {
    let Some(ids) = core_affinity::get_core_ids() else {
        log::warn!("{name}: core pinning not supported here, running unpinned");
        return;
    };
    match ids.into_iter().find(|id| id.id == core) {
        Some(id) if core_affinity::set_for_current(id) => {
            log::debug!("{name}: pinned to core {core}");
        }
        Some(_) => log::warn!("{name}: failed to pin to core {core}, running unpinned"),
        None => log::warn!("{name}: core {core} not available, running unpinned"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
