//! `action` worker: periodic classification, debounce, and notification.
//!
//! ```text
//! every interval:
//!   lock window ─▶ classifier.run(&window) ─▶ unlock
//!   scores ─▶ argmax (background wins ties) ─▶ label
//!   label ─▶ debouncer ─▶ edge? ─▶ sink.notify(active)
//! ```

use std::sync::{Arc, PoisonError};
use std::thread;
use std::time::Duration;

use crate::classify::{Classifier, Debouncer, DetectionState, Label, LabelSet};
use crate::config::{ClassifierConfig, FailurePolicy};
use crate::notify::EventSink;
use crate::pipeline::{PipelineStats, SharedWindow};

pub struct ClassifyStage<C: Classifier, S: EventSink> {
    classifier: C,
    sink: S,
    window: SharedWindow,
    labels: LabelSet,
    on_failure: FailurePolicy,
    debouncer: Debouncer,
    interval: Duration,
    stats: Arc<PipelineStats>,
}

impl<C: Classifier, S: EventSink> ClassifyStage<C, S> {
    pub fn new(
        classifier: C,
        sink: S,
        window: SharedWindow,
        config: &ClassifierConfig,
        stats: Arc<PipelineStats>,
    ) -> Self {
        let labels = LabelSet {
            primary: config.primary_label,
            background: config.background_label,
        };
        let count = classifier.label_count();
        if labels.primary >= count || labels.background >= count {
            log::warn!(
                "action: classifier has {count} labels but primary={} background={}",
                labels.primary,
                labels.background
            );
        }

        Self {
            classifier,
            sink,
            window,
            labels,
            on_failure: config.on_failure,
            debouncer: Debouncer::new(),
            interval: Duration::from_millis(config.interval_ms),
            stats,
        }
    }

    pub fn state(&self) -> DetectionState {
        self.debouncer.state()
    }

    /// Classify the current window once.  Returns the transition emitted to
    /// the sink, if any.
    pub fn step(&mut self) -> Option<bool> {
        let outcome = {
            let window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
            self.classifier.run(&*window)
        };
        self.stats.record_classification();

        if let Err(e) = &outcome {
            self.stats.record_inference_failure();
            match self.on_failure {
                FailurePolicy::Hold => {
                    log::warn!("action: inference failed: {e}; holding {:?}", self.state());
                    return None;
                }
                FailurePolicy::Background => {
                    log::warn!("action: inference failed: {e}; treating as background");
                }
            }
        }

        let label = self.labels.reduce(&outcome);
        if let Label::Other(index) = label {
            log::debug!("action: label {index} ignored");
        }

        let edge = self.debouncer.observe(label);
        if let Some(active) = edge {
            log::info!(
                "action: detection {}",
                if active { "started" } else { "cleared" }
            );
            self.sink.notify(active);
            self.stats.record_event();
        }
        edge
    }

    pub fn run(mut self) {
        loop {
            self.step();
            thread::sleep(self.interval);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
