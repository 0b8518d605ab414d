//! Energy-based two-label classifier.
//!
//! The window is split into fixed frames (100 ms by default).  A frame whose
//! RMS amplitude exceeds the threshold counts as active.  The primary score
//! is the fraction of active frames, the background score its complement, so
//! the primary label wins once more than half of the window is loud.

use crate::audio::rms;
use crate::classify::{Classifier, ClassifierError, LabelSet, Signal};
use crate::config::ClassifierConfig;

/// Sustained-loudness classifier pulling frames through [`Signal::slice`].
///
/// # Example
///
/// ```rust
/// use cry_monitor::audio::FeatureWindow;
/// use cry_monitor::classify::{Classifier, EnergyClassifier, LabelSet};
///
/// let mut model = EnergyClassifier::new(LabelSet::default(), 0.05, 1_600);
/// let window = FeatureWindow::new(16_000); // silence
/// let scores = model.run(&window).unwrap();
/// assert_eq!(scores, vec![0.0, 1.0]);
/// ```
#[derive(Debug, Clone)]
pub struct EnergyClassifier {
    labels: LabelSet,
    rms_threshold: f32,
    frame_len: usize,
}

impl EnergyClassifier {
    /// # Panics
    ///
    /// Panics if `frame_len == 0`.
    pub fn new(labels: LabelSet, rms_threshold: f32, frame_len: usize) -> Self {
        assert!(frame_len > 0, "frame_len must be > 0");
        Self {
            labels,
            rms_threshold,
            frame_len,
        }
    }

    /// Build from settings; the frame length is `frame_ms` at `sample_rate`.
    pub fn from_config(config: &ClassifierConfig, sample_rate: u32) -> Self {
        let frame_len = (sample_rate as u64 * config.frame_ms as u64 / 1_000).max(1) as usize;
        Self::new(
            LabelSet {
                primary: config.primary_label,
                background: config.background_label,
            },
            config.rms_threshold,
            frame_len,
        )
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }
}

impl Classifier for EnergyClassifier {
    fn label_count(&self) -> usize {
        self.labels.primary.max(self.labels.background) + 1
    }

    fn run(&mut self, signal: &dyn Signal) -> Result<Vec<f32>, ClassifierError> {
        let total = signal.total_length();
        if total == 0 {
            return Err(ClassifierError::Inference("empty signal".into()));
        }

        let mut frames = 0usize;
        let mut active = 0usize;
        let mut offset = 0;
        while offset < total {
            let length = self.frame_len.min(total - offset);
            let frame = signal
                .slice(offset, length)
                .ok_or(ClassifierError::OutOfRange {
                    offset,
                    length,
                    total,
                })?;
            if rms(frame) > self.rms_threshold {
                active += 1;
            }
            frames += 1;
            offset += length;
        }

        let ratio = active as f32 / frames as f32;
        let mut scores = vec![0.0; self.label_count()];
        scores[self.labels.primary] = ratio;
        scores[self.labels.background] = 1.0 - ratio;
        Ok(scores)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
