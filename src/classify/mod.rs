//! Classification: model interface, label reduction, and debouncing.
//!
//! This module provides:
//! * [`Classifier`] / [`Signal`]: the pull-based model interface.
//! * [`EnergyClassifier`]: built-in sustained-loudness model.
//! * [`LabelSet`] / [`Label`]: reduction of scores to one label.
//! * [`Debouncer`] / [`DetectionState`]: the edge-triggered latch.
//!
//! # Quick start
//!
//! ```rust
//! use cry_monitor::audio::FeatureWindow;
//! use cry_monitor::classify::{Classifier, Debouncer, EnergyClassifier, LabelSet};
//!
//! let labels = LabelSet::default();
//! let mut model = EnergyClassifier::new(labels, 0.05, 1_600);
//! let mut debouncer = Debouncer::new();
//!
//! let window = FeatureWindow::new(16_000);
//! let label = labels.reduce(&model.run(&window));
//! assert_eq!(debouncer.observe(label), None); // silence keeps us quiet
//! ```

pub mod debounce;
pub mod energy;
pub mod label;
pub mod model;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use debounce::{Debouncer, DetectionState};
pub use energy::EnergyClassifier;
pub use label::{Label, LabelSet};
pub use model::{Classifier, ClassifierError, Signal};
