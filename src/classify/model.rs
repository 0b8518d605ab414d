//! Classifier model interface.
//!
//! A [`Classifier`] maps a fixed-length window to one score per label.  It
//! does not receive the samples up front; it pulls them through a
//! [`Signal`], which serves `[offset, offset + len)` slices directly out of
//! the window the caller is holding.

use thiserror::Error;

// ---------------------------------------------------------------------------
// ClassifierError
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    /// The model asked for samples past the end of the signal.
    #[error("requested {length} samples at offset {offset}, signal has {total}")]
    OutOfRange {
        offset: usize,
        length: usize,
        total: usize,
    },

    /// The model itself failed.
    #[error("inference failed: {0}")]
    Inference(String),
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// Pull-based access to the samples being classified.
pub trait Signal {
    /// Number of samples the signal holds.
    fn total_length(&self) -> usize;

    /// Borrow `length` samples starting at `offset` without copying.
    /// `None` when the range does not fit.
    fn slice(&self, offset: usize, length: usize) -> Option<&[f32]>;

    /// Copy `out.len()` samples starting at `offset` into `out`.
    fn get_data(&self, offset: usize, out: &mut [f32]) -> Result<(), ClassifierError>;
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// A model scoring a window against a fixed label set.
///
/// `run` executes while the caller holds the window lock, so it should not
/// block on anything but computation.
pub trait Classifier: Send {
    /// Number of labels, i.e. the length of every score vector `run` returns.
    fn label_count(&self) -> usize;

    /// Score `signal`; index `i` of the result is the score of label `i`.
    fn run(&mut self, signal: &dyn Signal) -> Result<Vec<f32>, ClassifierError>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn label_count(&self) -> usize {
        (**self).label_count()
    }

    fn run(&mut self, signal: &dyn Signal) -> Result<Vec<f32>, ClassifierError> {
        (**self).run(signal)
    }
}
