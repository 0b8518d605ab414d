//! Reduction of per-label scores to a single label.

use crate::classify::ClassifierError;

/// The two label indices the debouncer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSet {
    /// "Condition detected".
    pub primary: usize,
    /// "Everything else"; the starting point and tie-break winner.
    pub background: usize,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            primary: 0,
            background: 1,
        }
    }
}

/// Outcome of one classification, as seen by the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Primary,
    Background,
    /// Any index other than the two distinguished ones.
    Other(usize),
}

impl LabelSet {
    /// Name the label at `index`.
    pub fn label(&self, index: usize) -> Label {
        if index == self.primary {
            Label::Primary
        } else if index == self.background {
            Label::Background
        } else {
            Label::Other(index)
        }
    }

    /// Index of the winning label.
    ///
    /// Starts at `background` and moves only on a score *strictly* greater
    /// than the current best, so a tie with the background score keeps
    /// `background`, and among tied challengers the lowest index wins.
    /// A `NaN` score never wins.
    pub fn argmax(&self, scores: &[f32]) -> usize {
        let mut best = self.background;
        let mut best_score = scores.get(best).copied().unwrap_or(f32::NEG_INFINITY);
        for (i, &score) in scores.iter().enumerate() {
            if score > best_score {
                best = i;
                best_score = score;
            }
        }
        best
    }

    /// Reduce a classifier outcome to a label.  A failed run skips the scan
    /// and yields `background`.
    pub fn reduce(&self, outcome: &Result<Vec<f32>, ClassifierError>) -> Label {
        match outcome {
            Ok(scores) => self.label(self.argmax(scores)),
            Err(_) => Label::Background,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
