//! Edge-triggered detection latch.
//!
//! ```text
//! Quiet ──Primary──▶ Active      emits true
//! Active ──Background──▶ Quiet   emits false
//! anything else                  no transition, no emission
//! ```
//!
//! There are no timeouts: only an explicit opposite label flips the state.

use crate::classify::Label;

/// Latched detection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionState {
    #[default]
    Quiet,
    Active,
}

impl DetectionState {
    pub fn is_active(&self) -> bool {
        matches!(self, DetectionState::Active)
    }
}

/// Debounce state machine driven by the latest label.
#[derive(Debug, Default)]
pub struct Debouncer {
    state: DetectionState,
}

impl Debouncer {
    /// Start in [`DetectionState::Quiet`] without emitting anything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    /// Feed one label.  Returns `Some(active)` exactly on a state edge.
    pub fn observe(&mut self, label: Label) -> Option<bool> {
        match (self.state, label) {
            (DetectionState::Quiet, Label::Primary) => {
                self.state = DetectionState::Active;
                Some(true)
            }
            (DetectionState::Active, Label::Background) => {
                self.state = DetectionState::Quiet;
                Some(false)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn emissions(labels: &[Label]) -> Vec<bool> {
        let mut debouncer = Debouncer::new();
        labels.iter().filter_map(|&l| debouncer.observe(l)).collect()
    }

    #[test]
    fn starts_quiet() {
        assert_eq!(Debouncer::new().state(), DetectionState::Quiet);
        assert!(!DetectionState::default().is_active());
    }

    #[test]
    fn quiet_to_active_emits_true_once() {
        assert_eq!(
            emissions(&[Label::Primary, Label::Primary, Label::Primary]),
            vec![true]
        );
    }

    #[test]
    fn active_to_quiet_emits_false_once() {
        assert_eq!(
            emissions(&[Label::Primary, Label::Background, Label::Background]),
            vec![true, false]
        );
    }

    #[test]
    fn background_while_quiet_emits_nothing() {
        assert!(emissions(&[Label::Background, Label::Background]).is_empty());
    }

    #[test]
    fn other_labels_never_transition() {
        let mut debouncer = Debouncer::new();
        assert_eq!(debouncer.observe(Label::Other(2)), None);
        assert_eq!(debouncer.state(), DetectionState::Quiet);

        debouncer.observe(Label::Primary);
        assert_eq!(debouncer.observe(Label::Other(5)), None);
        assert_eq!(debouncer.state(), DetectionState::Active);
    }

    /// Emissions never outnumber state changes, and alternate strictly.
    #[test]
    fn emissions_alternate_and_match_state_changes() {
        let labels = [
            Label::Background,
            Label::Primary,
            Label::Other(3),
            Label::Primary,
            Label::Background,
            Label::Other(2),
            Label::Background,
            Label::Primary,
            Label::Background,
        ];

        let mut debouncer = Debouncer::new();
        let mut changes = 0;
        let mut events = Vec::new();
        for label in labels {
            let before = debouncer.state();
            if let Some(active) = debouncer.observe(label) {
                events.push(active);
            }
            if debouncer.state() != before {
                changes += 1;
            }
        }

        assert_eq!(events, vec![true, false, true, false]);
        assert_eq!(events.len(), changes);
        assert!(events.windows(2).all(|w| w[0] != w[1]));
    }
}
