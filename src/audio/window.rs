//! Feature window: the temporally ordered snapshot the classifier reads.
//!
//! [`FeatureWindow`] is a fixed array of `capacity` samples that is rebuilt
//! in full from a [`RingBuffer`] on every update.  It is not incremental: a
//! rebuild costs O(capacity) no matter how many samples were appended since
//! the previous one.
//!
//! The window implements [`Signal`], so a classifier pulls slices straight
//! out of window memory while the caller holds the window lock.

use crate::audio::RingBuffer;
use crate::classify::{ClassifierError, Signal};

/// Linearized copy of the ring buffer, oldest sample first.
pub struct FeatureWindow {
    samples: Box<[f32]>,
}

impl FeatureWindow {
    /// Allocate a zero-filled window.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "FeatureWindow capacity must be > 0");
        Self {
            samples: vec![0.0; capacity].into_boxed_slice(),
        }
    }

    /// Overwrite the whole window with `ring` linearized from its write
    /// cursor (oldest) to the slot before it (newest).
    ///
    /// # Panics
    ///
    /// Panics if the ring capacity differs from the window length.
    pub fn rebuild_from(&mut self, ring: &RingBuffer<f32>) {
        ring.linearize_into(&mut self.samples);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Heap bytes held by the window.
    pub fn footprint_bytes(&self) -> usize {
        std::mem::size_of_val(&*self.samples)
    }
}

impl Signal for FeatureWindow {
    fn total_length(&self) -> usize {
        self.samples.len()
    }

    fn slice(&self, offset: usize, length: usize) -> Option<&[f32]> {
        let end = offset.checked_add(length)?;
        self.samples.get(offset..end)
    }

    fn get_data(&self, offset: usize, out: &mut [f32]) -> Result<(), ClassifierError> {
        let src = self
            .slice(offset, out.len())
            .ok_or(ClassifierError::OutOfRange {
                offset,
                length: out.len(),
                total: self.samples.len(),
            })?;
        out.copy_from_slice(src);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
