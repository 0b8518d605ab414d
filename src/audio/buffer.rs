//! Fixed-capacity circular (ring) buffer for `f32` audio samples.
//!
//! New samples **overwrite** the oldest data, so the buffer always holds the
//! most recent `capacity` samples.  Storage is allocated once, zero-filled,
//! and never resized; slots that have not been written yet read as zero.
//!
//! # Example
//!
//! ```rust
//! use cry_monitor::audio::RingBuffer;
//!
//! let mut buf = RingBuffer::new(4);
//! buf.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]); // 5 items → capacity 4 → oldest dropped
//! let mut out = [0.0; 4];
//! buf.linearize_into(&mut out);
//! assert_eq!(out, [2.0, 3.0, 4.0, 5.0]);
//! ```

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// A fixed-capacity circular buffer.
///
/// Generic over `T: Copy + Default` so it can store any `Copy` scalar, though
/// the pipeline uses `RingBuffer<f32>` exclusively.
pub struct RingBuffer<T> {
    buf: Vec<T>,
    capacity: usize,
    /// Index of the *next* write position, which is also the oldest sample.
    write_pos: usize,
    /// Number of samples written so far, saturating at `capacity`.
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a new ring buffer with the given `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            buf: vec![T::default(); capacity],
            capacity,
            write_pos: 0,
            len: 0,
        }
    }

    /// Append one sample, overwriting the oldest.
    pub fn push(&mut self, item: T) {
        self.buf[self.write_pos] = item;
        self.write_pos = (self.write_pos + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Append `data` one sample at a time.
    pub fn push_slice(&mut self, data: &[T]) {
        for &item in data {
            self.push(item);
        }
    }

    /// Copy the whole buffer into `out` oldest-first, starting at the write
    /// cursor and wrapping to the slot just before it.
    ///
    /// Before the first full fill the leading slots are the zero-initialised
    /// ones that have not been written yet.
    ///
    /// # Panics
    ///
    /// Panics if `out.len() != capacity`.
    pub fn linearize_into(&self, out: &mut [T]) {
        assert_eq!(
            out.len(),
            self.capacity,
            "linearize target must match ring capacity"
        );
        let (newer, older) = self.buf.split_at(self.write_pos);
        out[..older.len()].copy_from_slice(older);
        out[older.len()..].copy_from_slice(newer);
    }

    /// Current write cursor, in `[0, capacity)`.
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Number of samples written so far (≤ `capacity`).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of samples the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Heap bytes held by the sample storage.
    pub fn footprint_bytes(&self) -> usize {
        self.buf.len() * std::mem::size_of::<T>()
    }

    /// Returns `true` once the buffer has been filled at least once.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
