//! Block-level conditioning used by the built-in front end.
//!
//! ## Algorithm
//!
//! Audio is split into 10 ms blocks (160 samples @ 16 kHz).  A block whose
//! RMS amplitude is at or below the noise floor is treated as background
//! noise and either zeroed ([`NoiseSuppressionMode::Gate`]) or attenuated by
//! 20 dB ([`NoiseSuppressionMode::Soft`]).  Gain stages are applied after
//! suppression and the result is clamped to `[-1.0, 1.0]`.

use crate::config::NoiseSuppressionMode;

/// Linear factor applied to noise blocks in soft mode (-20 dB).
const SOFT_ATTENUATION: f32 = 0.1;

/// Root-mean-square amplitude of `block`; `0.0` for an empty block.
pub fn rms(block: &[f32]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    let mean_sq: f32 = block.iter().map(|s| s * s).sum::<f32>() / block.len() as f32;
    mean_sq.sqrt()
}

/// Convert a gain in decibels to a linear amplitude factor.
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

// ---------------------------------------------------------------------------
// NoiseSuppressor
// ---------------------------------------------------------------------------

/// Energy-gated noise suppressor.
///
/// # Example
///
/// ```rust
/// use cry_monitor::audio::NoiseSuppressor;
/// use cry_monitor::config::NoiseSuppressionMode;
///
/// let ns = NoiseSuppressor::new(NoiseSuppressionMode::Gate, 0.01);
/// let mut audio = vec![0.001_f32; 160];
/// audio.extend(vec![0.5_f32; 160]);
/// ns.process(&mut audio);
/// assert!(audio[..160].iter().all(|&s| s == 0.0));
/// assert!(audio[160..].iter().all(|&s| s == 0.5));
/// ```
#[derive(Debug, Clone)]
pub struct NoiseSuppressor {
    mode: NoiseSuppressionMode,
    floor: f32,
    /// Block size in samples.  Default: 160 samples = 10 ms at 16 kHz.
    block_size: usize,
}

impl NoiseSuppressor {
    pub fn new(mode: NoiseSuppressionMode, floor: f32) -> Self {
        Self {
            mode,
            floor,
            block_size: 160,
        }
    }

    /// 10 ms blocks at `sample_rate`.
    pub fn for_sample_rate(mode: NoiseSuppressionMode, floor: f32, sample_rate: u32) -> Self {
        Self::with_block_size(mode, floor, (sample_rate as usize / 100).max(1))
    }

    /// Use a custom block size.
    pub fn with_block_size(mode: NoiseSuppressionMode, floor: f32, block_size: usize) -> Self {
        assert!(block_size > 0, "block_size must be > 0");
        Self {
            mode,
            floor,
            block_size,
        }
    }

    /// Suppress noise blocks in place.  A trailing short block is judged on
    /// its own samples.
    pub fn process(&self, audio: &mut [f32]) {
        for block in audio.chunks_mut(self.block_size) {
            if rms(block) > self.floor {
                continue;
            }
            match self.mode {
                NoiseSuppressionMode::Gate => block.fill(0.0),
                NoiseSuppressionMode::Soft => block.iter_mut().for_each(|s| *s *= SOFT_ATTENUATION),
            }
        }
    }
}

/// Multiply every sample by `gain` and clamp to full scale.
pub fn apply_gain(audio: &mut [f32], gain: f32) {
    for s in audio.iter_mut() {
        *s = (*s * gain).clamp(-1.0, 1.0);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
