//! Sample-format, channel and rate conversion utilities.
//!
//! The pipeline runs on **16 kHz** audio carried as interleaved `i16` frames
//! between the capture device and the front end, and as normalized `f32`
//! after it.  This module provides the conversion steps:
//!
//! 1. [`downmix`]: average any number of interleaved channels to mono.
//! 2. [`StreamResampler`]: linear-interpolation resampling of a chunked
//!    stream between two rates.
//! 3. [`f32_to_i16`] / [`i16_to_f32`]: full-scale sample conversion.

// ---------------------------------------------------------------------------
// downmix
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`; a trailing partial frame
/// is ignored.
///
/// * If `channels == 1` the input slice is returned as an owned `Vec`.
/// * If `channels == 0` an empty vector is returned.
///
/// # Example
///
/// ```rust
/// use cry_monitor::audio::downmix;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = downmix(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// StreamResampler
// ---------------------------------------------------------------------------

/// Linear-interpolation resampler for audio that arrives in chunks.
///
/// The read position is carried from one chunk to the next in exact units of
/// `1 / target_rate` source samples, and the last sample of each chunk is
/// kept so the first output of the next chunk can interpolate across the
/// boundary.  Splitting a stream into chunks of any size therefore yields the
/// same output as resampling it in one piece, and the output count never
/// drifts from `input * target_rate / source_rate` by more than one sample.
///
/// * Equal rates pass samples through unchanged.
/// * Empty input, or a zero rate, yields nothing.
///
/// # Example
///
/// ```rust
/// use cry_monitor::audio::StreamResampler;
///
/// let mut resampler = StreamResampler::new(48_000, 16_000);
/// let lo = resampler.process(&vec![0.5_f32; 480]);
/// assert_eq!(lo.len(), 160);
/// ```
#[derive(Debug, Clone)]
pub struct StreamResampler {
    source_rate: u32,
    target_rate: u32,
    /// Next output position relative to the start of the next chunk, in
    /// source samples scaled by `target_rate`.  Ranges over
    /// `[-target_rate, source_rate)`.
    pos: i64,
    /// Last sample of the previous chunk (index -1 of the next one).
    prev: Option<f32>,
}

impl StreamResampler {
    pub fn new(source_rate: u32, target_rate: u32) -> Self {
        Self {
            source_rate,
            target_rate,
            pos: 0,
            prev: None,
        }
    }

    pub fn source_rate(&self) -> u32 {
        self.source_rate
    }

    /// Resample the next chunk of the stream.
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        if self.source_rate == self.target_rate {
            return input.to_vec();
        }
        let Some(&last) = input.last() else {
            return Vec::new();
        };
        if self.source_rate == 0 || self.target_rate == 0 {
            return Vec::new();
        }

        let target = i64::from(self.target_rate);
        let step = i64::from(self.source_rate);
        let n = input.len() as i64;
        let prev = self.prev.unwrap_or(input[0]);
        let sample = |i: i64| if i < 0 { prev } else { input[i as usize] };

        let mut output = Vec::with_capacity((n * target / step) as usize + 1);
        while self.pos <= (n - 1) * target {
            let idx = self.pos.div_euclid(target);
            let frac = self.pos.rem_euclid(target) as f32 / target as f32;
            let a = sample(idx);
            let b = if frac > 0.0 { sample(idx + 1) } else { a };
            output.push(a + (b - a) * frac);
            self.pos += step;
        }

        self.pos -= n * target;
        self.prev = Some(last);
        output
    }
}

// ---------------------------------------------------------------------------
// i16 <-> f32
// ---------------------------------------------------------------------------

/// Convert a normalized sample to 16-bit PCM, clamping out-of-range input.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Convert 16-bit PCM to a normalized sample in `[-1.0, 1.0)`.
pub fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / 32_768.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- downmix -----------------------------------------------------------

    #[test]
    fn downmix_already_mono() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(downmix(&input, 1), input);
    }

    #[test]
    fn downmix_two_channel() {
        let out = downmix(&[1.0_f32, -1.0, 0.5, 0.5], 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downmix_ignores_partial_trailing_frame() {
        let out = downmix(&[0.2_f32, 0.4, 0.6, 0.9, 0.9], 2);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn downmix_zero_channels() {
        assert!(downmix(&[1.0_f32, 2.0], 0).is_empty());
    }

    // ---- StreamResampler ---------------------------------------------------

    #[test]
    fn resample_same_rate_is_noop() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        assert_eq!(StreamResampler::new(16_000, 16_000).process(&input), input);
    }

    #[test]
    fn resample_empty_or_zero_rate_yields_nothing() {
        assert!(StreamResampler::new(48_000, 16_000).process(&[]).is_empty());
        assert!(StreamResampler::new(0, 16_000).process(&[0.1, 0.2]).is_empty());
    }

    #[test]
    fn resample_constant_signal_preserves_amplitude() {
        let mut r = StreamResampler::new(48_000, 16_000);
        for _ in 0..3 {
            for s in r.process(&[0.5_f32; 437]) {
                assert!((s - 0.5).abs() < 1e-6, "amplitude drift: {s}");
            }
        }
    }

    #[test]
    fn chunked_output_count_does_not_drift() {
        let mut r = StreamResampler::new(44_100, 16_000);
        let total: usize = (0..100).map(|_| r.process(&[0.0_f32; 1024]).len()).sum();
        let exact = 102_400.0 * 16_000.0 / 44_100.0;
        assert!(
            (total as f64 - exact).abs() <= 1.0,
            "expected ~{exact:.1}, got {total}"
        );
    }

    #[test]
    fn chunked_ramp_lands_on_continuous_positions() {
        // A ramp makes every output equal to its source position.
        let ramp: Vec<f32> = (0..4_410).map(|i| i as f32).collect();
        let mut r = StreamResampler::new(44_100, 16_000);
        let out: Vec<f32> = ramp.chunks(97).flat_map(|c| r.process(c)).collect();

        assert_eq!(out.len(), 1_600);
        for (k, &s) in out.iter().enumerate() {
            let expected = k as f32 * 44_100.0 / 16_000.0;
            assert!((s - expected).abs() < 1e-2, "out[{k}] = {s}, expected {expected}");
        }
    }

    #[test]
    fn upsample_interpolates_across_chunk_boundary() {
        let mut r = StreamResampler::new(8_000, 16_000);
        assert_eq!(
            r.process(&[0.0, 1.0, 2.0, 3.0]),
            vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0]
        );
        assert_eq!(r.process(&[4.0, 5.0]), vec![3.5, 4.0, 4.5, 5.0]);
    }

    // ---- i16 <-> f32 -------------------------------------------------------

    #[test]
    fn f32_to_i16_clamps_and_scales() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(2.5), i16::MAX);
        assert_eq!(f32_to_i16(-3.0), -i16::MAX);
    }

    #[test]
    fn i16_to_f32_full_scale() {
        assert_eq!(i16_to_f32(0), 0.0);
        assert_eq!(i16_to_f32(i16::MIN), -1.0);
        assert!(i16_to_f32(i16::MAX) < 1.0);
    }
}
