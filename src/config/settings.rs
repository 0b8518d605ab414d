//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to worker
//! threads by value.  Every section carries `#[serde(default)]`, so a
//! settings file only needs the keys it overrides.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Capture and window sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Pipeline sample rate in Hz.  The capture reader resamples to it.
    pub sample_rate: u32,
    /// Ring buffer / feature window capacity in samples (1 s at 16 kHz).
    pub window_capacity: usize,
    /// Input device name; `None` means the system default.
    pub input_device: Option<String>,
    /// How long a single capture read may wait for the device.
    pub read_timeout_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            window_capacity: 16_000,
            input_device: None,
            read_timeout_ms: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// FrontEndConfig
// ---------------------------------------------------------------------------

/// How the front end treats blocks that fall below the noise floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseSuppressionMode {
    /// Zero the block.
    Gate,
    /// Attenuate the block by 20 dB.
    Soft,
}

impl Default for NoiseSuppressionMode {
    fn default() -> Self {
        Self::Gate
    }
}

/// Static configuration of the enhancement front end.
///
/// Opaque to the pipeline core: it is consumed once when the front end is
/// created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontEndConfig {
    /// Microphone channels per interleaved frame.
    pub mic_channels: u16,
    /// Playback reference channels per interleaved frame.
    pub ref_channels: u16,
    pub noise_suppression: bool,
    pub ns_mode: NoiseSuppressionMode,
    /// RMS level below which a 10 ms block counts as noise.
    pub noise_floor: f32,
    pub echo_cancellation: bool,
    pub voice_activity_detection: bool,
    pub wake_word_detection: bool,
    pub voice_communication: bool,
    /// Automatic gain control inside voice-communication mode.
    pub voice_communication_agc: bool,
    /// Gain applied by the AGC stage, in dB.
    pub agc_gain_db: u8,
    /// Linear gain applied to every output sample.
    pub linear_gain: f32,
    /// Depth of the front end's internal queue, in fetch chunks.
    pub queue_frames: usize,
    /// Samples per channel in every frame passed to `feed`.
    pub feed_chunk_size: usize,
    /// Samples in every frame returned by `fetch`.
    pub fetch_chunk_size: usize,
    /// Upper bound on a single `fetch` wait.
    pub fetch_timeout_ms: u64,
}

impl FrontEndConfig {
    /// Total interleaved channels per fed frame.
    pub fn total_channels(&self) -> usize {
        self.mic_channels as usize + self.ref_channels as usize
    }
}

impl Default for FrontEndConfig {
    fn default() -> Self {
        Self {
            mic_channels: 2,
            ref_channels: 1,
            noise_suppression: true,
            ns_mode: NoiseSuppressionMode::default(),
            noise_floor: 0.01,
            echo_cancellation: false,
            voice_activity_detection: false,
            wake_word_detection: false,
            voice_communication: true,
            voice_communication_agc: false,
            agc_gain_db: 15,
            linear_gain: 1.0,
            queue_frames: 50,
            feed_chunk_size: 512,
            fetch_chunk_size: 512,
            fetch_timeout_ms: 200,
        }
    }
}

// ---------------------------------------------------------------------------
// ClassifierConfig
// ---------------------------------------------------------------------------

/// What a failed inference counts as.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Treat the failure as a background classification.  A failure while
    /// the detection is active therefore clears it.
    Background,
    /// Skip the cycle: no label, no transition.
    Hold,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::Background
    }
}

/// Settings for the classify worker and the built-in energy classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Delay between two classifications.
    pub interval_ms: u64,
    /// Label index meaning "condition detected".
    pub primary_label: usize,
    /// Label index meaning "everything else"; also the tie-break default.
    pub background_label: usize,
    pub on_failure: FailurePolicy,
    /// Frame RMS above which the energy classifier counts a frame as active.
    pub rms_threshold: f32,
    /// Energy classifier frame length in milliseconds.
    pub frame_ms: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            primary_label: 0,
            background_label: 1,
            on_failure: FailurePolicy::default(),
            rms_threshold: 0.05,
            frame_ms: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// WorkerConfig
// ---------------------------------------------------------------------------

/// Core placement and retry pacing of the worker threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Core for the capture → front-end worker.  `None` leaves it unpinned.
    pub feed_core: Option<usize>,
    /// Core for the accumulate worker.
    pub detect_core: Option<usize>,
    /// Core for the classify worker.
    pub action_core: Option<usize>,
    /// First retry delay after a failed read or fetch.
    pub backoff_min_ms: u64,
    /// Ceiling of the exponential retry delay.
    pub backoff_max_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            feed_core: Some(0),
            detect_core: Some(1),
            action_core: Some(1),
            backoff_min_ms: 1,
            backoff_max_ms: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// NotifyConfig
// ---------------------------------------------------------------------------

/// Outbound notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Publish over HTTP.  When `false` transitions are only logged.
    pub enabled: bool,
    /// Endpoint that receives `{"topic", "payload"}` JSON bodies.
    pub url: String,
    pub topic: String,
    pub timeout_secs: u64,
    /// Capacity of the channel between the classify worker and the
    /// publisher task.
    pub channel_capacity: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://localhost:8080/publish".into(),
            topic: "bedroom/sensor/baby_monitor".into(),
            timeout_secs: 5,
            channel_capacity: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// TelemetryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Seconds between two stats log lines; `0` disables the monitor.
    pub interval_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use cry_monitor::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub front_end: FrontEndConfig,
    pub classifier: ClassifierConfig,
    pub workers: WorkerConfig,
    pub notify: NotifyConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            bail!("audio.sample_rate must be > 0");
        }
        if self.audio.window_capacity == 0 {
            bail!("audio.window_capacity must be > 0");
        }
        if self.front_end.mic_channels == 0 {
            bail!("front_end.mic_channels must be > 0");
        }
        if self.front_end.feed_chunk_size == 0 || self.front_end.fetch_chunk_size == 0 {
            bail!("front_end chunk sizes must be > 0");
        }
        if self.front_end.queue_frames == 0 {
            bail!("front_end.queue_frames must be > 0");
        }
        if self.classifier.interval_ms == 0 {
            bail!("classifier.interval_ms must be > 0");
        }
        if self.classifier.frame_ms == 0 {
            bail!("classifier.frame_ms must be > 0");
        }
        if self.classifier.primary_label == self.classifier.background_label {
            bail!(
                "classifier.primary_label and background_label must differ (both {})",
                self.classifier.primary_label
            );
        }
        if self.workers.backoff_min_ms == 0 {
            bail!("workers.backoff_min_ms must be > 0");
        }
        if self.workers.backoff_min_ms > self.workers.backoff_max_ms {
            bail!(
                "workers.backoff_min_ms ({}) exceeds backoff_max_ms ({})",
                self.workers.backoff_min_ms,
                self.workers.backoff_max_ms
            );
        }
        if self.notify.channel_capacity == 0 {
            bail!("notify.channel_capacity must be > 0");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// A default `AppConfig` survives a TOML save/load cycle.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.audio.sample_rate, loaded.audio.sample_rate);
        assert_eq!(original.audio.window_capacity, loaded.audio.window_capacity);
        assert_eq!(original.audio.input_device, loaded.audio.input_device);
        assert_eq!(original.front_end.mic_channels, loaded.front_end.mic_channels);
        assert_eq!(original.front_end.ns_mode, loaded.front_end.ns_mode);
        assert_eq!(original.classifier.on_failure, loaded.classifier.on_failure);
        assert_eq!(original.workers.feed_core, loaded.workers.feed_core);
        assert_eq!(original.notify.topic, loaded.notify.topic);
        assert_eq!(
            original.telemetry.interval_secs,
            loaded.telemetry.interval_secs
        );
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.audio.window_capacity, 16_000);
        assert_eq!(config.classifier.interval_ms, 1_000);
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.audio.sample_rate, 16_000);
        assert_eq!(cfg.audio.window_capacity, 16_000);
        assert_eq!(cfg.front_end.mic_channels, 2);
        assert_eq!(cfg.front_end.ref_channels, 1);
        assert_eq!(cfg.front_end.total_channels(), 3);
        assert!(cfg.front_end.noise_suppression);
        assert!(!cfg.front_end.echo_cancellation);
        assert!(!cfg.front_end.voice_activity_detection);
        assert!(!cfg.front_end.wake_word_detection);
        assert!(cfg.front_end.voice_communication);
        assert!(!cfg.front_end.voice_communication_agc);
        assert_eq!(cfg.front_end.queue_frames, 50);
        assert_eq!(cfg.classifier.interval_ms, 1_000);
        assert_eq!(cfg.classifier.primary_label, 0);
        assert_eq!(cfg.classifier.background_label, 1);
        assert_eq!(cfg.classifier.on_failure, FailurePolicy::Background);
        assert!(!cfg.notify.enabled);
        assert!(cfg.validate().is_ok());
    }

    /// A file that sets only a few keys keeps defaults for the rest.
    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[classifier]\non_failure = \"hold\"\ninterval_ms = 250\n\n[front_end]\nns_mode = \"soft\"\n",
        )
        .expect("write");

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.classifier.on_failure, FailurePolicy::Hold);
        assert_eq!(cfg.classifier.interval_ms, 250);
        assert_eq!(cfg.classifier.background_label, 1);
        assert_eq!(cfg.front_end.ns_mode, NoiseSuppressionMode::Soft);
        assert_eq!(cfg.audio.window_capacity, 16_000);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.audio.input_device = Some("USB Mic".into());
        cfg.workers.feed_core = None;
        cfg.notify.enabled = true;
        cfg.notify.url = "http://broker.local/publish".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.audio.input_device.as_deref(), Some("USB Mic"));
        assert_eq!(loaded.workers.feed_core, None);
        assert!(loaded.notify.enabled);
        assert_eq!(loaded.notify.url, "http://broker.local/publish");
    }

    #[test]
    fn validate_rejects_equal_labels() {
        let mut cfg = AppConfig::default();
        cfg.classifier.background_label = cfg.classifier.primary_label;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_window() {
        let mut cfg = AppConfig::default();
        cfg.audio.window_capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_backoff() {
        let mut cfg = AppConfig::default();
        cfg.workers.backoff_min_ms = 500;
        cfg.workers.backoff_max_ms = 10;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_backoff_min() {
        let mut cfg = AppConfig::default();
        cfg.workers.backoff_min_ms = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("backoff_min_ms"));
    }
}
