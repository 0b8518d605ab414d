//! Configuration module for the cry monitor.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each pipeline
//! stage, `AppPaths` for the platform config directory, and TOML persistence
//! via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, AudioConfig, ClassifierConfig, FailurePolicy, FrontEndConfig, NoiseSuppressionMode,
    NotifyConfig, TelemetryConfig, WorkerConfig,
};
