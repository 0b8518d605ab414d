//! Application entry point: cry monitor.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from the path given as the first argument, or from
//!    the platform settings file (defaults on first run), and validate it.
//! 3. Create the [`tokio`] runtime and spawn the notifier on it.
//! 4. Start the cpal capture stream.
//! 5. Start the `feed` / `detect` / `action` workers and the stats monitor.
//! 6. Block on the notifier for the rest of the process.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use cry_monitor::{
    audio::{AudioCapture, QueueFrontEnd},
    classify::EnergyClassifier,
    config::AppConfig,
    notify::{run_notifier, ChannelSink, HttpPublisher, LogPublisher, Publisher},
    pipeline::{spawn_monitor, Pipeline},
};

fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => AppConfig::load_from(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("cry monitor starting up");

    // 2. Configuration
    let config = load_config()?;

    // 3. Tokio runtime + notifier
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let publisher: Arc<dyn Publisher> = if config.notify.enabled {
        log::info!("Publishing transitions to {}", config.notify.url);
        Arc::new(HttpPublisher::from_config(&config.notify))
    } else {
        Arc::new(LogPublisher)
    };
    let (sink, rx) = ChannelSink::channel(config.notify.channel_capacity);
    let notifier = rt.spawn(run_notifier(rx, publisher, config.notify.topic.clone()));

    // 4. Audio capture (the stream handle must stay alive on this thread)
    let capture = AudioCapture::new(config.audio.input_device.as_deref())
        .context("audio capture unavailable")?;
    let (_stream, reader) = capture
        .start(&config.audio, &config.front_end)
        .context("failed to start audio stream")?;
    log::info!(
        "Audio capture started: {} Hz, {} ch → {} Hz",
        capture.sample_rate(),
        capture.channels(),
        config.audio.sample_rate
    );

    // 5. Pipeline
    let pipeline = Pipeline::new(&config);
    let stats = pipeline.stats();
    stats.log_snapshot(pipeline.window_bytes());

    let front_end = Arc::new(QueueFrontEnd::from_config(&config.front_end, config.audio.sample_rate));
    let classifier = EnergyClassifier::from_config(&config.classifier, config.audio.sample_rate);
    let workers = pipeline.start(reader, front_end, classifier, sink)?;
    let buffer_bytes = workers.buffer_bytes;
    stats.log_snapshot(buffer_bytes);

    if config.telemetry.interval_secs > 0 {
        spawn_monitor(
            Arc::clone(&stats),
            Duration::from_secs(config.telemetry.interval_secs),
            buffer_bytes,
        )
        .context("failed to spawn stats monitor")?;
    }

    // 6. The workers never stop, so the notifier only returns if the
    //    `action` worker dies and drops the sink.
    rt.block_on(notifier).context("notifier task failed")?;
    log::error!("Notification channel closed; shutting down");
    Ok(())
}
