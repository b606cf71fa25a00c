use anyhow::Context;
use chrono::Utc;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Logs to a timestamped file under `log_dir` and to stderr, keeping stdout
/// for command output.
pub fn setup_logging(log_level: tracing::Level, log_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    let timestamp_str = Utc::now().format("%Y-%m-%d_%H-%M-%S");
    let log_file_path = log_dir.join(format!("tabular_tools_{}.log", timestamp_str));
    let log_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_file_path)
        .with_context(|| format!("Failed to open log file: {}", log_file_path.display()))?;
    Registry::default()
        .with(LevelFilter::from_level(log_level))
        .with(
            tracing_subscriber::fmt::Layer::default()
                .with_writer(std::sync::Mutex::new(log_file))
                .with_ansi(false),
        )
        .with(tracing_subscriber::fmt::Layer::default().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to install tracing subscriber")?;
    info!("Logging to {}", log_file_path.display());
    Ok(())
}
