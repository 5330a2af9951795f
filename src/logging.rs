//! tracing subscriber setup

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;

const LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Filter directive for the crate's own spans and events
pub fn filter_directive(level: &str) -> String {
    let level = match level.trim().to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        other if LEVELS.contains(&other) => other.to_string(),
        _ => "warn".to_string(),
    };
    format!("awstools={level}")
}

/// Install the global subscriber: stderr always, plus the log file if set
#[cfg(not(tarpaulin_include))]
pub fn init(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_new(filter_directive(&config.log_level))
        .context("Invalid log filter")?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.color)
        .with_target(false);

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")
}
