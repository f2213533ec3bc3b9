//! Logging Initialization
//!
//! Routes the `log` facade used throughout the library into `tracing`:
//! - Pretty human-readable output on stderr (stdout carries lesson JSON)
//! - Optional JSON file log with daily rotation (tracing-appender)
//! - `RUST_LOG` overrides the configured level

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// File name prefix of the rolling log.
pub const LOG_FILE_NAME: &str = "tandem-lessons.log";

/// Initialize the global subscriber.
///
/// Returns the file writer guard when a log directory is configured; it must
/// be held for the lifetime of the program or buffered lines are lost.
/// Calling this twice is harmless: the second install is ignored.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    // 1. Optional file layer (JSON, daily rolling)
    let (file_layer, guard) = match config.log_dir.as_deref().and_then(prepare_log_dir) {
        Some(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .json()
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(true)
                .with_filter(env_filter(&config.level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // 2. Console layer
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .pretty()
        .with_filter(env_filter(&config.level));

    // 3. Registry
    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Logging already initialized: {}", e);
        return guard;
    }

    // 4. Redirect standard `log` macros to `tracing`
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize LogTracer: {}", e);
    }

    if let Some(dir) = &config.log_dir {
        log::info!(
            "Logging initialized. Writing to: {:?} (daily rolling)",
            dir.join(LOG_FILE_NAME)
        );
    }

    guard
}

/// Filter from `RUST_LOG`, falling back to `level`, then to `info`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn prepare_log_dir(dir: &Path) -> Option<PathBuf> {
    if !dir.exists() {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("Failed to create logs directory {}: {}", dir.display(), e);
            return None;
        }
    }
    Some(dir.to_path_buf())
}
