//! Tracing subscriber setup shared by the workspace binaries.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config;

/// Installs the global subscriber: a daily-rolling file layer under `log_dir`
/// and, when `LOG_TO_STDOUT=true`, a colored stdout layer.
///
/// The filter is taken from the `LOG_LEVEL` environment variable and falls back
/// to the configured default. Keep the returned guard alive for the lifetime of
/// the process, otherwise buffered file output is lost.
pub fn init_logging(log_dir: impl AsRef<Path>, log_file: &str) -> WorkerGuard {
    let log_dir = log_dir.as_ref();
    fs::create_dir_all(log_dir).ok();

    let file_appender = rolling::daily(log_dir, log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(true);

    let env_filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(config::log_level()));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config::log_to_stdout() {
        registry.with(stdout_layer).init();
    } else {
        registry.init();
    }

    guard
}
