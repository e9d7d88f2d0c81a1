use crate::constants::LOG_FILE_NAME;
use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, time::SystemTime},
    prelude::*,
    EnvFilter,
};

/// Default filter: our own events at `info` (`debug` when verbose), the AWS
/// SDK at `warn`. `RUST_LOG` replaces it entirely.
fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("warn,spotter={level}")
}

pub fn setup_logging(verbose: bool, log_dir: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    // stdout carries the report, so logs go to stderr
    let stderr_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_level(true)
        .without_time()
        .with_writer(std::io::stderr);

    let file_layer = log_dir.map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::NEVER, dir, LOG_FILE_NAME);
        fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_timer(SystemTime)
            .with_writer(file_appender)
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    if let Some(dir) = log_dir {
        tracing::debug!("Logging system initialized. Writing to {}/{}", dir, LOG_FILE_NAME);
    }

    Ok(())
}
