//! Tracing setup for the reelvault binary
//!
//! Logs always go to stderr. When a log directory is configured they are also
//! written to a daily rolling `reelvault.log` there.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,reelvault_core=debug";

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the life of the process.
pub fn init_logging(log_dir: Option<&Path>, verbose: bool) -> Option<WorkerGuard> {
    let filter = || {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr_layer)
            .init();
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("[reelvault] Failed to create log directory {:?}: {}", dir, e);
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr_layer)
            .init();
        return None;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "reelvault.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter())
        .with(stderr_layer)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Logging initialized, writing to {:?}", dir);
    Some(guard)
}
