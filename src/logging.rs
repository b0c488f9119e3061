//! Tracing subscriber setup.
//!
//! Diagnostics always go to stderr because stdout carries the host protocol.

use crate::config::LoggingConfig;
use crate::error::{AlfredError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// File name prefix for the rolling log file.
const LOG_FILE_PREFIX: &str = "alfred.log";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.level`. When `config.file_dir` is set, the
/// returned guard flushes the file writer on drop and must be kept alive.
///
/// # Errors
///
/// Returns [`AlfredError::Config`] if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let Some(dir) = config.file_dir.as_ref() else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|e| AlfredError::Config(format!("cannot install subscriber: {e}")))?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AlfredError::Config(format!("cannot install subscriber: {e}")))?;
    Ok(Some(guard))
}
