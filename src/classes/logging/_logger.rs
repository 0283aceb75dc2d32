use std::{io, str::FromStr};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{format::FmtSpan, layer},
    layer::SubscriberExt,
    registry,
    util::SubscriberInitExt,
    Layer,
};

use crate::{base_libs::_errors::ConfigError, classes::config::_config::LoggingConfig};

fn parse_level(level: &str) -> Result<LevelFilter, ConfigError> {
    LevelFilter::from_str(level).map_err(|_| ConfigError::InvalidLevel(level.to_string()))
}

/// Installs the global subscriber: stderr always, plus a log file when a
/// directory is configured.
///
/// Keep the returned guard alive for as long as file logging should flush.
pub fn setup_logger(config: &LoggingConfig) -> Result<Option<WorkerGuard>, ConfigError> {
    // Console output owns stdout, so the terminal layer writes to stderr
    let stdio_layer = layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(parse_level(&config.stdout_level)?);

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::never(directory, &config.file_name);
            let (writer, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = layer()
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_target(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(parse_level(&config.file_level)?);

            (Some(file_layer), Some(guard))
        }
        None => (None, None),
    };

    registry()
        .with(stdio_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::Logger(e.to_string()))?;

    if let Some(directory) = &config.directory {
        tracing::info!(
            "[INIT] Logger initialized, {} and above to {}/{}",
            config.file_level,
            directory,
            config.file_name
        );
    }

    Ok(guard)
}
