//! Logging initialization for the CLI
//!
//! Human-readable or JSON output to stderr, optional rotating log file, and
//! `RUST_LOG` overrides.

use std::fs;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Keeps the non-blocking file writer flushing. Hold it until exit.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let subscriber = tracing_subscriber::registry().with(build_env_filter(config));

    let file_guard = if config.json {
        let console_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stderr);

        if config.file_enabled {
            let (file_appender, guard) = create_file_appender(config)?;
            let file_layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(file_appender);
            subscriber.with(console_layer).with(file_layer).init();
            Some(guard)
        } else {
            subscriber.with(console_layer).init();
            None
        }
    } else {
        let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

        if config.file_enabled {
            let (file_appender, guard) = create_file_appender(config)?;
            let file_layer = fmt::layer()
                .with_target(true)
                .with_ansi(false) // No ANSI colors in files
                .with_writer(file_appender);
            subscriber.with(console_layer).with(file_layer).init();
            Some(guard)
        } else {
            subscriber.with(console_layer).init();
            None
        }
    };

    tracing::debug!(level = %config.level, json = config.json, "Logging initialized");

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "conceptpubsub={},conceptpubsub_core={},conceptpubsub_postgres={},sqlx=warn",
            config.level, config.level, config.level
        ))
    })
}

fn create_file_appender(
    config: &LoggingConfig,
) -> anyhow::Result<(
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
)> {
    fs::create_dir_all(&config.file_directory)?;

    let file_appender = match config.file_rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.file_directory, &config.file_prefix),
        "minutely" => {
            tracing_appender::rolling::minutely(&config.file_directory, &config.file_prefix)
        }
        "never" => tracing_appender::rolling::never(
            &config.file_directory,
            format!("{}.log", config.file_prefix),
        ),
        _ => tracing_appender::rolling::daily(&config.file_directory, &config.file_prefix),
    };

    Ok(tracing_appender::non_blocking(file_appender))
}
