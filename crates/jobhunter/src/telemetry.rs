//! Logging setup.
//!
//! Library code emits `tracing` events (queue) and `log` records (stores).
//! `init_logging` routes both into a single `tracing-subscriber` pipeline.

use tracing_log::LogTracer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::LoggingError;

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. Returns an error when a
/// logger or subscriber has already been installed for this process.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(&config.level)?;

    LogTracer::init().map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
    } else {
        tracing::subscriber::set_global_default(registry.with(fmt::layer().with_target(true)))
    };

    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

fn build_filter(fallback: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(fallback).map_err(|e| LoggingError::InvalidFilter {
        filter: fallback.to_string(),
        reason: e.to_string(),
    })
}
