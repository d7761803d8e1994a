//! # Structured Logging Module
//!
//! Environment-aware `tracing` setup for the scheduler process, plus helpers
//! that give job lifecycle events a uniform shape.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{ConfigManager, LoggingConfig};
use crate::models::{JobId, JobStatus, JobType};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install the global subscriber once; later calls are no-ops
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let directive = resolve_directive(config, &environment);

        let layer = if config.json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        };

        // Embedding hosts may already own the global subscriber
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            filter = %directive,
            json = config.json,
            "Structured logging initialized"
        );
    });
}

/// `RUST_LOG` wins, then the configured level, then the environment default
fn resolve_directive(config: &LoggingConfig, environment: &str) -> String {
    std::env::var("RUST_LOG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| config.level.clone())
        .unwrap_or_else(|| get_log_level(environment).to_string())
}

fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log a job lifecycle event
pub fn log_job_operation(
    operation: &str,
    job_id: JobId,
    job_type: JobType,
    status: JobStatus,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        job_id = %job_id,
        job_type = %job_type,
        status = %status,
        details = details,
        "JOB_OPERATION"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("test"), "debug");
    }

    #[test]
    fn test_configured_level_used_without_rust_log() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: Some("warn".to_string()),
            json: false,
        };
        assert_eq!(resolve_directive(&config, "development"), "warn");
        assert_eq!(resolve_directive(&LoggingConfig::default(), "production"), "info");
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init_structured_logging(&config);
        init_structured_logging(&config);
    }
}
