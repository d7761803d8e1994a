//! # Polyjob Configuration
//!
//! Layered configuration for the job queue: serde defaults, then an optional
//! TOML file, then an environment-specific TOML overlay, then `POLYJOB_*`
//! environment variables, then `DATABASE_URL`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use polyjob_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let tick = manager.config().scheduler.tick_interval();
//! let batch = manager.config().scheduler.batch_size;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolyjobConfig {
    /// Job store connection settings
    pub database: DatabaseConfig,

    /// Claim and dispatch loop settings
    pub scheduler: SchedulerConfig,

    /// Tracing subscriber settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/polyjob_development".to_string(),
            max_connections: 10,
            acquire_timeout_seconds: 30,
            run_migrations: true,
        }
    }
}

/// How the jobs of one claimed batch are processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    Sequential,
    Concurrent,
}

impl Default for DispatchMode {
    fn default() -> Self {
        Self::Sequential
    }
}

/// Which terminal status policy the dispatcher uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomePolicy {
    /// Success when the handler completed, Failed otherwise
    Result,
    /// Random Success/Failed for completed jobs (demo placeholder)
    Random,
}

impl Default for OutcomePolicy {
    fn default() -> Self {
        Self::Result
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub tick_interval_ms: u64,
    /// Jobs claimed per tick
    pub batch_size: usize,
    /// Upper bound for any single claim, whatever the caller asks for
    pub max_batch_size: usize,
    pub dispatch_mode: DispatchMode,
    pub outcome_policy: OutcomePolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_ms: 5_000,
            batch_size: 5,
            max_batch_size: 100,
            dispatch_mode: DispatchMode::Sequential,
            outcome_policy: OutcomePolicy::Result,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive such as `info` or `polyjob_core=debug`
    pub level: Option<String>,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl PolyjobConfig {
    /// Reject values the scheduler cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "database.url",
                String::new(),
                "database url must not be empty",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0".to_string(),
                "at least one connection is required",
            ));
        }
        if self.scheduler.tick_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.tick_interval_ms",
                "0".to_string(),
                "tick interval must be positive",
            ));
        }
        if self.scheduler.batch_size == 0 || self.scheduler.max_batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.batch_size",
                self.scheduler.batch_size.to_string(),
                "batch sizes must be positive",
            ));
        }
        if self.scheduler.batch_size > self.scheduler.max_batch_size {
            return Err(ConfigurationError::invalid_value(
                "scheduler.batch_size",
                self.scheduler.batch_size.to_string(),
                format!(
                    "batch_size exceeds max_batch_size ({})",
                    self.scheduler.max_batch_size
                ),
            ));
        }
        Ok(())
    }
}
