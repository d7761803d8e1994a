//! Configuration Loader
//!
//! Environment-aware loading: `<dir>/polyjob.toml`, then
//! `<dir>/polyjob.<environment>.toml`, then `POLYJOB_<SECTION>__<KEY>`
//! variables, then `DATABASE_URL`. Every file is optional.

use ::config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::error::ConfigResult;
use super::PolyjobConfig;

const CONFIG_FILE_STEM: &str = "polyjob";
const ENV_PREFIX: &str = "POLYJOB";

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: PolyjobConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load from a specific directory with an explicit environment name
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let mut config: PolyjobConfig = Self::builder(&config_directory, environment)
            .build()?
            .try_deserialize()?;

        if let Ok(database_url) = env::var("DATABASE_URL") {
            config.database.url = database_url;
        }

        config.validate()?;

        debug!(
            environment = environment,
            tick_interval_ms = config.scheduler.tick_interval_ms,
            batch_size = config.scheduler.batch_size,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Parse a single TOML document on top of the defaults, ignoring the process environment
    pub fn from_toml_str(contents: &str) -> ConfigResult<PolyjobConfig> {
        let config: PolyjobConfig = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn builder(
        config_directory: &Path,
        environment: &str,
    ) -> ::config::ConfigBuilder<::config::builder::DefaultState> {
        let base = config_directory.join(format!("{CONFIG_FILE_STEM}.toml"));
        let overlay = config_directory.join(format!("{CONFIG_FILE_STEM}.{environment}.toml"));

        Config::builder()
            .add_source(File::from(base).format(FileFormat::Toml).required(false))
            .add_source(File::from(overlay).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
    }

    pub fn config(&self) -> &PolyjobConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Current environment from `POLYJOB_ENV`, falling back to `APP_ENV`
    pub fn detect_environment() -> String {
        env::var("POLYJOB_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }
}
