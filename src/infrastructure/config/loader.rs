use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::adapters::llm::KNOWN_PROVIDERS;
use crate::domain::models::config::{Config, LlmConfig};

/// Project directory holding configuration files.
pub const CONFIG_DIR: &str = ".insight";

/// Prefix for environment overrides; nested keys use `__`.
pub const ENV_PREFIX: &str = "INSIGHT_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_iterations: {0}. Must be at least 1")]
    InvalidMaxIterations(u32),

    #[error("Invalid quality_threshold: {0}. Must be in (0, 1]")]
    InvalidQualityThreshold(f64),

    #[error("Invalid stagnation_delta: {0}. Cannot be negative")]
    InvalidStagnationDelta(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Unknown LLM provider '{provider}' in section '{section}'")]
    UnknownProvider { section: String, provider: String },

    #[error("Request delimiter cannot be empty")]
    EmptyRequestDelimiter,

    #[error("At least one data request is required")]
    NoDataRequests,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .insight/config.yaml (project config)
    /// 3. .insight/local.yaml (local overrides, optional)
    /// 4. Environment variables (INSIGHT_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(Path::new("."))
    }

    /// Same merge as [`ConfigLoader::load`], rooted at `project_dir`.
    pub fn load_from_dir(project_dir: &Path) -> Result<Config> {
        let dir = project_dir.join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file. Environment overrides still apply.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.is_file() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn validate_llm(section: &str, llm: &LlmConfig) -> Result<(), ConfigError> {
        if !KNOWN_PROVIDERS.contains(&llm.provider.as_str()) {
            return Err(ConfigError::UnknownProvider {
                section: section.to_string(),
                provider: llm.provider.clone(),
            });
        }
        if llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(format!(
                "{section}.model cannot be empty"
            )));
        }
        Ok(())
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let iteration = &config.iteration;
        if iteration.max_iterations == 0 {
            return Err(ConfigError::InvalidMaxIterations(iteration.max_iterations));
        }
        if !(iteration.quality_threshold > 0.0 && iteration.quality_threshold <= 1.0) {
            return Err(ConfigError::InvalidQualityThreshold(
                iteration.quality_threshold,
            ));
        }
        if iteration.stagnation_delta.is_nan() || iteration.stagnation_delta < 0.0 {
            return Err(ConfigError::InvalidStagnationDelta(iteration.stagnation_delta));
        }

        // Validate database config
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        // Validate logging config
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Self::validate_llm("synthesis", &config.synthesis)?;
        Self::validate_llm("judge", &config.judge)?;

        // Validate workflow seeding
        if config.workflow.request_delimiter.is_empty() {
            return Err(ConfigError::EmptyRequestDelimiter);
        }
        if config
            .workflow
            .data_requests
            .iter()
            .all(|r| r.trim().is_empty())
        {
            return Err(ConfigError::NoDataRequests);
        }
        if config.workflow.synthesis_timeout_secs == 0 || config.workflow.judge_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "stage timeouts must be at least 1 second".to_string(),
            ));
        }

        if config.reports.output_dir.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "reports.output_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
