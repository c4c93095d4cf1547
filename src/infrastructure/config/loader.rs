use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::RunConfig;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_concurrent_analysis_units: {0}. Must be between 1 and 20")]
    InvalidConcurrencyCeiling(usize),

    #[error("Invalid max_supervisor_iterations: {0}. Cannot be 0")]
    InvalidSupervisorIterations(u32),

    #[error("Invalid max_unit_tool_calls: {0}. Cannot be 0")]
    InvalidUnitToolCalls(u32),

    #[error("Invalid max_structured_output_retries: {0}. Cannot be 0")]
    InvalidStructuredRetries(u32),

    #[error("Model id for {0} cannot be empty")]
    EmptyModelId(&'static str),

    #[error("Invalid max_output_tokens for {0}: cannot be 0")]
    InvalidMaxOutputTokens(&'static str),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .blueprint/config.yaml (project config, optional)
    /// 3. Environment variables (`BLUEPRINT_*` prefix, highest priority)
    pub fn load() -> Result<RunConfig> {
        let config: RunConfig = Figment::new()
            .merge(Serialized::defaults(RunConfig::default()))
            .merge(Yaml::file(".blueprint/config.yaml"))
            .merge(Env::prefixed("BLUEPRINT_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, with environment overrides.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<RunConfig> {
        let config: RunConfig = Figment::new()
            .merge(Serialized::defaults(RunConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("BLUEPRINT_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &RunConfig) -> Result<(), ConfigError> {
        if config.max_concurrent_analysis_units == 0 || config.max_concurrent_analysis_units > 20 {
            return Err(ConfigError::InvalidConcurrencyCeiling(
                config.max_concurrent_analysis_units,
            ));
        }

        if config.max_supervisor_iterations == 0 {
            return Err(ConfigError::InvalidSupervisorIterations(
                config.max_supervisor_iterations,
            ));
        }

        if config.max_unit_tool_calls == 0 {
            return Err(ConfigError::InvalidUnitToolCalls(config.max_unit_tool_calls));
        }

        if config.max_structured_output_retries == 0 {
            return Err(ConfigError::InvalidStructuredRetries(
                config.max_structured_output_retries,
            ));
        }

        for (section, model) in [
            ("analysis_model", &config.analysis_model),
            ("compression_model", &config.compression_model),
            ("synthesis_model", &config.synthesis_model),
        ] {
            if model.id.is_empty() {
                return Err(ConfigError::EmptyModelId(section));
            }
            if model.max_output_tokens == 0 {
                return Err(ConfigError::InvalidMaxOutputTokens(section));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RunConfig::default();
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
max_concurrent_analysis_units: 3
max_supervisor_iterations: 10
analysis_model:
  id: 'anthropic:claude-opus-4'
  max_output_tokens: 4096
github:
  repository: https://github.com/acme/widgets
logging:
  level: debug
  format: pretty
";

        let config: RunConfig = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.max_concurrent_analysis_units, 3);
        assert_eq!(config.max_supervisor_iterations, 10);
        assert_eq!(config.analysis_model.id, "anthropic:claude-opus-4");
        assert_eq!(config.analysis_model.max_output_tokens, 4096);
        assert_eq!(
            config.github.repository.as_deref(),
            Some("https://github.com/acme/widgets")
        );
        assert_eq!(config.logging.level, "debug");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let config = RunConfig {
            max_concurrent_analysis_units: 0,
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidConcurrencyCeiling(0)
        ));
    }

    #[test]
    fn test_validate_excessive_concurrency() {
        let config = RunConfig {
            max_concurrent_analysis_units: 21,
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidConcurrencyCeiling(21)
        ));
    }

    #[test]
    fn test_validate_zero_supervisor_iterations() {
        let config = RunConfig {
            max_supervisor_iterations: 0,
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidSupervisorIterations(0)
        ));
    }

    #[test]
    fn test_validate_empty_model_id() {
        let mut config = RunConfig::default();
        config.compression_model.id = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyModelId("compression_model")
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = RunConfig::default();
        config.logging.level = "verbose".to_string();
        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_hierarchical_merging() {
        use figment::providers::Serialized;
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "max_concurrent_analysis_units: 2\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(
            override_file,
            "max_concurrent_analysis_units: 4\nlogging:\n  level: debug"
        )
        .unwrap();
        override_file.flush().unwrap();

        let config: RunConfig = Figment::new()
            .merge(Serialized::defaults(RunConfig::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.max_concurrent_analysis_units, 4, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }
}
