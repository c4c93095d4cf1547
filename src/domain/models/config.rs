use serde::{Deserialize, Serialize};

/// Main configuration structure for a Blueprint run.
///
/// Resolved once per run from layered sources (defaults, config file,
/// environment) and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunConfig {
    /// Maximum retries for structured decision calls (clarification,
    /// brief extraction, supervisor planning)
    #[serde(default = "default_structured_output_retries")]
    pub max_structured_output_retries: u32,

    /// Whether the pipeline may ask the user a clarifying question before
    /// starting analysis
    #[serde(default = "default_allow_clarification")]
    pub allow_clarification: bool,

    /// Maximum number of analyzer units dispatched concurrently in a single
    /// supervisor step (1-20)
    #[serde(default = "default_max_concurrent_analysis_units")]
    pub max_concurrent_analysis_units: usize,

    /// Maximum number of supervisor planning iterations per run
    #[serde(default = "default_max_supervisor_iterations")]
    pub max_supervisor_iterations: u32,

    /// Maximum tool-calling iterations within a single analyzer unit
    #[serde(default = "default_max_unit_tool_calls")]
    pub max_unit_tool_calls: u32,

    /// Model used for planning and repository analysis
    #[serde(default = "default_analysis_model")]
    pub analysis_model: ModelConfig,

    /// Model used for compressing analyzer findings
    #[serde(default = "default_compression_model")]
    pub compression_model: ModelConfig,

    /// Model used for writing the final design document
    #[serde(default = "default_synthesis_model")]
    pub synthesis_model: ModelConfig,

    /// GitHub access configuration
    #[serde(default)]
    pub github: GithubConfig,

    /// API key passed through to the model client
    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_structured_output_retries() -> u32 {
    3
}

const fn default_allow_clarification() -> bool {
    true
}

const fn default_max_concurrent_analysis_units() -> usize {
    6
}

const fn default_max_supervisor_iterations() -> u32 {
    15
}

const fn default_max_unit_tool_calls() -> u32 {
    5
}

fn default_analysis_model() -> ModelConfig {
    ModelConfig {
        id: "anthropic:claude-sonnet-4".to_string(),
        max_output_tokens: 10_000,
    }
}

fn default_compression_model() -> ModelConfig {
    ModelConfig {
        id: "anthropic:claude-3-5-haiku".to_string(),
        max_output_tokens: 8_192,
    }
}

fn default_synthesis_model() -> ModelConfig {
    ModelConfig {
        id: "anthropic:claude-sonnet-4".to_string(),
        max_output_tokens: 10_000,
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_structured_output_retries: default_structured_output_retries(),
            allow_clarification: default_allow_clarification(),
            max_concurrent_analysis_units: default_max_concurrent_analysis_units(),
            max_supervisor_iterations: default_max_supervisor_iterations(),
            max_unit_tool_calls: default_max_unit_tool_calls(),
            analysis_model: default_analysis_model(),
            compression_model: default_compression_model(),
            synthesis_model: default_synthesis_model(),
            github: GithubConfig::default(),
            anthropic_api_key: None,
            logging: LoggingConfig::default(),
        }
    }
}

/// A model selection: provider-prefixed identifier plus output token cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModelConfig {
    /// Provider-prefixed model identifier (e.g. "anthropic:claude-sonnet-4")
    pub id: String,

    /// Maximum output tokens requested per completion
    pub max_output_tokens: u32,
}

/// GitHub access configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GithubConfig {
    /// Repository to analyze, as a URL or "owner/repo" pair
    #[serde(default)]
    pub repository: Option<String>,

    /// Access token for the GitHub REST API
    #[serde(default)]
    pub token: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.max_structured_output_retries, 3);
        assert!(config.allow_clarification);
        assert_eq!(config.max_concurrent_analysis_units, 6);
        assert_eq!(config.max_supervisor_iterations, 15);
        assert_eq!(config.max_unit_tool_calls, 5);
        assert_eq!(config.analysis_model.max_output_tokens, 10_000);
        assert_eq!(config.compression_model.max_output_tokens, 8_192);
        assert!(config.github.repository.is_none());
        assert!(config.github.token.is_none());
    }

    #[test]
    fn test_model_ids_are_provider_prefixed() {
        let config = RunConfig::default();
        assert!(config.analysis_model.id.starts_with("anthropic:"));
        assert!(config.compression_model.id.starts_with("anthropic:"));
        assert!(config.synthesis_model.id.starts_with("anthropic:"));
    }
}
