//! Configuration loading, validation, and management for SurveyAssist.
//!
//! Loads configuration from `~/.surveyassist/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.surveyassist/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Answer evaluation settings
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Question introduction settings
    #[serde(default)]
    pub introduction: IntroductionConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}

const REDACTED: &str = "[REDACTED]";

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => REDACTED,
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("gateway", &self.gateway)
            .field("evaluation", &self.evaluation)
            .field("introduction", &self.introduction)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Include field-level validation issues in 400 responses.
    /// Leave off in production to avoid leaking request schema details.
    #[serde(default)]
    pub expose_error_details: bool,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// CORS origins; empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_body_bytes() -> usize {
    256 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            expose_error_details: false,
            max_body_bytes: default_max_body_bytes(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Settings for the blocking, schema-constrained evaluation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_model")]
    pub model: String,

    /// Kept low: the verdict gates survey flow.
    #[serde(default = "default_evaluation_temperature")]
    pub temperature: f32,

    /// Overall budget for the model call; exceeding it yields the fallback verdict.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Language all respondent-facing feedback is written in.
    #[serde(default = "default_output_language")]
    pub output_language: String,
}

fn default_evaluation_temperature() -> f32 {
    0.2
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_output_language() -> String {
    "English".into()
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_evaluation_temperature(),
            timeout_secs: default_timeout_secs(),
            output_language: default_output_language(),
        }
    }
}

/// Settings for the streamed question introduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntroductionConfig {
    #[serde(default = "default_model")]
    pub model: String,

    /// Models a client may request instead of `model`.
    #[serde(default = "default_allowed_models")]
    pub allowed_models: Vec<String>,

    #[serde(default = "default_introduction_temperature")]
    pub temperature: f32,

    #[serde(default = "default_introduction_max_tokens")]
    pub max_tokens: u32,
}

fn default_allowed_models() -> Vec<String> {
    vec!["gpt-4o-mini".into(), "gpt-4o".into(), "gpt-4.1-mini".into()]
}
fn default_introduction_temperature() -> f32 {
    0.7
}
fn default_introduction_max_tokens() -> u32 {
    150
}

impl Default for IntroductionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            allowed_models: default_allowed_models(),
            temperature: default_introduction_temperature(),
            max_tokens: default_introduction_max_tokens(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.surveyassist/config.toml).
    ///
    /// Also checks environment variables:
    /// - `SURVEYASSIST_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `SURVEYASSIST_PROVIDER`
    /// - `SURVEYASSIST_EXPOSE_ERRORS` (`1`/`true` to expose validation details)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("SURVEYASSIST_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(provider) = lookup("SURVEYASSIST_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(flag) = lookup("SURVEYASSIST_EXPOSE_ERRORS") {
            self.gateway.expose_error_details = matches!(flag.trim(), "1" | "true" | "yes");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".surveyassist")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.evaluation.temperature) {
            return Err(ConfigError::ValidationError(
                "evaluation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.introduction.temperature) {
            return Err(ConfigError::ValidationError(
                "introduction.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.evaluation.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "evaluation.timeout_secs must be > 0".into(),
            ));
        }

        if self.introduction.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "introduction.max_tokens must be > 0".into(),
            ));
        }

        if !self
            .introduction
            .allowed_models
            .iter()
            .any(|m| m == &self.introduction.model)
        {
            return Err(ConfigError::ValidationError(format!(
                "introduction.model '{}' is not listed in introduction.allowed_models",
                self.introduction.model
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// A copy with every API key replaced by a placeholder, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.api_key.is_some() {
            config.api_key = Some(REDACTED.into());
        }
        for provider in config.providers.values_mut() {
            if provider.api_key.is_some() {
                provider.api_key = Some(REDACTED.into());
            }
        }
        config
    }

    /// Generate a default config TOML string (for `config --init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            gateway: GatewayConfig::default(),
            evaluation: EvaluationConfig::default(),
            introduction: IntroductionConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.gateway.port, 8787);
        assert!(!config.gateway.expose_error_details);
        assert_eq!(config.evaluation.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.introduction.allowed_models, config.introduction.allowed_models);
    }

    #[test]
    fn redacted_hides_every_key() {
        let mut config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "groq".into(),
            ProviderConfig {
                api_key: Some("gsk-secret".into()),
                api_url: None,
            },
        );

        let shown = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(!shown.contains("secret"));
        assert!(shown.contains("[REDACTED]"));
        assert_eq!(config.api_key.as_deref(), Some("sk-secret"));
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.evaluation.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn introduction_model_must_be_allowed() {
        let mut config = AppConfig::default();
        config.introduction.model = "some-unlisted-model".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("allowed_models"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.evaluation.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.default_provider, "openai");
    }

    #[test]
    fn load_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_provider = "openrouter"

[evaluation]
model = "gpt-4o"
timeout_secs = 10

[providers.openrouter]
api_url = "https://openrouter.ai/api/v1"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_provider, "openrouter");
        assert_eq!(config.evaluation.model, "gpt-4o");
        assert_eq!(config.evaluation.timeout_secs, 10);
        // Unspecified fields fall back to defaults
        assert!((config.evaluation.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.introduction.max_tokens, 150);
        assert!(config.providers.contains_key("openrouter"));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "gateway = [not toml").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| match key {
            "OPENAI_API_KEY" => Some("sk-env".into()),
            "SURVEYASSIST_PROVIDER" => Some("openrouter".into()),
            "SURVEYASSIST_EXPOSE_ERRORS" => Some("true".into()),
            _ => None,
        });
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.default_provider, "openrouter");
        assert!(config.gateway.expose_error_details);
    }

    #[test]
    fn config_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("sk-file".into()),
            ..AppConfig::default()
        };
        config.apply_env_overrides(|key| (key == "SURVEYASSIST_API_KEY").then(|| "sk-env".into()));
        assert_eq!(config.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("openai"));
        assert!(toml_str.contains("8787"));
    }
}
