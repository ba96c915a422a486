//! Configuration loading, validation, and management for expertkit.
//!
//! Loads configuration from `~/.expertkit/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.expertkit/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider endpoint settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Model settings for the field-mapping expert
    #[serde(default = "ExpertProfile::mapping", deserialize_with = "mapping_profile")]
    pub mapping: ExpertProfile,

    /// Model settings for the code-generating expert
    #[serde(default = "ExpertProfile::transform", deserialize_with = "transform_profile")]
    pub transform: ExpertProfile,

    /// Inference engine settings
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Generated-artifact sandbox settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Validate-and-retry settings
    #[serde(default)]
    pub correction: CorrectionConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("mapping", &self.mapping)
            .field("transform", &self.transform)
            .field("inference", &self.inference)
            .field("validation", &self.validation)
            .field("correction", &self.correction)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout; 0 disables it
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider_name() -> String {
    "openai".into()
}
fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_request_timeout() -> u64 {
    300
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Model, sampling and output budget for one expert.
///
/// Fields missing from a `[mapping]` or `[transform]` section fall back to
/// that section's own profile, not to a shared default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpertProfile {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// The fields a config file actually sets for one profile.
#[derive(Deserialize)]
struct ProfileOverrides {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ProfileOverrides {
    fn over(self, base: ExpertProfile) -> ExpertProfile {
        ExpertProfile {
            model: self.model.unwrap_or(base.model),
            temperature: self.temperature.unwrap_or(base.temperature),
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
        }
    }
}

fn mapping_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ExpertProfile, D::Error> {
    Ok(ProfileOverrides::deserialize(deserializer)?.over(ExpertProfile::mapping()))
}

fn transform_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ExpertProfile, D::Error> {
    Ok(ProfileOverrides::deserialize(deserializer)?.over(ExpertProfile::transform()))
}

fn default_model() -> String {
    "gpt-4o".into()
}
fn default_max_tokens() -> u32 {
    16_000
}

impl ExpertProfile {
    /// Open-ended analysis: sampled at temperature 1.0.
    pub fn mapping() -> Self {
        Self {
            model: default_model(),
            temperature: 1.0,
            max_tokens: default_max_tokens(),
        }
    }

    /// Deterministic code generation: temperature 0.0.
    pub fn transform() -> Self {
        Self {
            model: default_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Ceiling on concurrent invocations per batch; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Export the generated artifact must provide
    #[serde(default = "default_entry_point")]
    pub entry_point: String,

    #[serde(default = "default_max_fuel")]
    pub max_fuel: u64,

    #[serde(default = "default_max_memory")]
    pub max_memory_bytes: usize,
}

fn default_entry_point() -> String {
    "transform".into()
}
fn default_max_fuel() -> u64 {
    100_000_000
}
fn default_max_memory() -> usize {
    16 * 1024 * 1024 // 16 MiB
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            entry_point: default_entry_point(),
            max_fuel: default_max_fuel(),
            max_memory_bytes: default_max_memory(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

fn default_max_attempts() -> usize {
    3
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.expertkit/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `EXPERTKIT_API_KEY`, then `OPENAI_API_KEY` (only if no key is configured)
    /// - `EXPERTKIT_API_URL`
    /// - `EXPERTKIT_MODEL` (applies to both experts)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
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

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("EXPERTKIT_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(url) = lookup("EXPERTKIT_API_URL") {
            self.provider.api_url = url;
        }

        if let Some(model) = lookup("EXPERTKIT_MODEL") {
            self.mapping.model = model.clone();
            self.transform.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".expertkit")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, profile) in [("mapping", &self.mapping), ("transform", &self.transform)] {
            if !(0.0..=2.0).contains(&profile.temperature) {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.temperature must be between 0.0 and 2.0"
                )));
            }
            if profile.model.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{name}.model must not be empty")));
            }
        }

        if self.inference.max_concurrency == Some(0) {
            return Err(ConfigError::ValidationError(
                "inference.max_concurrency must be > 0 when set".into(),
            ));
        }

        if self.validation.entry_point.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "validation.entry_point must not be empty".into(),
            ));
        }

        if self.validation.max_fuel == 0 {
            return Err(ConfigError::ValidationError("validation.max_fuel must be > 0".into()));
        }

        if self.correction.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "correction.max_attempts must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            mapping: ExpertProfile::mapping(),
            transform: ExpertProfile::transform(),
            inference: InferenceConfig::default(),
            validation: ValidationConfig::default(),
            correction: CorrectionConfig::default(),
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
