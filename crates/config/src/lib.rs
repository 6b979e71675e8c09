//! Configuration loading, validation, and management for Fieldhand.
//!
//! Loads configuration from `~/.fieldhand/config.toml`, then a `.env` file
//! in the working directory, then environment variable overrides. Validates
//! all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.fieldhand/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the completion provider (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion provider: "openai", "azure", "openrouter", "ollama", or a
    /// key of `providers`
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name (or Azure deployment name)
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature; kept at zero so step parsing stays reliable
    #[serde(default)]
    pub temperature: f32,

    /// Max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Farm database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Weather lookup settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Chart output settings
    #[serde(default)]
    pub charts: ChartConfig,

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
fn default_max_tokens() -> u32 {
    1024
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
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("agent", &self.agent)
            .field("database", &self.database)
            .field("weather", &self.weather)
            .field("charts", &self.charts)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .finish()
    }
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("units", &self.units)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard cap on tool invocations per request
    #[serde(default = "default_tool_call_limit")]
    pub tool_call_limit: usize,

    /// Wall-clock budget for one request, enforced by the caller
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Replace the built-in instructions with the contents of this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions_override: Option<PathBuf>,
}

fn default_tool_call_limit() -> usize {
    10
}
fn default_request_timeout() -> u64 {
    120
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            tool_call_limit: default_tool_call_limit(),
            request_timeout_secs: default_request_timeout(),
            instructions_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "farm_management.db".into()
}
fn default_max_connections() -> u32 {
    4
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_weather_url")]
    pub base_url: String,

    #[serde(default = "default_units")]
    pub units: String,
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".into()
}
fn default_units() -> String {
    "metric".into()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_url(),
            units: default_units(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_dir")]
    pub output_dir: PathBuf,
}

fn default_chart_dir() -> PathBuf {
    PathBuf::from("temp")
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            output_dir: default_chart_dir(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Azure only: `api-version` query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Azure only: deployment name (defaults to `model`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.fieldhand/config.toml).
    ///
    /// A `.env` file in the working directory is read first, so its values
    /// take part in the environment overrides:
    /// - `FIELDHAND_API_KEY`, then `AZURE_OPENAI_API_KEY`, then `OPENAI_API_KEY`
    /// - `FIELDHAND_PROVIDER`, `FIELDHAND_MODEL`, `FIELDHAND_DB_PATH`
    /// - `AZURE_OPENAI_API_BASE`, `AZURE_OPENAI_API_VERSION`,
    ///   `AZURE_OPENAI_DEPLOYMENT_NAME`
    /// - `OPENWEATHERMAP_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
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

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("FIELDHAND_API_KEY")
                .or_else(|| lookup("AZURE_OPENAI_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(endpoint) = lookup("AZURE_OPENAI_API_BASE") {
            let azure = self.providers.entry("azure".into()).or_default();
            azure.api_url = Some(endpoint);
            if let Some(version) = lookup("AZURE_OPENAI_API_VERSION") {
                azure.api_version = Some(version);
            }
            if let Some(deployment) = lookup("AZURE_OPENAI_DEPLOYMENT_NAME") {
                azure.deployment = Some(deployment);
            }
            // An Azure endpoint in the environment selects Azure unless the
            // provider is pinned explicitly.
            if lookup("FIELDHAND_PROVIDER").is_none() {
                self.provider = "azure".into();
            }
        }

        if let Some(provider) = lookup("FIELDHAND_PROVIDER") {
            self.provider = provider;
        }

        if let Some(model) = lookup("FIELDHAND_MODEL") {
            self.model = model;
        }

        if let Some(path) = lookup("FIELDHAND_DB_PATH") {
            self.database.path = path;
        }

        if self.weather.api_key.is_none() {
            self.weather.api_key = lookup("OPENWEATHERMAP_API_KEY");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".fieldhand")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.tool_call_limit == 0 {
            return Err(ConfigError::ValidationError(
                "agent.tool_call_limit must be at least 1".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: default_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            database: DatabaseConfig::default(),
            weather: WeatherConfig::default(),
            charts: ChartConfig::default(),
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
