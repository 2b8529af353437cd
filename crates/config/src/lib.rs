//! Configuration loading, validation, and management for strata.
//!
//! Loads configuration from `~/.strata/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.strata/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the inference endpoint (unused for local Ollama)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible inference endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Generation model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding model name (for the semantic vault)
    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per generated reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Token budget for the rolling history buffer
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Path to a HuggingFace tokenizer.json for precise counting.
    /// When absent or unloadable, counting degrades to a word heuristic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_file: Option<PathBuf>,

    /// Directory holding the SQLite stores (episodic.db, vault.db)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory scanned by `strata ingest`
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    /// Path to the persona file; defaults to ~/.strata/PERSONA.md
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_file: Option<PathBuf>,
}

fn default_api_url() -> String {
    "http://localhost:11434/v1".into()
}
fn default_model() -> String {
    "llama3.2".into()
}
fn default_embed_model() -> String {
    "nomic-embed-text".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    512
}
fn default_data_dir() -> PathBuf {
    AppConfig::config_dir().join("data")
}
fn default_docs_dir() -> PathBuf {
    AppConfig::config_dir().join("docs")
}

/// Redact a secret string for Debug output.
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
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("embed_model", &self.embed_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("budget", &self.budget)
            .field("tokenizer_file", &self.tokenizer_file)
            .field("data_dir", &self.data_dir)
            .field("docs_dir", &self.docs_dir)
            .field("persona_file", &self.persona_file)
            .finish()
    }
}

/// Token ceiling configuration for the rolling history buffer (Tier 1).
///
/// The effective limit each turn is `base_limit`, plus `reserve` when no
/// Tier 2/3 slot is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    #[serde(default = "default_base_limit")]
    pub base_limit: usize,

    #[serde(default = "default_reserve")]
    pub reserve: usize,
}

fn default_base_limit() -> usize {
    2048
}
fn default_reserve() -> usize {
    512
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            base_limit: default_base_limit(),
            reserve: default_reserve(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.strata/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `STRATA_API_KEY`
    /// - `STRATA_API_URL`
    /// - `STRATA_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("STRATA_API_KEY").ok();
        }

        if let Ok(url) = std::env::var("STRATA_API_URL") {
            config.api_url = url;
        }

        if let Ok(model) = std::env::var("STRATA_MODEL") {
            config.model = model;
        }

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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".strata")
    }

    /// Path of the persona file, falling back to ~/.strata/PERSONA.md.
    pub fn persona_path(&self) -> PathBuf {
        self.persona_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("PERSONA.md"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.budget.base_limit == 0 {
            return Err(ConfigError::ValidationError(
                "budget.base_limit must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            embed_model: default_embed_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            budget: BudgetConfig::default(),
            tokenizer_file: None,
            data_dir: default_data_dir(),
            docs_dir: default_docs_dir(),
            persona_file: None,
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
        assert_eq!(config.api_url, "http://localhost:11434/v1");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.budget.base_limit, 2048);
        assert_eq!(config.budget.reserve, 512);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.budget.base_limit, config.budget.base_limit);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_base_limit_rejected() {
        let config = AppConfig {
            budget: BudgetConfig {
                base_limit: 0,
                reserve: 512,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().model, "llama3.2");
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "model = \"qwen2\"\n[budget]\nbase_limit = 4096\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "qwen2");
        assert_eq!(config.budget.base_limit, 4096);
        // Untouched fields keep their defaults
        assert_eq!(config.budget.reserve, 512);
        assert_eq!(config.api_url, "http://localhost:11434/v1");
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("llama3.2"));
        assert!(toml_str.contains("base_limit"));
    }
}
