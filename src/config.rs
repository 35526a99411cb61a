//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the retrieval engine, supporting
//! TOML files and environment variables with validation and type-safe access
//! to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (highest priority)
//! 2. Configuration files
//! 3. Default values (lowest priority)
//!
//! The defaults target the public ArianeWeb endpoints of conseil-etat.fr and
//! its observed politeness constraints (50 results per page, 300 ms between
//! content requests).

use crate::errors::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote endpoint configuration
    pub api: ApiConfig,
    /// Retrieval pipeline settings
    pub retrieval: RetrievalConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Remote endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Search endpoint (form-encoded POST)
    pub search_url: String,
    /// Document-content endpoint (JSON POST)
    pub content_url: String,
    /// Base of derived canonical decision URLs
    pub canonical_base: String,
    /// Referer header sent with every request
    pub referer: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

/// Retrieval pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Fixed page size for search pagination
    pub page_size: usize,
    /// Politeness delay between consecutive document fetches (ms)
    pub request_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| RetrievalError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| RetrievalError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("ARIANE_SEARCH_URL") {
            self.api.search_url = url;
        }
        if let Ok(url) = std::env::var("ARIANE_CONTENT_URL") {
            self.api.content_url = url;
        }
        if let Ok(delay) = std::env::var("ARIANE_REQUEST_DELAY_MS") {
            self.retrieval.request_delay_ms =
                delay.parse().map_err(|_| RetrievalError::Config {
                    message: "Invalid value in ARIANE_REQUEST_DELAY_MS".to_string(),
                })?;
        }
        if let Ok(level) = std::env::var("ARIANE_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.retrieval.page_size == 0 {
            return Err(RetrievalError::Config {
                message: "retrieval.page_size cannot be zero".to_string(),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(RetrievalError::Config {
                message: "api.timeout_seconds cannot be zero".to_string(),
            });
        }

        for (field, value) in [
            ("api.search_url", &self.api.search_url),
            ("api.content_url", &self.api.content_url),
            ("api.canonical_base", &self.api.canonical_base),
        ] {
            if value.is_empty() {
                return Err(RetrievalError::Config {
                    message: format!("{field} cannot be empty"),
                });
            }
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RetrievalError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            retrieval: RetrievalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.conseil-etat.fr/xsearch?type=json".to_string(),
            content_url:
                "https://www.conseil-etat.fr/plugin?plugin=Service.callXdownloadAW&action=Search"
                    .to_string(),
            canonical_base: "https://www.conseil-etat.fr/fr/arianeweb".to_string(),
            referer: "https://www.conseil-etat.fr/arianeweb/".to_string(),
            user_agent: "ariane-retrieval/0.1".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            request_delay_ms: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.page_size, 50);
        assert_eq!(config.retrieval.request_delay_ms, 300);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut config = Config::default();
        config.retrieval.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("[retrieval]\npage_size = 10\n").unwrap();
        assert_eq!(config.retrieval.page_size, 10);
        assert_eq!(config.retrieval.request_delay_ms, 300);
        assert!(config.api.search_url.contains("conseil-etat.fr"));
    }
}
