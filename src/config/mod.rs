//! Configuration module for Blobwritr
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::writer::{DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE};

mod loader;

pub use loader::ConfigLoader;

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_http_url(&self.endpoint.url) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid endpoint URL '{}': must start with http:// or https://",
                self.endpoint.url
            )));
        }

        if self.upload.chunk_size == 0 || self.upload.chunk_size % MIN_CHUNK_SIZE != 0 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid chunk_size {}: must be a positive multiple of {} bytes",
                self.upload.chunk_size, MIN_CHUNK_SIZE
            )));
        }

        Ok(())
    }
}

/// Storage endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the storage endpoint. Supports ${VAR} and
    /// ${VAR:-default} expansion.
    pub url: String,
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Chunk size in bytes; must be a positive multiple of 256 KiB.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token presented on session open. Supports ${VAR} and
    /// ${VAR:-default} expansion.
    #[serde(default)]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, chunk_size: usize) -> Config {
        Config {
            endpoint: EndpointConfig { url: url.into() },
            upload: UploadConfig { chunk_size },
            auth: AuthConfig::default(),
        }
    }

    #[test]
    fn test_default_upload_config() {
        let upload = UploadConfig::default();
        assert_eq!(upload.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_config_validation_bad_endpoint() {
        let config = config("storage.example.com", DEFAULT_CHUNK_SIZE);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_chunk_size() {
        assert!(config("https://storage.example.com", 0).validate().is_err());
        assert!(config("https://storage.example.com", MIN_CHUNK_SIZE + 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_config_validation_ok() {
        let config = config("https://storage.example.com", 4 * MIN_CHUNK_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
endpoint:
  url: "https://storage.example.com"
"#,
        )
        .unwrap();

        assert_eq!(config.upload.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(config.auth.token.is_none());
        assert!(config.validate().is_ok());
    }
}
