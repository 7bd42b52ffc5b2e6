//! Configuration management

use std::env;

use serde::Deserialize;
use thiserror::Error;

use crate::extract::{ExtractOptions, OutputPolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    pub policy: OutputPolicy,
    /// Request body cap for uploads and ZIP requests
    pub max_upload_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            extract: ExtractConfig {
                policy: OutputPolicy::default(),
                max_upload_bytes: 200 * 1024 * 1024,
            },
        }
    }
}

impl Config {
    /// Read configuration from the environment
    ///
    /// Unset variables take their defaults; set but unparsable ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let port = match lookup("SERVER_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SERVER_PORT",
                value,
            })?,
            None => defaults.server.port,
        };

        let policy = match lookup("EXTRACT_POLICY") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "EXTRACT_POLICY",
                value,
            })?,
            None => defaults.extract.policy,
        };

        let max_upload_bytes = match lookup("MAX_UPLOAD_MB") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|mb| *mb > 0)
                .and_then(|mb| mb.checked_mul(1024 * 1024))
                .ok_or(ConfigError::InvalidValue {
                    key: "MAX_UPLOAD_MB",
                    value,
                })?,
            None => defaults.extract.max_upload_bytes,
        };

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
            },
            extract: ExtractConfig {
                policy,
                max_upload_bytes,
            },
        })
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions::with_policy(self.extract.policy)
    }
}
