use crate::error::{Result, SesError};
use crate::rate_limit::{EnvLimit, FixedLimit, LimitSource};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen_addr: String,
}

/// Which storage backend the service runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Environment variable holding the hourly send limit per sender
    #[serde(default = "default_limit_env_var")]
    pub limit_env_var: String,
    /// Pins the hourly limit and ignores the environment when set
    #[serde(default)]
    pub email_limit_per_hour: Option<u32>,
    /// Treat self-cooldowns past their expiry as no longer blocking
    #[serde(default)]
    pub release_expired_cooldowns: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    /// Append logs to this file instead of stdout
    #[serde(default)]
    pub file: Option<String>,
}

fn default_limit_env_var() -> String {
    "EMAIL_LIMIT_PER_HOUR".to_string()
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            limit_env_var: default_limit_env_var(),
            email_limit_per_hour: None,
            release_expired_cooldowns: false,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SesError::Config(e.to_string()))?;

        toml::from_str(&content).map_err(|e| SesError::Config(e.to_string()))
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig {
                listen_addr: "0.0.0.0:8080".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Sqlite,
                database_url: "sqlite://database.db?mode=rwc".to_string(),
            },
            limits: LimitsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
                file: None,
            },
        }
    }

    /// Build the hourly limit source the rate limiter consults on every decision
    pub fn limit_source(&self) -> Arc<dyn LimitSource> {
        match self.limits.email_limit_per_hour {
            Some(limit) => Arc::new(FixedLimit::new(limit)),
            None => Arc::new(EnvLimit::new(self.limits.limit_env_var.clone())),
        }
    }
}
