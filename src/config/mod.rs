//! Configuration loading and management
//!
//! Configuration comes from a YAML file (path in `ZIPLY_CONFIG`,
//! default `ziply.yaml`); a missing file falls back to defaults so the
//! service runs out of the box. `ZIPLY_HOST` and `ZIPLY_PORT` override
//! the file for containerized deployments.

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Event bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast channel capacity; slow WebSocket receivers lag past it
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// CORS configuration for the dashboard clients
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origin allowed to call the API; `None` means permissive
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_channel_capacity() -> usize {
    1024
}

impl AppConfig {
    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Load from `ZIPLY_CONFIG` (default `ziply.yaml`), falling back to
    /// defaults when the file does not exist, then apply env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("ZIPLY_CONFIG").unwrap_or_else(|_| "ziply.yaml".to_string());
        let mut config = if std::path::Path::new(&path).exists() {
            Self::from_yaml_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("ZIPLY_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ZIPLY_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "ZIPLY_PORT".to_string(),
                value: port,
            })?;
        }
        Ok(())
    }

    /// The socket address to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
