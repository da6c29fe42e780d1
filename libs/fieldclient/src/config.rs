//! Client configuration, loaded from YAML with the admin password taken from
//! the environment so it never lands in a config file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable holding the Tournament Manager admin password.
pub const PASSWORD_ENV_VAR: &str = "TM_ADMIN_PASSWORD";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Field-control client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldControlConfig {
    pub server: ServerConfig,
    pub field_set: FieldSetConfig,

    /// Bounded wait for the server's first notice after the handshake.
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Admin password from the environment (not in YAML).
    #[serde(skip)]
    pub admin_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host or host:port of the Tournament Manager server.
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSetConfig {
    /// Field-set id to connect to; the server numbers them from 1.
    pub id: u32,
}

fn default_handshake_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl FieldControlConfig {
    /// Load from a YAML file, pulling the admin password from
    /// [`PASSWORD_ENV_VAR`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: FieldControlConfig = serde_yaml::from_str(&contents)?;

        config.admin_password = std::env::var(PASSWORD_ENV_VAR)
            .map_err(|_| ConfigError::EnvVarMissing(PASSWORD_ENV_VAR.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.address.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.address must not be empty".into(),
            ));
        }
        if self.field_set.id == 0 {
            return Err(ConfigError::ValidationError(
                "field_set.id must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> FieldControlConfig {
        FieldControlConfig {
            server: ServerConfig {
                address: "192.168.1.30".into(),
            },
            field_set: FieldSetConfig { id: 1 },
            handshake_timeout_secs: default_handshake_timeout_secs(),
            log_level: default_log_level(),
            admin_password: "pw".into(),
        }
    }

    #[test]
    fn yaml_parses_with_defaults() {
        let yaml = "server:\n  address: 10.0.0.5:80\nfield_set:\n  id: 2\n";
        let config: FieldControlConfig = serde_yaml::from_str(yaml).expect("yaml");

        assert_eq!(config.server.address, "10.0.0.5:80");
        assert_eq!(config.field_set.id, 2);
        assert_eq!(config.handshake_timeout_secs, 10);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn validation_rejects_empty_address() {
        let mut config = base_config();
        config.server.address = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn validation_rejects_field_set_zero() {
        let mut config = base_config();
        config.field_set.id = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
