use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::loader::ConfigLoader;

// Configuration location constants
pub const CONFIG_DIR_NAME: &str = "rentalhub";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// Environment overrides
pub const ENV_ENVIRONMENT: &str = "RENTALHUB_ENV";
pub const ENV_DATABASE_URL: &str = "RENTALHUB_DATABASE_URL";
pub const ENV_DATABASE_MAX_CONNECTIONS: &str = "RENTALHUB_DATABASE_MAX_CONNECTIONS";
pub const ENV_DEFAULT_TENANT: &str = "RENTALHUB_DEFAULT_TENANT";
pub const ENV_LOG_LEVEL: &str = "RENTALHUB_LOG_LEVEL";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "test" | "testing" => Ok(Environment::Test),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::invalid("environment", other)),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "memory://rentalhub".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenancyConfig {
    /// Tenant used when a request carries none
    pub default_tenant: String,
    /// ISO currency code used by the formatters
    pub currency: String,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            default_tenant: "default".to_string(),
            currency: "EUR".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `rentalhub=debug`
    pub level: String,
    /// `pretty`, `compact` or `json`
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub tenancy: TenancyConfig,
    pub logging: LogConfig,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialDatabaseConfig {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialTenancyConfig {
    default_tenant: Option<String>,
    currency: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialLogConfig {
    level: Option<String>,
    format: Option<String>,
}

/// Partial application configuration as read from the TOML file
#[derive(Deserialize, Debug, Default)]
pub struct PartialAppConfig {
    environment: Option<Environment>,
    database: Option<PartialDatabaseConfig>,
    tenancy: Option<PartialTenancyConfig>,
    logging: Option<PartialLogConfig>,
}

impl AppConfig {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load_config()
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        ConfigLoader::with_config_path(path).load_config()
    }

    /// Preset used by tests: in-memory database, quiet logging
    pub fn testing() -> Self {
        Self {
            environment: Environment::Test,
            database: DatabaseConfig {
                url: "memory://test".to_string(),
                max_connections: 2,
            },
            tenancy: TenancyConfig::default(),
            logging: LogConfig {
                level: "error".to_string(),
                format: "compact".to_string(),
            },
        }
    }

    /// Create AppConfig from the file contents and environment overrides.
    /// Environment values win over file values, which win over defaults.
    pub fn from_partial_and_env(
        partial: Option<PartialAppConfig>,
        env_map: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();
        let database = partial.database.unwrap_or_default();
        let tenancy = partial.tenancy.unwrap_or_default();
        let logging = partial.logging.unwrap_or_default();
        let defaults = AppConfig::default();

        let environment = match env_map.get(ENV_ENVIRONMENT) {
            Some(value) => value.parse()?,
            None => partial.environment.unwrap_or_default(),
        };

        let max_connections = match env_map.get(ENV_DATABASE_MAX_CONNECTIONS) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("database.max_connections", value.as_str()))?,
            None => database
                .max_connections
                .unwrap_or(defaults.database.max_connections),
        };

        let config = AppConfig {
            environment,
            database: DatabaseConfig {
                url: env_map
                    .get(ENV_DATABASE_URL)
                    .cloned()
                    .or(database.url)
                    .unwrap_or(defaults.database.url),
                max_connections,
            },
            tenancy: TenancyConfig {
                default_tenant: env_map
                    .get(ENV_DEFAULT_TENANT)
                    .cloned()
                    .or(tenancy.default_tenant)
                    .unwrap_or(defaults.tenancy.default_tenant),
                currency: tenancy.currency.unwrap_or(defaults.tenancy.currency),
            },
            logging: LogConfig {
                level: env_map
                    .get(ENV_LOG_LEVEL)
                    .cloned()
                    .or(logging.level)
                    .unwrap_or(defaults.logging.level),
                format: logging.format.unwrap_or(defaults.logging.format),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::FieldMissing("database.url".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid("database.max_connections", "0"));
        }
        if self.tenancy.default_tenant.trim().is_empty() {
            return Err(ConfigError::FieldMissing("tenancy.default_tenant".to_string()));
        }
        if self.tenancy.currency.len() != 3 {
            return Err(ConfigError::invalid("tenancy.currency", self.tenancy.currency.as_str()));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "compact" | "json") {
            return Err(ConfigError::invalid("logging.format", self.logging.format.as_str()));
        }
        Ok(())
    }
}
