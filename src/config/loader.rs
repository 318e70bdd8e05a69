use std::{collections::HashMap, env, fs, path::PathBuf};
use crate::errors::ConfigError;

use super::app_config::{
    AppConfig, PartialAppConfig, CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_DATABASE_MAX_CONNECTIONS,
    ENV_DATABASE_URL, ENV_DEFAULT_TENANT, ENV_ENVIRONMENT, ENV_LOG_LEVEL,
};

/// Configuration loader responsible for loading config from file and environment
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader for `<config dir>/rentalhub/config.toml`
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Loader for an explicit file (CLI `--config`, tests)
    pub fn with_config_path(config_path: PathBuf) -> Self {
        Self {
            config_path: Some(config_path),
        }
    }

    /// Load complete application configuration. A missing file means defaults.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let config_path = self.resolve_config_path()?;
        let partial_config = self.load_partial_config(&config_path)?;
        let env_map = self.collect_env_vars();

        let config = AppConfig::from_partial_and_env(partial_config, &env_map)?;
        tracing::debug!(
            path = %config_path.display(),
            environment = %config.environment,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Path of the configuration file this loader reads
    pub fn resolve_config_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.config_path {
            return Ok(path.clone());
        }
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load partial configuration from TOML file
    fn load_partial_config(&self, config_path: &PathBuf) -> Result<Option<PartialAppConfig>, ConfigError> {
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No configuration file, using defaults");
            return Ok(None);
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            ConfigError::FileRead(config_path.to_string_lossy().to_string(), e)
        })?;

        let partial_config: PartialAppConfig = toml::from_str(&content).map_err(|e| {
            ConfigError::TomlParse(config_path.to_string_lossy().to_string(), e)
        })?;

        Ok(Some(partial_config))
    }

    /// Collect relevant environment variables
    fn collect_env_vars(&self) -> HashMap<String, String> {
        let env_keys = [
            ENV_ENVIRONMENT,
            ENV_DATABASE_URL,
            ENV_DATABASE_MAX_CONNECTIONS,
            ENV_DEFAULT_TENANT,
            ENV_LOG_LEVEL,
        ];

        let mut env_map = HashMap::new();
        for key in &env_keys {
            if let Ok(value) = env::var(key) {
                env_map.insert(key.to_string(), value);
            }
        }
        env_map
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
