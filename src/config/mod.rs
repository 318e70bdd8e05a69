pub mod app_config;
pub mod loader;

// Re-export commonly used types
pub use app_config::{AppConfig, DatabaseConfig, Environment, LogConfig, TenancyConfig};
pub use loader::ConfigLoader;

// Re-export constants
pub use app_config::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};
