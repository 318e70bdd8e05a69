pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::AppConfig;
pub use errors::AppError;
pub use infrastructure::composition::{build_fresh, AppContainer, CompositionRoot};
pub use infrastructure::container::{ContainerError, ServiceLifetime, ServiceRegistry};
