//! Service registry
//!
//! Named services are registered with a factory, an ordered list of dependency
//! keys and a lifetime, or directly as pre-built instances and raw factories.
//! `resolve` builds the requested object graph on demand:
//! - raw instances shadow every other registration of the same key
//! - singletons are constructed once and cached until re-registered or cleared
//! - transients are constructed on every resolve, together with their transient dependencies
//! - dependency cycles and missing keys fail with a named error

mod descriptor;
mod error;
mod graph;
mod registry;
mod stats;

pub use descriptor::{Dependencies, Instance};
pub use error::{ContainerError, ContainerResult};
pub use graph::{ServiceInfo, ServiceKind};
pub use registry::ServiceRegistry;
pub use stats::ContainerStats;

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLifetime {
    /// Single instance for the lifetime of the registry
    Singleton,
    /// New instance per resolve
    Transient,
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceLifetime::Singleton => write!(f, "singleton"),
            ServiceLifetime::Transient => write!(f, "transient"),
        }
    }
}
