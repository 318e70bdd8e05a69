//! Container error types

use thiserror::Error;

/// Errors raised while registering or resolving services.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The requested key is in none of the registry tables.
    #[error("Service '{key}' is not registered")]
    ServiceNotRegistered { key: String },

    /// A dependency key declared by `requested_by` is not registered.
    #[error("Service '{dependency}' required by '{requested_by}' is not registered")]
    MissingDependency {
        dependency: String,
        requested_by: String,
    },

    /// The key is already being resolved further up the current path.
    #[error("Circular dependency detected: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// A factory returned an error. `source` is the factory's own error.
    #[error("Failed to construct service '{key}': {source}")]
    ConstructionFailed {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The stored instance is not of the requested type.
    #[error("Service '{key}' cannot be resolved as '{expected}'")]
    TypeMismatch { key: String, expected: &'static str },

    /// A factory read a positional dependency it never declared.
    #[error("Service '{key}' asked for dependency #{index} but declares only {len}")]
    DependencyIndexOutOfRange {
        key: String,
        index: usize,
        len: usize,
    },
}

impl ContainerError {
    /// The key this error is about: the missing key, the failing service, or the
    /// repeated key of a cycle.
    pub fn key(&self) -> &str {
        match self {
            ContainerError::ServiceNotRegistered { key }
            | ContainerError::ConstructionFailed { key, .. }
            | ContainerError::TypeMismatch { key, .. }
            | ContainerError::DependencyIndexOutOfRange { key, .. } => key,
            ContainerError::MissingDependency { dependency, .. } => dependency,
            ContainerError::CircularDependency { chain } => {
                chain.last().map(String::as_str).unwrap_or_default()
            }
        }
    }

    /// Unwraps the factory error of a `ConstructionFailed`, or converts any other
    /// variant into an `anyhow::Error`.
    pub fn into_source(self) -> anyhow::Error {
        match self {
            ContainerError::ConstructionFailed { source, .. } => source,
            other => anyhow::Error::new(other),
        }
    }

    pub(crate) fn not_registered(key: &str) -> Self {
        ContainerError::ServiceNotRegistered {
            key: key.to_string(),
        }
    }

    pub(crate) fn type_mismatch<T: ?Sized>(key: &str) -> Self {
        ContainerError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
        }
    }
}

pub type ContainerResult<T> = Result<T, ContainerError>;
