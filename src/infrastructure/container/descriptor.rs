//! Service descriptors and the positional dependency list handed to factories

use super::error::{ContainerError, ContainerResult};
use super::ServiceLifetime;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A type-erased, shareable service instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Erased factory stored in a descriptor.
pub(crate) type ErasedFactory = Box<dyn Fn(&Dependencies) -> anyhow::Result<Instance> + Send + Sync>;

/// Registration record for a constructible service.
pub(crate) struct ServiceDescriptor {
    pub(crate) key: String,
    pub(crate) dependencies: Vec<String>,
    pub(crate) lifetime: ServiceLifetime,
    pub(crate) factory: ErasedFactory,
}

impl ServiceDescriptor {
    pub(crate) fn new<T, F>(
        key: String,
        dependencies: Vec<String>,
        lifetime: ServiceLifetime,
        factory: F,
    ) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            key,
            dependencies,
            lifetime,
            factory: Box::new(move |deps| {
                let service = factory(deps)?;
                Ok(Arc::new(service) as Instance)
            }),
        }
    }

    pub(crate) fn construct(&self, deps: &Dependencies) -> ContainerResult<Instance> {
        (self.factory)(deps).map_err(|source| ContainerError::ConstructionFailed {
            key: self.key.clone(),
            source,
        })
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("key", &self.key)
            .field("dependencies", &self.dependencies)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// Resolved dependencies of one service, in the order they were declared.
///
/// Factories read them by position:
///
/// ```
/// # use rentalhub::infrastructure::container::{ServiceRegistry, Dependencies};
/// # use std::sync::Arc;
/// struct Config { env: String }
/// struct Repo { cfg: Arc<Config> }
///
/// let registry = ServiceRegistry::new();
/// registry.register_singleton("config", &[], |_| Ok(Config { env: "test".into() }));
/// registry.register_singleton("repo", &["config"], |deps: &Dependencies| {
///     Ok(Repo { cfg: deps.get::<Config>(0)? })
/// });
///
/// let repo = registry.resolve::<Repo>("repo").unwrap();
/// assert_eq!(repo.cfg.env, "test");
/// ```
pub struct Dependencies {
    owner: String,
    entries: Vec<(String, Instance)>,
}

impl Dependencies {
    pub(crate) fn new(owner: &str, entries: Vec<(String, Instance)>) -> Self {
        Self {
            owner: owner.to_string(),
            entries,
        }
    }

    /// Key of the service these dependencies are being resolved for.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declared dependency keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// The erased instance at `index`.
    pub fn instance(&self, index: usize) -> ContainerResult<&Instance> {
        self.entries
            .get(index)
            .map(|(_, instance)| instance)
            .ok_or_else(|| ContainerError::DependencyIndexOutOfRange {
                key: self.owner.clone(),
                index,
                len: self.entries.len(),
            })
    }

    /// The dependency at `index`, downcast to `T`.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> ContainerResult<Arc<T>> {
        let instance = self.instance(index)?;
        instance
            .clone()
            .downcast::<T>()
            .map_err(|_| ContainerError::type_mismatch::<T>(&self.entries[index].0))
    }

    /// The dependency at `index` when it was registered as an `Arc<T>` value,
    /// typically a trait object or a raw factory.
    pub fn get_dyn<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> ContainerResult<Arc<T>> {
        let shared = self
            .get::<Arc<T>>(index)
            .map_err(|err| match err {
                ContainerError::TypeMismatch { key, .. } => ContainerError::TypeMismatch {
                    key,
                    expected: std::any::type_name::<T>(),
                },
                other => other,
            })?;
        Ok(Arc::clone(shared.as_ref()))
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("owner", &self.owner)
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    fn deps() -> Dependencies {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        Dependencies::new(
            "owner",
            vec![
                ("count".to_string(), Arc::new(7u32) as Instance),
                ("greeter".to_string(), Arc::new(greeter) as Instance),
            ],
        )
    }

    #[test]
    fn test_positional_access() {
        let deps = deps();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps.keys().collect::<Vec<_>>(), vec!["count", "greeter"]);
        assert_eq!(*deps.get::<u32>(0).unwrap(), 7);
        assert_eq!(deps.get_dyn::<dyn Greeter>(1).unwrap().greet(), "hello");
    }

    #[test]
    fn test_wrong_type_names_the_dependency_key() {
        let err = deps().get::<String>(0).unwrap_err();
        match err {
            ContainerError::TypeMismatch { key, expected } => {
                assert_eq!(key, "count");
                assert!(expected.contains("String"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range() {
        let err = deps().get::<u32>(5).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::DependencyIndexOutOfRange { index: 5, len: 2, .. }
        ));
    }

    #[test]
    fn test_factory_error_is_wrapped_with_key() {
        let descriptor = ServiceDescriptor::new::<u32, _>(
            "broken".to_string(),
            Vec::new(),
            ServiceLifetime::Transient,
            |_| Err(anyhow::anyhow!("boom")),
        );
        let err = descriptor.construct(&Dependencies::new("broken", Vec::new())).unwrap_err();
        assert_eq!(err.key(), "broken");
        assert_eq!(err.into_source().to_string(), "boom");
    }
}
