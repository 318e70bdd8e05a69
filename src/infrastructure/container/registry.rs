//! Registry tables and the resolution algorithm

use super::descriptor::{Dependencies, Instance, ServiceDescriptor};
use super::error::{ContainerError, ContainerResult};
use super::stats::{ContainerStats, InnerStats};
use super::ServiceLifetime;
use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Named service registry.
///
/// Lookup precedence on [`resolve`](Self::resolve) is fixed: raw instances,
/// then service descriptors (singletons memoized), then raw factories. A raw
/// instance always wins over a descriptor of the same key, whichever was
/// registered first.
///
/// Re-registering a key replaces its previous registration in the same table
/// (last registration wins) and drops any singleton already cached for it.
pub struct ServiceRegistry {
    /// Pre-built instances returned as-is
    pub(super) instances: DashMap<String, Instance>,
    /// Constructible services
    pub(super) descriptors: DashMap<String, Arc<ServiceDescriptor>>,
    /// Raw callables returned verbatim
    pub(super) factories: DashMap<String, Instance>,
    /// Constructed singletons
    pub(super) singletons: DashMap<String, Instance>,
    /// Serializes singleton construction and descriptor changes. Re-entrant so a
    /// factory's own dependencies resolve on the same thread.
    construction: ReentrantMutex<()>,
    stats: InnerStats,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            instances: DashMap::new(),
            descriptors: DashMap::new(),
            factories: DashMap::new(),
            singletons: DashMap::new(),
            construction: ReentrantMutex::new(()),
            stats: InnerStats::default(),
        }
    }

    /// Registers a service constructed on every resolve.
    ///
    /// `dependencies` are resolved in order and passed to `factory` by position.
    /// They only need to be registered by the time this key is resolved.
    pub fn register_transient<T, F>(&self, key: impl Into<String>, dependencies: &[&str], factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.register_descriptor(key.into(), dependencies, ServiceLifetime::Transient, factory);
    }

    /// Registers a service constructed on first resolve and shared afterwards.
    pub fn register_singleton<T, F>(&self, key: impl Into<String>, dependencies: &[&str], factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.register_descriptor(key.into(), dependencies, ServiceLifetime::Singleton, factory);
    }

    /// Registers a pre-built value. Resolving `key` returns this exact `Arc`.
    pub fn register_instance<T>(&self, key: impl Into<String>, value: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        let key = key.into();
        debug!(key = %key, "Registered instance");
        self.instances.insert(key, value as Instance);
    }

    /// Registers a raw callable. Resolving `key` returns the callable itself,
    /// read back with [`resolve_dyn`](Self::resolve_dyn).
    pub fn register_factory<F>(&self, key: impl Into<String>, factory: Arc<F>)
    where
        F: ?Sized + Send + Sync + 'static,
    {
        let key = key.into();
        debug!(key = %key, "Registered factory");
        self.factories.insert(key, Arc::new(factory) as Instance);
    }

    fn register_descriptor<T, F>(
        &self,
        key: String,
        dependencies: &[&str],
        lifetime: ServiceLifetime,
        factory: F,
    ) where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let dependencies: Vec<String> = dependencies.iter().map(|dep| dep.to_string()).collect();
        debug!(
            key = %key,
            lifetime = %lifetime,
            dependencies = ?dependencies,
            "Registered service"
        );
        let descriptor = ServiceDescriptor::new(key.clone(), dependencies, lifetime, factory);

        let _guard = self.construction.lock();
        self.descriptors.insert(key.clone(), Arc::new(descriptor));
        if self.singletons.remove(&key).is_some() {
            debug!(key = %key, "Dropped cached singleton after re-registration");
        }
    }

    /// Resolves `key` and downcasts it to `T`.
    pub fn resolve<T: Send + Sync + 'static>(&self, key: &str) -> ContainerResult<Arc<T>> {
        self.resolve_instance(key)?
            .downcast::<T>()
            .map_err(|_| ContainerError::type_mismatch::<T>(key))
    }

    /// Resolves a key registered as an `Arc<T>` value: a trait object returned by
    /// a service factory, or a callable passed to
    /// [`register_factory`](Self::register_factory).
    pub fn resolve_dyn<T: ?Sized + Send + Sync + 'static>(&self, key: &str) -> ContainerResult<Arc<T>> {
        let shared = self.resolve::<Arc<T>>(key).map_err(|err| match err {
            ContainerError::TypeMismatch { key, .. } => ContainerError::TypeMismatch {
                key,
                expected: std::any::type_name::<T>(),
            },
            other => other,
        })?;
        Ok(Arc::clone(shared.as_ref()))
    }

    /// Resolves `key` without downcasting.
    pub fn resolve_instance(&self, key: &str) -> ContainerResult<Instance> {
        let mut path = Vec::new();
        self.resolve_in_path(key, &mut path).inspect_err(|err| {
            warn!(key = %key, error = %err, "Service resolution failed");
        })
    }

    fn resolve_in_path(&self, key: &str, path: &mut Vec<String>) -> ContainerResult<Instance> {
        self.stats.record_resolution();
        let result = self.lookup(key, path);
        if result.is_err() {
            self.stats.record_failure();
        }
        result
    }

    fn lookup(&self, key: &str, path: &mut Vec<String>) -> ContainerResult<Instance> {
        if let Some(instance) = self.instances.get(key) {
            self.stats.record_instance_hit();
            return Ok(Arc::clone(instance.value()));
        }

        let descriptor = self.descriptors.get(key).map(|entry| Arc::clone(entry.value()));
        if let Some(descriptor) = descriptor {
            if path.iter().any(|pending| pending == key) {
                let mut chain = path.clone();
                chain.push(key.to_string());
                return Err(ContainerError::CircularDependency { chain });
            }
            return match descriptor.lifetime {
                ServiceLifetime::Singleton => self.resolve_singleton(&descriptor, path),
                ServiceLifetime::Transient => {
                    let instance = self.construct(&descriptor, path)?;
                    self.stats.record_transient();
                    Ok(instance)
                }
            };
        }

        if let Some(factory) = self.factories.get(key) {
            self.stats.record_factory_hit();
            return Ok(Arc::clone(factory.value()));
        }

        Err(ContainerError::not_registered(key))
    }

    fn resolve_singleton(
        &self,
        descriptor: &Arc<ServiceDescriptor>,
        path: &mut Vec<String>,
    ) -> ContainerResult<Instance> {
        if let Some(cached) = self.cached_singleton(&descriptor.key) {
            return Ok(cached);
        }

        let _guard = self.construction.lock();
        // Another thread may have finished construction while we waited.
        if let Some(cached) = self.cached_singleton(&descriptor.key) {
            return Ok(cached);
        }
        self.stats.record_cache_miss();

        let instance = self.construct(descriptor, path)?;
        if self.is_current(descriptor) {
            self.singletons
                .insert(descriptor.key.clone(), Arc::clone(&instance));
        }
        Ok(instance)
    }

    fn cached_singleton(&self, key: &str) -> Option<Instance> {
        let cached = self.singletons.get(key).map(|entry| Arc::clone(entry.value()));
        if cached.is_some() {
            self.stats.record_cache_hit();
        }
        cached
    }

    /// A factory may re-register or clear the registry while it runs; its
    /// result is only cached for the descriptor that produced it.
    fn is_current(&self, descriptor: &Arc<ServiceDescriptor>) -> bool {
        self.descriptors
            .get(&descriptor.key)
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), descriptor))
    }

    fn construct(
        &self,
        descriptor: &ServiceDescriptor,
        path: &mut Vec<String>,
    ) -> ContainerResult<Instance> {
        path.push(descriptor.key.clone());
        let resolved = self.resolve_dependencies(descriptor, path);
        path.pop();

        let dependencies = Dependencies::new(&descriptor.key, resolved?);
        debug!(key = %descriptor.key, lifetime = %descriptor.lifetime, "Constructing service");
        descriptor.construct(&dependencies)
    }

    fn resolve_dependencies(
        &self,
        descriptor: &ServiceDescriptor,
        path: &mut Vec<String>,
    ) -> ContainerResult<Vec<(String, Instance)>> {
        let mut resolved = Vec::with_capacity(descriptor.dependencies.len());
        for dependency in &descriptor.dependencies {
            let instance = self
                .resolve_in_path(dependency, path)
                .map_err(|err| match err {
                    ContainerError::ServiceNotRegistered { key } => {
                        ContainerError::MissingDependency {
                            dependency: key,
                            requested_by: descriptor.key.clone(),
                        }
                    }
                    other => other,
                })?;
            resolved.push((dependency.clone(), instance));
        }
        Ok(resolved)
    }

    /// True if `key` is in any table. Never constructs anything.
    pub fn is_registered(&self, key: &str) -> bool {
        self.instances.contains_key(key)
            || self.descriptors.contains_key(key)
            || self.factories.contains_key(key)
    }

    /// All known keys across the instance, descriptor and factory tables.
    pub fn registered_services(&self) -> BTreeSet<String> {
        self.instances
            .iter()
            .map(|entry| entry.key().clone())
            .chain(self.descriptors.iter().map(|entry| entry.key().clone()))
            .chain(self.factories.iter().map(|entry| entry.key().clone()))
            .collect()
    }

    /// Lifetime of a constructible service, `None` for instances, factories and
    /// unknown keys.
    pub fn lifetime(&self, key: &str) -> Option<ServiceLifetime> {
        self.descriptors.get(key).map(|entry| entry.lifetime)
    }

    /// Declared dependency keys of a constructible service.
    pub fn dependencies_of(&self, key: &str) -> Option<Vec<String>> {
        self.descriptors
            .get(key)
            .map(|entry| entry.dependencies.clone())
    }

    /// True once a singleton has been constructed and cached.
    pub fn is_constructed(&self, key: &str) -> bool {
        self.singletons.contains_key(key)
    }

    /// Empties every table, including cached singletons.
    pub fn clear(&self) {
        let _guard = self.construction.lock();
        let count = self.registered_services().len();
        self.instances.clear();
        self.descriptors.clear();
        self.factories.clear();
        self.singletons.clear();
        info!(cleared = count, "Service registry cleared");
    }

    pub fn stats(&self) -> ContainerStats {
        self.stats
            .snapshot(self.registered_services().len(), self.singletons.len())
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
