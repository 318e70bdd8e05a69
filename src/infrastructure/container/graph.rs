//! Static inspection of the registered dependency graph
//!
//! Nothing here constructs a service. The graph follows lookup precedence: a
//! key shadowed by a raw instance has no outgoing edges.

use super::error::{ContainerError, ContainerResult};
use super::registry::ServiceRegistry;
use super::ServiceLifetime;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{self, Write as _};

/// Which table answers a resolve of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Instance,
    Singleton,
    Transient,
    Factory,
}

impl From<ServiceLifetime> for ServiceKind {
    fn from(lifetime: ServiceLifetime) -> Self {
        match lifetime {
            ServiceLifetime::Singleton => ServiceKind::Singleton,
            ServiceLifetime::Transient => ServiceKind::Transient,
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceKind::Instance => "instance",
            ServiceKind::Singleton => "singleton",
            ServiceKind::Transient => "transient",
            ServiceKind::Factory => "factory",
        };
        f.write_str(label)
    }
}

/// One row of the registry health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub key: String,
    pub kind: ServiceKind,
    pub dependencies: Vec<String>,
    /// Singleton already built and cached
    pub constructed: bool,
}

impl ServiceRegistry {
    /// Kind and outgoing edges of `key` as `resolve` would see them.
    fn edges(&self, key: &str) -> Option<(ServiceKind, Vec<String>)> {
        if self.instances.contains_key(key) {
            return Some((ServiceKind::Instance, Vec::new()));
        }
        if let Some(descriptor) = self.descriptors.get(key) {
            return Some((descriptor.lifetime.into(), descriptor.dependencies.clone()));
        }
        if self.factories.contains_key(key) {
            return Some((ServiceKind::Factory, Vec::new()));
        }
        None
    }

    /// Every registered key with its effective kind, sorted by key.
    pub fn describe(&self) -> Vec<ServiceInfo> {
        self.registered_services()
            .into_iter()
            .filter_map(|key| {
                let (kind, dependencies) = self.edges(&key)?;
                let constructed = kind == ServiceKind::Singleton && self.is_constructed(&key);
                Some(ServiceInfo {
                    key,
                    kind,
                    dependencies,
                    constructed,
                })
            })
            .collect()
    }

    /// Checks that every declared dependency is registered and that no cycle
    /// exists, visiting keys in sorted order.
    pub fn validate(&self) -> ContainerResult<()> {
        let mut walker = GraphWalker::new(self);
        for key in self.registered_services() {
            walker.visit(&key, None)?;
        }
        Ok(())
    }

    /// Keys a resolve of `key` would touch, leaves first, each listed once.
    pub fn dependency_order(&self, key: &str) -> ContainerResult<Vec<String>> {
        let mut walker = GraphWalker::new(self);
        walker.visit(key, None)?;
        Ok(walker.order)
    }

    /// Graphviz rendering of the dependency graph. Dangling edges are drawn
    /// dashed in red.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph services {\n    rankdir=LR;\n    node [fontname=\"monospace\"];\n");
        let services = self.describe();

        for info in &services {
            let shape = match info.kind {
                ServiceKind::Instance => "note",
                ServiceKind::Factory => "component",
                ServiceKind::Singleton => "box",
                ServiceKind::Transient => "ellipse",
            };
            let _ = writeln!(
                dot,
                "    \"{}\" [shape={}, label=\"{}\\n({})\"];",
                info.key, shape, info.key, info.kind
            );
        }
        for info in &services {
            for dependency in &info.dependencies {
                if self.is_registered(dependency) {
                    let _ = writeln!(dot, "    \"{}\" -> \"{}\";", info.key, dependency);
                } else {
                    let _ = writeln!(
                        dot,
                        "    \"{}\" -> \"{}\" [style=dashed, color=red];",
                        info.key, dependency
                    );
                }
            }
        }
        dot.push_str("}\n");
        dot
    }
}

/// Depth-first walk shared by `validate` and `dependency_order`.
struct GraphWalker<'a> {
    registry: &'a ServiceRegistry,
    done: HashSet<String>,
    stack: Vec<String>,
    order: Vec<String>,
}

impl<'a> GraphWalker<'a> {
    fn new(registry: &'a ServiceRegistry) -> Self {
        Self {
            registry,
            done: HashSet::new(),
            stack: Vec::new(),
            order: Vec::new(),
        }
    }

    fn visit(&mut self, key: &str, requested_by: Option<&str>) -> ContainerResult<()> {
        if self.done.contains(key) {
            return Ok(());
        }
        if self.stack.iter().any(|pending| pending == key) {
            let mut chain = self.stack.clone();
            chain.push(key.to_string());
            return Err(ContainerError::CircularDependency { chain });
        }

        let Some((_, dependencies)) = self.registry.edges(key) else {
            return Err(match requested_by {
                Some(owner) => ContainerError::MissingDependency {
                    dependency: key.to_string(),
                    requested_by: owner.to_string(),
                },
                None => ContainerError::not_registered(key),
            });
        };

        self.stack.push(key.to_string());
        for dependency in &dependencies {
            self.visit(dependency, Some(key))?;
        }
        self.stack.pop();

        self.done.insert(key.to_string());
        self.order.push(key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn rental_graph() -> (ServiceRegistry, Arc<AtomicUsize>) {
        let registry = ServiceRegistry::new();
        let constructions = Arc::new(AtomicUsize::new(0));

        registry.register_instance("config", Arc::new("test"));
        for (key, deps) in [
            ("database", vec!["config"]),
            ("equipmentRepository", vec!["database"]),
            ("rentalRepository", vec!["database"]),
            ("createRental", vec!["equipmentRepository", "rentalRepository"]),
        ] {
            let counter = constructions.clone();
            registry.register_singleton(key, &deps, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        (registry, constructions)
    }

    #[test]
    fn test_validate_accepts_complete_graph_without_constructing() {
        let (registry, constructions) = rental_graph();
        registry.validate().unwrap();
        assert_eq!(constructions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_validate_reports_missing_dependency() {
        let (registry, _) = rental_graph();
        registry.register_transient("rentalController", &["createRental", "rentalFormatter"], |_| Ok(()));

        match registry.validate().unwrap_err() {
            ContainerError::MissingDependency {
                dependency,
                requested_by,
            } => {
                assert_eq!(dependency, "rentalFormatter");
                assert_eq!(requested_by, "rentalController");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_reports_cycle() {
        let registry = ServiceRegistry::new();
        registry.register_singleton("a", &["b"], |_| Ok(()));
        registry.register_singleton("b", &["a"], |_| Ok(()));

        match registry.validate().unwrap_err() {
            ContainerError::CircularDependency { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_instance_breaks_cycle() {
        let registry = ServiceRegistry::new();
        registry.register_singleton("a", &["b"], |_| Ok(()));
        registry.register_singleton("b", &["a"], |_| Ok(()));
        registry.register_instance("b", Arc::new(()));

        registry.validate().unwrap();
        assert_eq!(registry.dependency_order("a").unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_dependency_order_is_leaf_first() {
        let (registry, _) = rental_graph();
        let order = registry.dependency_order("createRental").unwrap();
        assert_eq!(
            order,
            vec![
                "config",
                "database",
                "equipmentRepository",
                "rentalRepository",
                "createRental"
            ]
        );
    }

    #[test]
    fn test_dependency_order_of_unknown_key() {
        let registry = ServiceRegistry::new();
        assert!(matches!(
            registry.dependency_order("ghost"),
            Err(ContainerError::ServiceNotRegistered { .. })
        ));
    }

    #[test]
    fn test_describe_reports_kinds() {
        let (registry, _) = rental_graph();
        registry.resolve_instance("database").unwrap();

        let services = registry.describe();
        assert_eq!(services.len(), 5);
        let config = services.iter().find(|info| info.key == "config").unwrap();
        assert_eq!(config.kind, ServiceKind::Instance);
        let database = services.iter().find(|info| info.key == "database").unwrap();
        assert_eq!(database.kind, ServiceKind::Singleton);
        assert!(database.constructed);
        assert_eq!(database.dependencies, vec!["config"]);
    }

    #[test]
    fn test_dot_output() {
        let (registry, _) = rental_graph();
        registry.register_transient("orphan", &["nowhere"], |_| Ok(()));

        let dot = registry.to_dot();
        assert!(dot.starts_with("digraph services {"));
        assert!(dot.contains("\"equipmentRepository\" -> \"database\";"));
        assert!(dot.contains("\"orphan\" -> \"nowhere\" [style=dashed, color=red];"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
