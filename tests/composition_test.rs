//! Composition root and application container

use futures::future;
use rentalhub::config::{AppConfig, ConfigLoader};
use rentalhub::infrastructure::composition::{build_fresh, keys, AppContainer, CompositionRoot, ServiceModule};
use rentalhub::infrastructure::container::ServiceRegistry;
use rentalhub::infrastructure::persistence::DatabasePool;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_fresh_registries_are_isolated() {
    let config = Arc::new(AppConfig::testing());
    let first = build_fresh(config.clone()).unwrap();
    let second = build_fresh(config).unwrap();

    let pool_a = first.resolve::<DatabasePool>(keys::DATABASE).unwrap();
    let pool_b = second.resolve::<DatabasePool>(keys::DATABASE).unwrap();
    assert!(!Arc::ptr_eq(&pool_a, &pool_b));
    assert_eq!(pool_a.name(), "test");
}

#[test]
fn test_container_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        "environment = \"test\"\n\n[database]\nurl = \"memory://from-file\"\n",
    )
    .unwrap();

    let container = AppContainer::from_loader(&ConfigLoader::with_config_path(path)).unwrap();
    assert_eq!(container.config().database.url, "memory://from-file");

    let registry = container.get().unwrap();
    let pool = registry.resolve::<DatabasePool>(keys::DATABASE).unwrap();
    assert_eq!(pool.name(), "from-file");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_builds_once() {
    let container = Arc::new(AppContainer::new(AppConfig::testing()));

    let tasks = (0..16).map(|_| {
        let container = container.clone();
        tokio::task::spawn_blocking(move || container.get())
    });
    let registries: Vec<Arc<ServiceRegistry>> = future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert!(registries.iter().all(|registry| Arc::ptr_eq(registry, &registries[0])));
}

#[test]
fn test_reset_gives_fresh_singletons() {
    let container = AppContainer::new(AppConfig::testing());
    let before = container
        .get()
        .unwrap()
        .resolve::<DatabasePool>(keys::DATABASE)
        .unwrap();

    container.reset();
    let after = container
        .get()
        .unwrap()
        .resolve::<DatabasePool>(keys::DATABASE)
        .unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
}

struct SmallPool;

impl ServiceModule for SmallPool {
    fn name(&self) -> &'static str {
        "small_pool"
    }

    fn register(&self, registry: &ServiceRegistry) {
        let mut config = AppConfig::testing();
        config.database.url = "memory://override".to_string();
        config.database.max_connections = 1;
        registry.register_instance(keys::CONFIG, Arc::new(config));
    }
}

#[test]
fn test_later_module_overrides_registration() {
    let registry = CompositionRoot::new(Arc::new(AppConfig::testing()))
        .with_module(SmallPool)
        .build()
        .unwrap();

    let pool = registry.resolve::<DatabasePool>(keys::DATABASE).unwrap();
    assert_eq!(pool.name(), "override");
    assert_eq!(pool.max_connections(), 1);
}
