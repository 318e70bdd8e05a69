//! Composition root
//!
//! Every application service is registered here, by key, with its dependency
//! keys spelled out. Nothing outside this module calls `register_*` on the
//! application registry.

use super::container::{ContainerResult, ServiceRegistry};
use super::persistence::{DatabasePool, InMemoryEquipmentRepository, InMemoryRentalRepository};
use crate::config::{AppConfig, ConfigLoader};
use crate::domain::interfaces::{Clock, EquipmentRepository, IdGenerator, RentalRepository};
use crate::domain::services::{CreateRental, ListEquipment, RegisterEquipment, ReturnRental};
use crate::errors::AppError;
use crate::handlers::{EquipmentController, EquipmentFormatter, RentalController, RentalFormatter};
use crate::logging::OperationTimer;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Service keys of the application graph
pub mod keys {
    pub const CONFIG: &str = "config";
    pub const CLOCK: &str = "clock";
    pub const ID_GENERATOR: &str = "idGenerator";

    pub const DATABASE: &str = "database";
    pub const EQUIPMENT_REPOSITORY: &str = "equipmentRepository";
    pub const RENTAL_REPOSITORY: &str = "rentalRepository";

    pub const REGISTER_EQUIPMENT: &str = "registerEquipmentUseCase";
    pub const LIST_EQUIPMENT: &str = "listEquipmentUseCase";
    pub const CREATE_RENTAL: &str = "createRentalUseCase";
    pub const RETURN_RENTAL: &str = "returnRentalUseCase";

    pub const EQUIPMENT_FORMATTER: &str = "equipmentFormatter";
    pub const RENTAL_FORMATTER: &str = "rentalFormatter";
    pub const EQUIPMENT_CONTROLLER: &str = "equipmentController";
    pub const RENTAL_CONTROLLER: &str = "rentalController";

    /// Entry points resolved per request
    pub const CONTROLLERS: &[&str] = &[EQUIPMENT_CONTROLLER, RENTAL_CONTROLLER];
}

/// A group of registrations.
///
/// Registration itself cannot fail; dangling or cyclic dependencies are
/// reported by [`CompositionRoot::build`] once every module has run.
pub trait ServiceModule: Send + Sync {
    fn name(&self) -> &'static str;

    fn register(&self, registry: &ServiceRegistry);
}

/// Configuration and process utilities
pub struct ConfigurationModule {
    config: Arc<AppConfig>,
}

impl ConfigurationModule {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }
}

/// Sequential ids, one counter shared by every prefix: `EQ-000001`, `RN-000002`
fn sequential_ids() -> Arc<IdGenerator> {
    let next = AtomicU64::new(1);
    Arc::new(move |prefix: &str| format!("{prefix}-{:06}", next.fetch_add(1, Ordering::Relaxed)))
}

impl ServiceModule for ConfigurationModule {
    fn name(&self) -> &'static str {
        "configuration"
    }

    fn register(&self, registry: &ServiceRegistry) {
        registry.register_instance(keys::CONFIG, Arc::clone(&self.config));

        let clock: Arc<Clock> = Arc::new(Utc::now);
        registry.register_factory(keys::CLOCK, clock);
        registry.register_factory(keys::ID_GENERATOR, sequential_ids());
    }
}

/// Database pool and repositories, all singletons
pub struct PersistenceModule;

impl ServiceModule for PersistenceModule {
    fn name(&self) -> &'static str {
        "persistence"
    }

    fn register(&self, registry: &ServiceRegistry) {
        registry.register_singleton(keys::DATABASE, &[keys::CONFIG], |deps| {
            let config = deps.get::<AppConfig>(0)?;
            DatabasePool::open(&config.database)
        });

        registry.register_singleton(keys::EQUIPMENT_REPOSITORY, &[keys::DATABASE], |deps| {
            let pool = deps.get::<DatabasePool>(0)?;
            Ok(Arc::new(InMemoryEquipmentRepository::new(pool)) as Arc<dyn EquipmentRepository>)
        });

        registry.register_singleton(keys::RENTAL_REPOSITORY, &[keys::DATABASE], |deps| {
            let pool = deps.get::<DatabasePool>(0)?;
            Ok(Arc::new(InMemoryRentalRepository::new(pool)) as Arc<dyn RentalRepository>)
        });
    }
}

/// Use cases, transient
pub struct UseCaseModule;

impl ServiceModule for UseCaseModule {
    fn name(&self) -> &'static str {
        "use_cases"
    }

    fn register(&self, registry: &ServiceRegistry) {
        registry.register_transient(
            keys::REGISTER_EQUIPMENT,
            &[keys::EQUIPMENT_REPOSITORY, keys::ID_GENERATOR],
            |deps| {
                Ok(RegisterEquipment::new(
                    deps.get_dyn::<dyn EquipmentRepository>(0)?,
                    deps.get_dyn::<IdGenerator>(1)?,
                ))
            },
        );

        registry.register_transient(keys::LIST_EQUIPMENT, &[keys::EQUIPMENT_REPOSITORY], |deps| {
            Ok(ListEquipment::new(deps.get_dyn::<dyn EquipmentRepository>(0)?))
        });

        registry.register_transient(
            keys::CREATE_RENTAL,
            &[
                keys::EQUIPMENT_REPOSITORY,
                keys::RENTAL_REPOSITORY,
                keys::ID_GENERATOR,
                keys::CLOCK,
            ],
            |deps| {
                Ok(CreateRental::new(
                    deps.get_dyn::<dyn EquipmentRepository>(0)?,
                    deps.get_dyn::<dyn RentalRepository>(1)?,
                    deps.get_dyn::<IdGenerator>(2)?,
                    deps.get_dyn::<Clock>(3)?,
                ))
            },
        );

        registry.register_transient(
            keys::RETURN_RENTAL,
            &[keys::EQUIPMENT_REPOSITORY, keys::RENTAL_REPOSITORY, keys::CLOCK],
            |deps| {
                Ok(ReturnRental::new(
                    deps.get_dyn::<dyn EquipmentRepository>(0)?,
                    deps.get_dyn::<dyn RentalRepository>(1)?,
                    deps.get_dyn::<Clock>(2)?,
                ))
            },
        );
    }
}

/// Formatters (singletons) and controllers (transient)
pub struct PresentationModule;

impl ServiceModule for PresentationModule {
    fn name(&self) -> &'static str {
        "presentation"
    }

    fn register(&self, registry: &ServiceRegistry) {
        registry.register_singleton(keys::EQUIPMENT_FORMATTER, &[keys::CONFIG], |deps| {
            let config = deps.get::<AppConfig>(0)?;
            Ok(EquipmentFormatter::new(config.tenancy.currency.clone()))
        });

        registry.register_singleton(keys::RENTAL_FORMATTER, &[keys::CONFIG], |deps| {
            let config = deps.get::<AppConfig>(0)?;
            Ok(RentalFormatter::new(config.tenancy.currency.clone()))
        });

        registry.register_transient(
            keys::EQUIPMENT_CONTROLLER,
            &[keys::REGISTER_EQUIPMENT, keys::LIST_EQUIPMENT, keys::EQUIPMENT_FORMATTER],
            |deps| Ok(EquipmentController::new(deps.get(0)?, deps.get(1)?, deps.get(2)?)),
        );

        registry.register_transient(
            keys::RENTAL_CONTROLLER,
            &[keys::CREATE_RENTAL, keys::RETURN_RENTAL, keys::RENTAL_FORMATTER],
            |deps| Ok(RentalController::new(deps.get(0)?, deps.get(1)?, deps.get(2)?)),
        );
    }
}

/// Runs the service modules in order and validates the resulting graph.
pub struct CompositionRoot {
    modules: Vec<Box<dyn ServiceModule>>,
}

impl CompositionRoot {
    /// The application's modules
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            modules: vec![
                Box::new(ConfigurationModule::new(config)),
                Box::new(PersistenceModule),
                Box::new(UseCaseModule),
                Box::new(PresentationModule),
            ],
        }
    }

    /// Appends a module. It runs after the application modules, so its
    /// registrations replace theirs.
    pub fn with_module(mut self, module: impl ServiceModule + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|module| module.name()).collect()
    }

    /// Registers every module into a new registry. Nothing is constructed.
    pub fn build(&self) -> ContainerResult<ServiceRegistry> {
        let timer = OperationTimer::new("composition").with_metadata("modules", self.modules.len());
        let registry = ServiceRegistry::new();

        for module in &self.modules {
            let before = registry.registered_services().len();
            module.register(&registry);
            debug!(
                module = module.name(),
                added = registry.registered_services().len().saturating_sub(before),
                "Registered service module"
            );
        }

        registry.validate()?;
        let services = registry.registered_services().len();
        timer.finish();
        info!(services, "Service registry composed");
        Ok(registry)
    }
}

/// Builds a new, unshared registry for `config`.
pub fn build_fresh(config: Arc<AppConfig>) -> ContainerResult<Arc<ServiceRegistry>> {
    CompositionRoot::new(config).build().map(Arc::new)
}

/// Owner of the application registry.
///
/// The registry is built on the first [`get`](Self::get) and shared until
/// [`reset`](Self::reset).
pub struct AppContainer {
    config: Arc<AppConfig>,
    registry: Mutex<Option<Arc<ServiceRegistry>>>,
}

impl AppContainer {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            registry: Mutex::new(None),
        }
    }

    /// Container for the configuration `loader` reads
    pub fn from_loader(loader: &ConfigLoader) -> Result<Self, AppError> {
        Ok(Self::new(loader.load_config()?))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The shared registry. Concurrent first calls build it once.
    pub fn get(&self) -> ContainerResult<Arc<ServiceRegistry>> {
        let mut slot = self.registry.lock();
        if let Some(registry) = slot.as_ref() {
            return Ok(Arc::clone(registry));
        }
        let registry = build_fresh(Arc::clone(&self.config))?;
        *slot = Some(Arc::clone(&registry));
        Ok(registry)
    }

    /// Drops the shared registry; the next `get` builds a new one. Handles
    /// already given out keep working on the old registry.
    pub fn reset(&self) {
        if self.registry.lock().take().is_some() {
            info!("Service registry reset");
        }
    }

    pub fn is_built(&self) -> bool {
        self.registry.lock().is_some()
    }
}
