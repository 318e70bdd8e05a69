//! In-memory persistence
//!
//! `DatabasePool` owns the tables. The repositories share one pool, so every
//! repository resolved from the same registry sees the same rows.

use crate::config::DatabaseConfig;
use crate::domain::entities::{Equipment, EquipmentStatus, Rental};
use crate::domain::errors::DomainError;
use crate::domain::interfaces::{EquipmentRepository, RentalRepository};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

const MEMORY_SCHEME: &str = "memory://";

/// (tenant, id) -> row
type Table<T> = RwLock<BTreeMap<(String, String), T>>;

pub struct DatabasePool {
    name: String,
    max_connections: u32,
    equipment: Table<Equipment>,
    rentals: Table<Rental>,
}

impl DatabasePool {
    /// Opens the pool described by `config`. Only `memory://` urls are supported.
    pub fn open(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let name = match config.url.strip_prefix(MEMORY_SCHEME) {
            Some(name) if !name.is_empty() => name.to_string(),
            Some(_) => anyhow::bail!("database url '{}' has no database name", config.url),
            None => anyhow::bail!(
                "unsupported database url '{}', expected {}<name>",
                config.url,
                MEMORY_SCHEME
            ),
        };
        tracing::info!(
            database = %name,
            max_connections = config.max_connections,
            "Opened database pool"
        );
        Ok(Self {
            name,
            max_connections: config.max_connections,
            equipment: RwLock::new(BTreeMap::new()),
            rentals: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }
}

fn row_key(tenant_id: &str, id: &str) -> (String, String) {
    (tenant_id.to_string(), id.to_string())
}

fn rows_of<T: Clone>(table: &Table<T>, tenant_id: &str) -> Vec<T> {
    table
        .read()
        .iter()
        .filter(|((tenant, _), _)| tenant.as_str() == tenant_id)
        .map(|(_, row)| row.clone())
        .collect()
}

pub struct InMemoryEquipmentRepository {
    pool: Arc<DatabasePool>,
}

impl InMemoryEquipmentRepository {
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

impl EquipmentRepository for InMemoryEquipmentRepository {
    fn save(&self, equipment: Equipment) -> Result<Equipment, DomainError> {
        if equipment.tenant_id.is_empty() {
            return Err(DomainError::Storage("equipment without tenant".to_string()));
        }
        self.pool
            .equipment
            .write()
            .insert(row_key(&equipment.tenant_id, &equipment.id), equipment.clone());
        Ok(equipment)
    }

    fn find(&self, tenant_id: &str, id: &str) -> Result<Option<Equipment>, DomainError> {
        Ok(self.pool.equipment.read().get(&row_key(tenant_id, id)).cloned())
    }

    fn reserve(&self, tenant_id: &str, id: &str) -> Result<Equipment, DomainError> {
        let mut table = self.pool.equipment.write();
        let item = table
            .get_mut(&row_key(tenant_id, id))
            .ok_or_else(|| DomainError::EquipmentNotFound(id.to_string()))?;
        if item.status != EquipmentStatus::Available {
            return Err(DomainError::EquipmentUnavailable {
                id: item.id.clone(),
                status: item.status.to_string(),
            });
        }
        item.status = EquipmentStatus::Rented;
        Ok(item.clone())
    }

    fn list(&self, tenant_id: &str) -> Result<Vec<Equipment>, DomainError> {
        Ok(rows_of(&self.pool.equipment, tenant_id))
    }
}

pub struct InMemoryRentalRepository {
    pool: Arc<DatabasePool>,
}

impl InMemoryRentalRepository {
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

impl RentalRepository for InMemoryRentalRepository {
    fn save(&self, rental: Rental) -> Result<Rental, DomainError> {
        if rental.tenant_id.is_empty() {
            return Err(DomainError::Storage("rental without tenant".to_string()));
        }
        self.pool
            .rentals
            .write()
            .insert(row_key(&rental.tenant_id, &rental.id), rental.clone());
        Ok(rental)
    }

    fn find(&self, tenant_id: &str, id: &str) -> Result<Option<Rental>, DomainError> {
        Ok(self.pool.rentals.read().get(&row_key(tenant_id, id)).cloned())
    }

    fn list(&self, tenant_id: &str) -> Result<Vec<Rental>, DomainError> {
        Ok(rows_of(&self.pool.rentals, tenant_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn pool() -> Arc<DatabasePool> {
        Arc::new(
            DatabasePool::open(&DatabaseConfig {
                url: "memory://unit".to_string(),
                max_connections: 1,
            })
            .unwrap(),
        )
    }

    fn equipment(tenant: &str, id: &str) -> Equipment {
        Equipment {
            id: id.to_string(),
            tenant_id: tenant.to_string(),
            name: "Scaffold".to_string(),
            category: "access".to_string(),
            daily_rate_cents: 900,
            status: EquipmentStatus::Available,
        }
    }

    #[test]
    fn test_open_rejects_other_schemes() {
        let config = DatabaseConfig {
            url: "postgres://localhost/rentals".to_string(),
            max_connections: 4,
        };
        let err = DatabasePool::open(&config).err().unwrap();
        assert!(err.to_string().contains("unsupported database url"));

        let config = DatabaseConfig {
            url: "memory://".to_string(),
            max_connections: 4,
        };
        assert!(DatabasePool::open(&config).is_err());
    }

    #[test]
    fn test_repositories_share_the_pool() {
        let pool = pool();
        assert_eq!(pool.name(), "unit");
        let writer = InMemoryEquipmentRepository::new(pool.clone());
        let reader = InMemoryEquipmentRepository::new(pool);

        writer.save(equipment("acme", "EQ-2")).unwrap();
        writer.save(equipment("acme", "EQ-1")).unwrap();
        writer.save(equipment("globex", "EQ-3")).unwrap();

        let ids: Vec<String> = reader.list("acme").unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["EQ-1", "EQ-2"]);
        assert!(reader.find("globex", "EQ-1").unwrap().is_none());
    }

    #[test]
    fn test_concurrent_reserve_has_one_winner() {
        let repo = Arc::new(InMemoryEquipmentRepository::new(pool()));
        repo.save(equipment("acme", "EQ-1")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                thread::spawn(move || repo.reserve("acme", "EQ-1"))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().all(|r| match r {
            Ok(item) => item.status == EquipmentStatus::Rented,
            Err(err) => matches!(err, DomainError::EquipmentUnavailable { .. }),
        }));
        assert_eq!(
            repo.reserve("acme", "EQ-9"),
            Err(DomainError::EquipmentNotFound("EQ-9".to_string()))
        );
    }

    #[test]
    fn test_save_requires_tenant() {
        let repo = InMemoryEquipmentRepository::new(pool());
        assert!(matches!(
            repo.save(equipment("", "EQ-1")),
            Err(DomainError::Storage(_))
        ));
    }
}
