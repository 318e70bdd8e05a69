//! Repository and utility interfaces
//!
//! Implemented by the persistence adapters and registered as trait objects.

use super::entities::{Equipment, Rental};
use super::errors::DomainError;
use chrono::{DateTime, Utc};

pub trait EquipmentRepository: Send + Sync {
    /// Insert or replace
    fn save(&self, equipment: Equipment) -> Result<Equipment, DomainError>;
    fn find(&self, tenant_id: &str, id: &str) -> Result<Option<Equipment>, DomainError>;
    /// Marks available equipment as rented and returns it. The status check
    /// and the update are one atomic step.
    fn reserve(&self, tenant_id: &str, id: &str) -> Result<Equipment, DomainError>;
    /// All equipment of a tenant, ordered by id
    fn list(&self, tenant_id: &str) -> Result<Vec<Equipment>, DomainError>;
}

pub trait RentalRepository: Send + Sync {
    /// Insert or replace
    fn save(&self, rental: Rental) -> Result<Rental, DomainError>;
    fn find(&self, tenant_id: &str, id: &str) -> Result<Option<Rental>, DomainError>;
    /// All rentals of a tenant, ordered by id
    fn list(&self, tenant_id: &str) -> Result<Vec<Rental>, DomainError>;
}

/// Current time, registered as a raw factory so tests can pin it
pub type Clock = dyn Fn() -> DateTime<Utc> + Send + Sync;

/// Produces a new id for the given prefix
pub type IdGenerator = dyn Fn(&str) -> String + Send + Sync;
