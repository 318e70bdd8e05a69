//! Rental use cases

use super::entities::{rental_days, Equipment, EquipmentStatus, Rental, RentalStatus};
use super::errors::DomainError;
use super::interfaces::{Clock, EquipmentRepository, IdGenerator, RentalRepository};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct NewEquipment {
    pub name: String,
    pub category: String,
    pub daily_rate_cents: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRental {
    pub equipment_id: String,
    pub customer: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub struct RegisterEquipment {
    equipment: Arc<dyn EquipmentRepository>,
    ids: Arc<IdGenerator>,
}

impl RegisterEquipment {
    pub fn new(equipment: Arc<dyn EquipmentRepository>, ids: Arc<IdGenerator>) -> Self {
        Self { equipment, ids }
    }

    pub fn execute(&self, tenant_id: &str, input: NewEquipment) -> Result<Equipment, DomainError> {
        if input.name.trim().is_empty() {
            return Err(DomainError::Validation("name must not be empty".to_string()));
        }
        if input.daily_rate_cents == 0 {
            return Err(DomainError::Validation("daily rate must be positive".to_string()));
        }
        self.equipment.save(Equipment {
            id: (self.ids)("EQ"),
            tenant_id: tenant_id.to_string(),
            name: input.name.trim().to_string(),
            category: input.category,
            daily_rate_cents: input.daily_rate_cents,
            status: EquipmentStatus::Available,
        })
    }
}

pub struct ListEquipment {
    equipment: Arc<dyn EquipmentRepository>,
}

impl ListEquipment {
    pub fn new(equipment: Arc<dyn EquipmentRepository>) -> Self {
        Self { equipment }
    }

    pub fn execute(&self, tenant_id: &str, only_available: bool) -> Result<Vec<Equipment>, DomainError> {
        let mut items = self.equipment.list(tenant_id)?;
        if only_available {
            items.retain(|item| item.status == EquipmentStatus::Available);
        }
        Ok(items)
    }
}

pub struct CreateRental {
    equipment: Arc<dyn EquipmentRepository>,
    rentals: Arc<dyn RentalRepository>,
    ids: Arc<IdGenerator>,
    clock: Arc<Clock>,
}

impl CreateRental {
    pub fn new(
        equipment: Arc<dyn EquipmentRepository>,
        rentals: Arc<dyn RentalRepository>,
        ids: Arc<IdGenerator>,
        clock: Arc<Clock>,
    ) -> Self {
        Self {
            equipment,
            rentals,
            ids,
            clock,
        }
    }

    pub fn execute(&self, tenant_id: &str, input: NewRental) -> Result<Rental, DomainError> {
        if input.end_date < input.start_date {
            return Err(DomainError::InvalidPeriod {
                start: input.start_date,
                end: input.end_date,
            });
        }
        if input.customer.trim().is_empty() {
            return Err(DomainError::Validation("customer must not be empty".to_string()));
        }

        let item = self
            .equipment
            .find(tenant_id, &input.equipment_id)?
            .ok_or_else(|| DomainError::EquipmentNotFound(input.equipment_id.clone()))?;
        let days = rental_days(input.start_date, input.end_date) as u64;
        let total_cents = days
            .checked_mul(item.daily_rate_cents)
            .ok_or_else(|| DomainError::Validation("rental total is too large".to_string()))?;

        let item = self.equipment.reserve(tenant_id, &item.id)?;
        let rental = Rental {
            id: (self.ids)("RN"),
            tenant_id: tenant_id.to_string(),
            equipment_id: item.id,
            customer: input.customer.trim().to_string(),
            start_date: input.start_date,
            end_date: input.end_date,
            total_cents,
            status: RentalStatus::Active,
            created_at: (self.clock)(),
            returned_at: None,
        };

        self.rentals.save(rental)
    }
}

pub struct ReturnRental {
    equipment: Arc<dyn EquipmentRepository>,
    rentals: Arc<dyn RentalRepository>,
    clock: Arc<Clock>,
}

impl ReturnRental {
    pub fn new(
        equipment: Arc<dyn EquipmentRepository>,
        rentals: Arc<dyn RentalRepository>,
        clock: Arc<Clock>,
    ) -> Self {
        Self {
            equipment,
            rentals,
            clock,
        }
    }

    pub fn execute(&self, tenant_id: &str, rental_id: &str) -> Result<Rental, DomainError> {
        let mut rental = self
            .rentals
            .find(tenant_id, rental_id)?
            .ok_or_else(|| DomainError::RentalNotFound(rental_id.to_string()))?;
        if rental.status == RentalStatus::Returned {
            return Err(DomainError::AlreadyReturned(rental.id));
        }

        if let Some(mut item) = self.equipment.find(tenant_id, &rental.equipment_id)? {
            item.status = EquipmentStatus::Available;
            self.equipment.save(item)?;
        }

        rental.status = RentalStatus::Returned;
        rental.returned_at = Some((self.clock)());
        self.rentals.save(rental)
    }
}
