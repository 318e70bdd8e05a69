use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Equipment '{0}' not found")]
    EquipmentNotFound(String),
    #[error("Rental '{0}' not found")]
    RentalNotFound(String),
    #[error("Equipment '{id}' is not available (currently {status})")]
    EquipmentUnavailable { id: String, status: String },
    #[error("Rental '{0}' has already been returned")]
    AlreadyReturned(String),
    #[error("Rental period {start} to {end} is invalid")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
}
