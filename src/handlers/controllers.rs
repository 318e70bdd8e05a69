//! Request controllers
//!
//! Controllers are transient: the dispatcher resolves a fresh one per request.

use super::formatters::{EquipmentFormatter, RentalFormatter};
use crate::domain::errors::DomainError;
use crate::domain::services::{CreateRental, ListEquipment, NewEquipment, NewRental, RegisterEquipment, ReturnRental};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<DomainError> for Response {
    fn from(err: DomainError) -> Self {
        let status = match &err {
            DomainError::EquipmentNotFound(_) | DomainError::RentalNotFound(_) => 404,
            DomainError::EquipmentUnavailable { .. } | DomainError::AlreadyReturned(_) => 409,
            DomainError::InvalidPeriod { .. } | DomainError::Validation(_) => 422,
            DomainError::Storage(_) => 500,
        };
        Response::error(status, err.to_string())
    }
}

fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, Response> {
    serde_json::from_value(body).map_err(|e| Response::error(400, format!("Invalid request body: {e}")))
}

pub struct EquipmentController {
    register: Arc<RegisterEquipment>,
    list: Arc<ListEquipment>,
    formatter: Arc<EquipmentFormatter>,
}

impl EquipmentController {
    pub fn new(
        register: Arc<RegisterEquipment>,
        list: Arc<ListEquipment>,
        formatter: Arc<EquipmentFormatter>,
    ) -> Self {
        Self {
            register,
            list,
            formatter,
        }
    }

    pub fn create(&self, tenant_id: &str, body: Value) -> Response {
        let input: NewEquipment = match parse_body(body) {
            Ok(input) => input,
            Err(response) => return response,
        };
        match self.register.execute(tenant_id, input) {
            Ok(equipment) => Response::created(self.formatter.format(&equipment)),
            Err(err) => err.into(),
        }
    }

    pub fn index(&self, tenant_id: &str, only_available: bool) -> Response {
        match self.list.execute(tenant_id, only_available) {
            Ok(items) => Response::ok(self.formatter.format_list(&items)),
            Err(err) => err.into(),
        }
    }
}

pub struct RentalController {
    create: Arc<CreateRental>,
    give_back: Arc<ReturnRental>,
    formatter: Arc<RentalFormatter>,
}

impl RentalController {
    pub fn new(create: Arc<CreateRental>, give_back: Arc<ReturnRental>, formatter: Arc<RentalFormatter>) -> Self {
        Self {
            create,
            give_back,
            formatter,
        }
    }

    pub fn create(&self, tenant_id: &str, body: Value) -> Response {
        let input: NewRental = match parse_body(body) {
            Ok(input) => input,
            Err(response) => return response,
        };
        match self.create.execute(tenant_id, input) {
            Ok(rental) => Response::created(self.formatter.format(&rental)),
            Err(err) => err.into(),
        }
    }

    pub fn return_rental(&self, tenant_id: &str, rental_id: &str) -> Response {
        match self.give_back.execute(tenant_id, rental_id) {
            Ok(rental) => Response::ok(self.formatter.format(&rental)),
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_domain_errors_map_to_status() {
        let not_found: Response = DomainError::RentalNotFound("RN-9".to_string()).into();
        assert_eq!(not_found.status, 404);
        assert_eq!(not_found.body["error"], "Rental 'RN-9' not found");

        let conflict: Response = DomainError::AlreadyReturned("RN-1".to_string()).into();
        assert_eq!(conflict.status, 409);

        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let invalid: Response = DomainError::InvalidPeriod { start: date, end: date }.into();
        assert_eq!(invalid.status, 422);
        assert!(!invalid.is_success());
    }

    #[test]
    fn test_parse_body_rejects_wrong_shape() {
        let result: Result<NewEquipment, Response> = parse_body(json!({ "name": 3 }));
        assert_eq!(result.err().map(|r| r.status), Some(400));
    }
}
