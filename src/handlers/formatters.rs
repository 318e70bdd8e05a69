//! JSON views of domain entities

use crate::domain::entities::{Equipment, Rental};
use serde_json::{json, Value};

/// `1250, "EUR"` -> `"12.50 EUR"`
pub fn format_money(cents: u64, currency: &str) -> String {
    format!("{}.{:02} {}", cents / 100, cents % 100, currency)
}

pub struct EquipmentFormatter {
    currency: String,
}

impl EquipmentFormatter {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    pub fn format(&self, equipment: &Equipment) -> Value {
        json!({
            "id": equipment.id,
            "name": equipment.name,
            "category": equipment.category,
            "daily_rate": format_money(equipment.daily_rate_cents, &self.currency),
            "status": equipment.status,
        })
    }

    pub fn format_list(&self, items: &[Equipment]) -> Value {
        json!({
            "items": items.iter().map(|item| self.format(item)).collect::<Vec<_>>(),
            "total": items.len(),
        })
    }
}

pub struct RentalFormatter {
    currency: String,
}

impl RentalFormatter {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    pub fn format(&self, rental: &Rental) -> Value {
        json!({
            "id": rental.id,
            "equipment_id": rental.equipment_id,
            "customer": rental.customer,
            "start_date": rental.start_date,
            "end_date": rental.end_date,
            "days": rental.days(),
            "total": format_money(rental.total_cents, &self.currency),
            "status": rental.status,
            "returned_at": rental.returned_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::EquipmentStatus;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(1250, "EUR"), "12.50 EUR");
        assert_eq!(format_money(5, "USD"), "0.05 USD");
    }

    #[test]
    fn test_equipment_view() {
        let formatter = EquipmentFormatter::new("USD");
        let view = formatter.format_list(&[Equipment {
            id: "EQ-1".to_string(),
            tenant_id: "acme".to_string(),
            name: "Mixer".to_string(),
            category: "concrete".to_string(),
            daily_rate_cents: 4000,
            status: EquipmentStatus::Maintenance,
        }]);
        assert_eq!(view["total"], 1);
        assert_eq!(view["items"][0]["daily_rate"], "40.00 USD");
        assert_eq!(view["items"][0]["status"], "maintenance");
        assert!(view["items"][0].get("tenant_id").is_none());
    }
}
