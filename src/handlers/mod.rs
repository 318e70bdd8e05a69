//! Presentation layer: formatters, controllers and request dispatch

pub mod controllers;
pub mod formatters;
pub mod router;

pub use controllers::{EquipmentController, RentalController, Response};
pub use formatters::{EquipmentFormatter, RentalFormatter};
pub use router::{ApiDispatcher, Method, Request};
