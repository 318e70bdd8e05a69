//! Domain layer
//!
//! Rental entities, repository interfaces and use cases. Everything here is a
//! plain constructor taking its collaborators positionally; wiring happens in
//! the composition root.

pub mod entities;
pub mod errors;
pub mod interfaces;
pub mod services;
