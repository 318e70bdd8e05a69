//! Infrastructure layer
//!
//! - `container`: the service registry
//! - `composition`: registration of the application graph
//! - `persistence`: in-memory database pool and repositories

pub mod composition;
pub mod container;
pub mod persistence;
