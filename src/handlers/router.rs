//! Request dispatch
//!
//! Routes a request to a controller resolved from the registry. Wiring errors
//! become 500 responses; domain errors are mapped by the controllers.

use super::controllers::{EquipmentController, RentalController, Response};
use crate::config::AppConfig;
use crate::infrastructure::composition::keys;
use crate::infrastructure::container::{ContainerResult, ServiceRegistry};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    /// Falls back to the configured default tenant
    pub tenant: Option<String>,
    pub query: HashMap<String, String>,
    pub body: Value,
}

impl Request {
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::Get,
            path: path.to_string(),
            tenant: None,
            query: HashMap::new(),
            body: Value::Null,
        }
    }

    pub fn post(path: &str, body: Value) -> Self {
        Self {
            method: Method::Post,
            body,
            ..Self::get(path)
        }
    }

    pub fn with_tenant(mut self, tenant: &str) -> Self {
        self.tenant = Some(tenant.to_string());
        self
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }
}

pub struct ApiDispatcher {
    registry: Arc<ServiceRegistry>,
    default_tenant: String,
}

impl ApiDispatcher {
    pub fn new(registry: Arc<ServiceRegistry>) -> ContainerResult<Self> {
        let config = registry.resolve::<AppConfig>(keys::CONFIG)?;
        Ok(Self {
            default_tenant: config.tenancy.default_tenant.clone(),
            registry,
        })
    }

    pub fn dispatch(&self, request: Request) -> Response {
        let tenant = request
            .tenant
            .clone()
            .unwrap_or_else(|| self.default_tenant.clone());
        debug!(method = %request.method, path = %request.path, tenant = %tenant, "Dispatching request");

        match self.route(request, &tenant) {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "Failed to resolve request handler");
                Response::error(500, err.to_string())
            }
        }
    }

    fn route(&self, request: Request, tenant: &str) -> ContainerResult<Response> {
        let segments: Vec<&str> = request
            .path
            .trim_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        let response = match (request.method, segments.as_slice()) {
            (Method::Get, ["equipment"]) => {
                let only_available = request.query.get("available").map(String::as_str) == Some("true");
                self.equipment()?.index(tenant, only_available)
            }
            (Method::Post, ["equipment"]) => self.equipment()?.create(tenant, request.body),
            (Method::Post, ["rentals"]) => self.rentals()?.create(tenant, request.body),
            (Method::Post, ["rentals", rental_id, "return"]) => {
                self.rentals()?.return_rental(tenant, rental_id)
            }
            _ => Response::error(404, format!("No route for {} {}", request.method, request.path)),
        };
        Ok(response)
    }

    fn equipment(&self) -> ContainerResult<Arc<EquipmentController>> {
        self.registry.resolve(keys::EQUIPMENT_CONTROLLER)
    }

    fn rentals(&self) -> ContainerResult<Arc<RentalController>> {
        self.registry.resolve(keys::RENTAL_CONTROLLER)
    }
}
