//! End-to-end requests through the composed registry

use chrono::{DateTime, TimeZone, Utc};
use rentalhub::config::AppConfig;
use rentalhub::domain::interfaces::Clock;
use rentalhub::handlers::{ApiDispatcher, Request};
use rentalhub::infrastructure::composition::{keys, CompositionRoot, ServiceModule};
use rentalhub::infrastructure::container::ServiceRegistry;
use serde_json::json;
use std::sync::Arc;

fn pinned_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 8, 30, 0).unwrap()
}

struct PinnedClock;

impl ServiceModule for PinnedClock {
    fn name(&self) -> &'static str {
        "pinned_clock"
    }

    fn register(&self, registry: &ServiceRegistry) {
        let clock: Arc<Clock> = Arc::new(pinned_now);
        registry.register_factory(keys::CLOCK, clock);
    }
}

fn dispatcher() -> ApiDispatcher {
    let registry = CompositionRoot::new(Arc::new(AppConfig::testing()))
        .with_module(PinnedClock)
        .build()
        .unwrap();
    ApiDispatcher::new(Arc::new(registry)).unwrap()
}

#[test]
fn test_register_rent_and_return() {
    let api = dispatcher();

    let created = api.dispatch(
        Request::post(
            "/equipment",
            json!({ "name": "Mini excavator", "category": "earthmoving", "daily_rate_cents": 18000 }),
        )
        .with_tenant("acme"),
    );
    assert_eq!(created.status, 201);
    assert_eq!(created.body["daily_rate"], "180.00 EUR");
    let equipment_id = created.body["id"].as_str().unwrap().to_string();

    let rental = api.dispatch(
        Request::post(
            "/rentals",
            json!({
                "equipment_id": equipment_id,
                "customer": "Northside Builders",
                "start_date": "2024-05-10",
                "end_date": "2024-05-12"
            }),
        )
        .with_tenant("acme"),
    );
    assert_eq!(rental.status, 201, "{}", rental.body);
    assert_eq!(rental.body["days"], 3);
    assert_eq!(rental.body["total"], "540.00 EUR");
    let rental_id = rental.body["id"].as_str().unwrap().to_string();

    let available = api.dispatch(
        Request::get("/equipment")
            .with_tenant("acme")
            .with_query("available", "true"),
    );
    assert_eq!(available.body["total"], 0);

    let returned = api.dispatch(Request::post(&format!("/rentals/{rental_id}/return"), json!(null)).with_tenant("acme"));
    assert_eq!(returned.status, 200);
    assert_eq!(returned.body["status"], "returned");
    assert_eq!(returned.body["returned_at"], json!(pinned_now()));

    let again = api.dispatch(Request::post(&format!("/rentals/{rental_id}/return"), json!(null)).with_tenant("acme"));
    assert_eq!(again.status, 409);
}

#[test]
fn test_default_tenant_and_isolation() {
    let api = dispatcher();

    let created = api.dispatch(Request::post(
        "/equipment",
        json!({ "name": "Generator", "category": "power", "daily_rate_cents": 6500 }),
    ));
    assert_eq!(created.status, 201);

    let default_list = api.dispatch(Request::get("/equipment"));
    assert_eq!(default_list.body["total"], 1);

    let other_list = api.dispatch(Request::get("/equipment").with_tenant("globex"));
    assert_eq!(other_list.body["total"], 0);
}

#[test]
fn test_request_errors() {
    let api = dispatcher();

    let missing = api.dispatch(
        Request::post(
            "/rentals",
            json!({
                "equipment_id": "EQ-404",
                "customer": "Nobody",
                "start_date": "2024-05-10",
                "end_date": "2024-05-11"
            }),
        )
        .with_tenant("acme"),
    );
    assert_eq!(missing.status, 404);

    let malformed = api.dispatch(Request::post("/equipment", json!({ "name": "Saw" })));
    assert_eq!(malformed.status, 400);

    let unknown = api.dispatch(Request::get("/invoices"));
    assert_eq!(unknown.status, 404);
}
