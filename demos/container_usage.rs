//! Service registry usage
//!
//! Registers a small graph by key, resolves it, and prints what the registry
//! knows about it.
//!
//! Run with `cargo run --example container_usage`.

use rentalhub::infrastructure::container::ServiceRegistry;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Config {
    app_name: String,
}

#[derive(Debug)]
struct Logger {
    app_name: String,
}

impl Logger {
    fn log(&self, message: &str) {
        println!("[{}] {}", self.app_name, message);
    }
}

struct DatabaseService {
    logger: Arc<Logger>,
}

struct Request {
    id: u32,
    db: Arc<DatabaseService>,
}

fn main() -> anyhow::Result<()> {
    let registry = ServiceRegistry::new();

    println!("1. Register services (order does not matter)");
    let next = AtomicU32::new(1);
    registry.register_transient("request", &["database"], move |deps| {
        Ok(Request {
            id: next.fetch_add(1, Ordering::SeqCst),
            db: deps.get(0)?,
        })
    });
    registry.register_singleton("database", &["logger"], |deps| {
        let logger = deps.get::<Logger>(0)?;
        logger.log("Initializing database service");
        Ok(DatabaseService { logger })
    });
    registry.register_singleton("logger", &["config"], |deps| {
        let config = deps.get::<Config>(0)?;
        Ok(Logger {
            app_name: config.app_name.clone(),
        })
    });
    registry.register_instance(
        "config",
        Arc::new(Config {
            app_name: "RentalHub".to_string(),
        }),
    );

    registry.validate()?;
    println!("   order for 'request': {:?}", registry.dependency_order("request")?);

    println!("\n2. Resolve");
    let first = registry.resolve::<Request>("request")?;
    let second = registry.resolve::<Request>("request")?;
    first.db.logger.log(&format!("request #{} served", first.id));
    second.db.logger.log(&format!("request #{} served", second.id));
    println!(
        "   requests share the database: {}",
        Arc::ptr_eq(&first.db, &second.db)
    );

    println!("\n3. Missing keys are errors");
    if let Err(err) = registry.resolve::<Config>("cache") {
        println!("   {err}");
    }

    println!("\n4. Registry contents");
    for info in registry.describe() {
        println!("   {:<10} {:<9} {:?}", info.key, info.kind.to_string(), info.dependencies);
    }
    println!("\n{}", registry.stats().performance_summary());
    println!("\n{}", registry.to_dot());
    Ok(())
}
