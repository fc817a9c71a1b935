//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```
//!
//! `RUST_LOG=autowire=trace` also shows cache hits.

use autowire::{Configuration, Constructor, Injectable, Injector, Signature};
use std::sync::Arc;

#[allow(dead_code)]
struct Database {
    url: String,
}

impl Injectable for Database {
    fn constructor() -> Option<Constructor> {
        Some(Constructor::new(
            || Signature::new().scalar::<String>("url"),
            |args| Ok(Database { url: args.value("url")? }),
        ))
    }
}

#[allow(dead_code)]
struct UserService {
    db: Arc<Database>,
}

impl Injectable for UserService {
    fn constructor() -> Option<Constructor> {
        Some(Constructor::new(
            || Signature::new().param::<Database>("db"),
            |args| Ok(UserService { db: args.get("db")? }),
        ))
    }
}

fn main() {
    // JSON if logging-json is enabled, pretty otherwise
    autowire::logging::builder().trace().injector_only().init();

    println!("=== autowire Logging Demo ===\n");

    // Logs: "Registering binding" (debug), then "Dropping parameter
    // overrides" (warn) for the stray kwarg on a fixed instance
    let mut config = Configuration::new();
    config
        .bind::<Database>()
        .globally()
        .with_kwarg("url", String::from("postgres://localhost/mydb"));
    config
        .bind::<Database>()
        .for_parent::<UserService>()
        .with_kwarg("url", String::from("ignored"))
        .to_instance(Arc::new(Database {
            url: "postgres://replica/mydb".into(),
        }));

    // Logs: "Creating injector"
    let injector = Injector::new(config);

    // Logs: "Looked up default constructor", "Built instance", "Committing built instances"
    let _users = injector.get::<UserService>().unwrap();

    // Logs: "Resolved from cache" (trace)
    let _again = injector.get::<UserService>().unwrap();

    // Root request for the database uses the global rule
    let _db = injector.get::<Database>().unwrap();

    // Unbound scalar parameter: fails, nothing cached
    struct Port;
    impl Injectable for Port {
        fn constructor() -> Option<Constructor> {
            Some(Constructor::new(
                || Signature::new().scalar::<u16>("port"),
                |_| Ok(Port),
            ))
        }
    }
    if let Err(err) = injector.get::<Port>() {
        println!("  [App] expected failure: {err}");
    }

    println!("\n=== Demo Complete ===");
    println!("Cached slots: {}", injector.cached_len());
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
