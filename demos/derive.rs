//! Example demonstrating the #[derive(Injectable)] macro
//!
//! Run with:
//!   cargo run --example derive --features derive

use autowire::{Configuration, Injectable, Injector, contract, implements};
use std::sync::Arc;

#[derive(Injectable)]
struct Database {
    #[inject(default = String::from("postgres://localhost"))]
    url: String,
}

trait Logger: Send + Sync {
    fn log(&self, line: &str);
}
contract!(dyn Logger);

#[derive(Injectable)]
struct StdoutLogger;

impl Logger for StdoutLogger {
    fn log(&self, line: &str) {
        println!("  [log] {line}");
    }
}

implements!(StdoutLogger => dyn Logger);

#[derive(Injectable)]
struct UserService {
    db: Arc<Database>,
    logger: Arc<dyn Logger>,
    #[inject(default)]
    audit: Option<Arc<dyn Logger>>,
    // Not a parameter; starts at Default
    #[inject(skip)]
    request_count: u64,
}

fn main() {
    println!("=== #[derive(Injectable)] Demo ===\n");

    let mut config = Configuration::new();
    config.bind::<dyn Logger>().globally().to_class::<StdoutLogger>();
    let injector = Injector::new(config);

    let users = injector.get::<UserService>().unwrap();
    users.logger.log(&format!("connected to {}", users.db.url));

    println!("Audit logger bound: {}", users.audit.is_some());
    println!("Request count: {}", users.request_count);
    println!(
        "Database shared with the injector: {}",
        Arc::ptr_eq(&users.db, &injector.get::<Database>().unwrap())
    );

    println!("\n=== Demo Complete ===");
}
