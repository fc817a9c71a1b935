//! `#[derive(Injectable)]` end to end.
#![cfg(feature = "derive")]

use autowire::{Configuration, DiError, Injectable, Injector, contract, implements};
use std::sync::Arc;

#[derive(Injectable)]
struct Config;

#[derive(Injectable)]
struct Database {
    #[allow(dead_code)]
    config: Arc<Config>,
    #[inject(default = String::from("postgres://localhost"))]
    url: String,
}

trait Cache: Send + Sync {
    fn name(&self) -> &'static str;
}
contract!(dyn Cache);

#[derive(Injectable)]
struct MemoryCache;

impl Cache for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }
}

implements!(MemoryCache => dyn Cache);

#[derive(Injectable)]
struct UserService {
    db: Arc<Database>,
    #[inject(default)]
    cache: Option<Arc<dyn Cache>>,
    #[inject(skip)]
    request_count: u64,
    #[inject(default = 3)]
    retries: u32,
}

#[derive(Injectable)]
struct NeedsPort {
    #[allow(dead_code)]
    port: u16,
}

#[test]
fn test_derived_graph() {
    let injector = Injector::new(Configuration::new());
    let users = injector.get::<UserService>().unwrap();

    assert_eq!(users.db.url, "postgres://localhost");
    assert!(users.cache.is_none());
    assert_eq!(users.request_count, 0);
    assert_eq!(users.retries, 3);
    assert!(Arc::ptr_eq(&users.db, &injector.get::<Database>().unwrap()));
}

#[test]
fn test_derived_signature_order() {
    let signature = injector_signature::<UserService>();
    assert_eq!(signature, ["db", "cache", "retries"]);
}

fn injector_signature<T: Injectable>() -> Vec<&'static str> {
    let injector = Injector::new(Configuration::new());
    let key = autowire::TypeKey::of::<T>();
    injector
        .introspector()
        .signature_of(&key)
        .unwrap()
        .iter()
        .map(|p| p.name())
        .collect()
}

#[test]
fn test_derived_nullable_binding() {
    let mut config = Configuration::new();
    config.bind::<dyn Cache>().globally().to_class::<MemoryCache>();
    config
        .bind_key(autowire::TypeKey::optional(autowire::TypeKey::of::<dyn Cache>()))
        .unwrap()
        .globally()
        .to_class_any::<dyn Cache>();
    config
        .bind::<Database>()
        .globally()
        .with_kwarg("url", String::from("postgres://prod"));
    let injector = Injector::new(config);

    let users = injector.get::<UserService>().unwrap();
    assert_eq!(users.db.url, "postgres://prod");
    assert_eq!(users.cache.as_ref().map(|c| c.name()), Some("memory"));
}

#[test]
fn test_derived_scalar_without_default() {
    let injector = Injector::new(Configuration::new());
    assert!(matches!(
        injector.get::<NeedsPort>(),
        Err(DiError::UnresolvableType { .. })
    ));

    let mut config = Configuration::new();
    config.bind::<NeedsPort>().globally().with_kwarg("port", 8080u16);
    assert!(Injector::new(config).get::<NeedsPort>().is_ok());
}
