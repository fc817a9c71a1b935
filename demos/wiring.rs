//! Wiring a small application with scoped bindings and a test registry
//!
//! Run with:
//!   cargo run --example wiring

use autowire::{
    Configuration, Constructor, Injectable, Injector, Signature, StandIn, StandInFactory,
    implements,
};
use std::sync::Arc;

struct CacheClient {
    pool: String,
}

impl Injectable for CacheClient {
    fn constructor() -> Option<Constructor> {
        Some(Constructor::new(
            || Signature::new().scalar::<String>("pool"),
            |args| Ok(CacheClient { pool: args.value("pool")? }),
        ))
    }
}

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

struct ClockStandIn(Arc<StandIn>);

impl Clock for ClockStandIn {
    fn now(&self) -> u64 {
        self.0.call("now")
    }
}

impl Injectable for dyn Clock {
    fn constructor() -> Option<Constructor> {
        None
    }

    fn stand_in() -> Option<StandInFactory> {
        Some(StandInFactory::new(&["now"], |s| {
            Arc::new(ClockStandIn(s)) as Arc<dyn Clock>
        }))
    }
}

struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl Injectable for SystemClock {
    fn constructor() -> Option<Constructor> {
        Some(Constructor::new(Signature::new, |_| Ok(SystemClock)))
    }
}

implements!(SystemClock => dyn Clock);

struct FooDataAccess {
    cache: Arc<CacheClient>,
    clock: Arc<dyn Clock>,
}

impl Injectable for FooDataAccess {
    fn constructor() -> Option<Constructor> {
        Some(Constructor::new(
            || {
                Signature::new()
                    .param::<CacheClient>("cache")
                    .param::<dyn Clock>("clock")
            },
            |args| {
                Ok(FooDataAccess {
                    cache: args.get("cache")?,
                    clock: args.get("clock")?,
                })
            },
        ))
    }
}

struct BarDataAccess {
    cache: Arc<CacheClient>,
}

impl Injectable for BarDataAccess {
    fn constructor() -> Option<Constructor> {
        Some(Constructor::new(
            || Signature::new().param::<CacheClient>("cache"),
            |args| Ok(BarDataAccess { cache: args.get("cache")? }),
        ))
    }
}

fn production() -> Configuration {
    let mut config = Configuration::new();
    config
        .bind::<CacheClient>()
        .globally()
        .with_kwarg("pool", String::from("DEFAULT"));
    config
        .bind::<CacheClient>()
        .for_parent::<FooDataAccess>()
        .with_kwarg("pool", String::from("BEST_EFFORT"));
    config.bind::<dyn Clock>().globally().to_class::<SystemClock>();
    config
}

fn main() {
    println!("=== Wiring Demo ===\n");

    let injector = Injector::new(production());
    let foo = injector.get::<FooDataAccess>().unwrap();
    let bar = injector.get::<BarDataAccess>().unwrap();
    println!("Foo pool: {}", foo.cache.pool);
    println!("Bar pool: {}", bar.cache.pool);
    println!("Foo clock reads {}", foo.clock.now());
    println!("Cached slots: {}", injector.cached_len());

    // Same object under test, with every unbound collaborator stubbed
    let mut config = Configuration::auto_stand_in();
    config.bind::<FooDataAccess>().globally();
    config
        .bind::<CacheClient>()
        .globally()
        .with_kwarg("pool", String::from("TEST"));
    let injector = Injector::new(config);

    let foo = injector.get::<FooDataAccess>().unwrap();
    let clock = injector.stand_in::<dyn Clock>().unwrap();
    clock.returns("now", 1_700_000_000u64).unwrap();
    println!("\nTest pool: {}", foo.cache.pool);
    println!("Stubbed clock reads {}", foo.clock.now());
    println!("Clock calls recorded: {}", clock.calls("now"));

    println!("\n=== Demo Complete ===");
}
