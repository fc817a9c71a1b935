//! Benchmarks for the injector

use autowire::{Configuration, Constructor, Injectable, Injector, Signature};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

#[allow(dead_code)]
struct Config {
    url: String,
}

impl Injectable for Config {
    fn constructor() -> Option<Constructor> {
        Some(Constructor::new(
            || Signature::new().scalar_or("url", String::from("postgres://localhost")),
            |args| Ok(Config { url: args.value("url")? }),
        ))
    }
}

#[allow(dead_code)]
struct Database {
    config: Arc<Config>,
}

impl Injectable for Database {
    fn constructor() -> Option<Constructor> {
        Some(Constructor::new(
            || Signature::new().param::<Config>("config"),
            |args| Ok(Database { config: args.get("config")? }),
        ))
    }
}

#[allow(dead_code)]
struct Cache {
    config: Arc<Config>,
}

impl Injectable for Cache {
    fn constructor() -> Option<Constructor> {
        Some(Constructor::new(
            || Signature::new().param::<Config>("config"),
            |args| Ok(Cache { config: args.get("config")? }),
        ))
    }
}

#[allow(dead_code)]
struct UserService {
    db: Arc<Database>,
    cache: Arc<Cache>,
}

impl Injectable for UserService {
    fn constructor() -> Option<Constructor> {
        Some(Constructor::new(
            || Signature::new().param::<Database>("db").param::<Cache>("cache"),
            |args| {
                Ok(UserService {
                    db: args.get("db")?,
                    cache: args.get("cache")?,
                })
            },
        ))
    }
}

fn scoped_config() -> Configuration {
    let mut config = Configuration::new();
    config
        .bind::<Config>()
        .globally()
        .with_kwarg("url", String::from("postgres://primary"));
    config
        .bind::<Config>()
        .for_parent::<Cache>()
        .with_kwarg("url", String::from("redis://cache"));
    config
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    group.bench_function("cached_leaf", |b| {
        let injector = Injector::new(Configuration::new());
        injector.get::<Config>().unwrap();
        b.iter(|| black_box(injector.get::<Config>().unwrap()))
    });

    group.bench_function("cached_graph", |b| {
        let injector = Injector::new(Configuration::new());
        injector.get::<UserService>().unwrap();
        b.iter(|| black_box(injector.get::<UserService>().unwrap()))
    });

    group.bench_function("cold_graph", |b| {
        b.iter(|| {
            let injector = Injector::new(Configuration::new());
            black_box(injector.get::<UserService>().unwrap())
        })
    });

    group.bench_function("cold_graph_scoped", |b| {
        b.iter(|| {
            let injector = Injector::new(scoped_config());
            black_box(injector.get::<UserService>().unwrap())
        })
    });

    group.finish();
}

fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for threads in [2usize, 4, 8] {
        group.bench_with_input(BenchmarkId::new("cached_graph", threads), &threads, |b, &n| {
            let injector = Injector::new(Configuration::new());
            injector.get::<UserService>().unwrap();
            b.iter(|| {
                std::thread::scope(|scope| {
                    for _ in 0..n {
                        scope.spawn(|| {
                            for _ in 0..100 {
                                black_box(injector.get::<UserService>().unwrap());
                            }
                        });
                    }
                })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolution, bench_concurrent);
criterion_main!(benches);
