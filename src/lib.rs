//! # autowire - Constructor-Driven Dependency Injection for Rust
//!
//! Ask for a type and get it fully wired: the injector reads the type's
//! declared constructor parameters, resolves each one recursively, and caches
//! every instance it builds as a singleton.
//!
//! ## Features
//!
//! - 🔌 **Autowiring** - Unbound types are built from their own constructor
//! - 🎯 **Scoped bindings** - Override a dependency for one consumer only
//! - 🧩 **Four strategies** - Fixed instance, substitute type, factory, or default
//! - 🔁 **Cycle detection** - Reported with the full chain, never a stack overflow
//! - 🧪 **Test registries** - Explicit-only and auto-stand-in configurations
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use autowire::{Configuration, Constructor, Injectable, Injector, Signature};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! impl Injectable for Database {
//!     fn constructor() -> Option<Constructor> {
//!         Some(Constructor::new(
//!             || Signature::new().scalar_or("url", String::from("postgres://localhost")),
//!             |args| Ok(Database { url: args.value("url")? }),
//!         ))
//!     }
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     fn constructor() -> Option<Constructor> {
//!         Some(Constructor::new(
//!             || Signature::new().param::<Database>("db"),
//!             |args| Ok(UserService { db: args.get("db")? }),
//!         ))
//!     }
//! }
//!
//! let injector = Injector::new(Configuration::new());
//! let users = injector.get::<UserService>().unwrap();
//! assert_eq!(users.db.url, "postgres://localhost");
//! assert!(Arc::ptr_eq(&users.db, &injector.get::<Database>().unwrap()));
//! ```
//!
//! ## Bindings
//!
//! ```rust
//! use autowire::{contract, implements, Configuration, Constructor, Injectable, Injector, Signature};
//! use std::sync::Arc;
//!
//! trait Storage: Send + Sync {
//!     fn name(&self) -> &str;
//! }
//! contract!(dyn Storage);
//!
//! struct Disk;
//! impl Storage for Disk {
//!     fn name(&self) -> &str {
//!         "disk"
//!     }
//! }
//! impl Injectable for Disk {
//!     fn constructor() -> Option<Constructor> {
//!         Some(Constructor::new(Signature::new, |_| Ok(Disk)))
//!     }
//! }
//! implements!(Disk => dyn Storage);
//!
//! struct Memory;
//! impl Storage for Memory {
//!     fn name(&self) -> &str {
//!         "memory"
//!     }
//! }
//!
//! struct Uploader {
//!     storage: Arc<dyn Storage>,
//! }
//! impl Injectable for Uploader {
//!     fn constructor() -> Option<Constructor> {
//!         Some(Constructor::new(
//!             || Signature::new().param::<dyn Storage>("storage"),
//!             |args| Ok(Uploader { storage: args.get("storage")? }),
//!         ))
//!     }
//! }
//!
//! let mut config = Configuration::new();
//! // Everyone gets the disk...
//! config.bind::<dyn Storage>().globally().to_class::<Disk>();
//! // ...except the uploader
//! config
//!     .bind::<dyn Storage>()
//!     .for_parent::<Uploader>()
//!     .to_instance(Arc::new(Memory));
//!
//! let injector = Injector::new(config);
//! assert_eq!(injector.get::<dyn Storage>().unwrap().name(), "disk");
//! assert_eq!(injector.get::<Uploader>().unwrap().storage.name(), "memory");
//! ```
//!
//! ## Performance
//!
//! - **Lock-free reads**: Cache hits go through `DashMap` without taking the build lock
//! - **AHash**: Faster hashing for type keys
//! - **Memoized signatures**: Each constructor declares its parameters once

mod error;
mod injector;
mod instance;
mod introspect;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod registry;
mod signature;
mod stand_in;
pub mod testing;

pub use error::*;
pub use injector::*;
pub use instance::*;
pub use introspect::*;
pub use key::*;
pub use provider::*;
pub use registry::*;
pub use signature::*;
pub use stand_in::*;

#[cfg(feature = "derive")]
pub use autowire_derive::Injectable;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Args, Configuration, Constructor, DiError, Fallback, Implements, Injectable, Injector,
        Result, Signature, StandIn, StandInFactory, TypeKey, contract, implements,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Database {
        url: String,
    }

    impl Injectable for Database {
        fn constructor() -> Option<Constructor> {
            Some(Constructor::new(
                || Signature::new().scalar_or("url", String::from("sqlite::memory:")),
                |args| Ok(Database { url: args.value("url")? }),
            ))
        }
    }

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

    #[test]
    fn test_autowired_singletons() {
        let injector = Injector::new(Configuration::new());
        let users = injector.get::<UserService>().unwrap();

        assert_eq!(users.db.url, "sqlite::memory:");
        assert!(Arc::ptr_eq(&users, &injector.get::<UserService>().unwrap()));
        assert!(Arc::ptr_eq(&users.db, &injector.get::<Database>().unwrap()));
    }

    #[test]
    fn test_to_instance_skips_constructor() {
        static BUILT: AtomicU32 = AtomicU32::new(0);

        struct Expensive;
        impl Injectable for Expensive {
            fn constructor() -> Option<Constructor> {
                Some(Constructor::new(Signature::new, |_| {
                    BUILT.fetch_add(1, Ordering::SeqCst);
                    Ok(Expensive)
                }))
            }
        }

        let fixed = Arc::new(Expensive);
        let mut config = Configuration::new();
        config.bind::<Expensive>().globally().to_instance(Arc::clone(&fixed));
        let injector = Injector::new(config);

        assert!(Arc::ptr_eq(&fixed, &injector.get::<Expensive>().unwrap()));
        assert_eq!(BUILT.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_kwarg_override() {
        let mut config = Configuration::new();
        config
            .bind::<Database>()
            .globally()
            .with_kwarg("url", String::from("postgres://prod"));
        let injector = Injector::new(config);

        assert_eq!(injector.get::<UserService>().unwrap().db.url, "postgres://prod");
    }

    #[test]
    fn test_unresolvable_contract() {
        trait Missing: Send + Sync {}
        contract!(dyn Missing);

        let injector = Injector::new(Configuration::new());
        let err = injector.get::<dyn Missing>().err().unwrap();
        assert!(matches!(err, DiError::UnresolvableType { .. }));
        assert!(injector.try_get::<dyn Missing>().is_none());
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let injector = Injector::new(Configuration::with_fallback(Fallback::Construct));
        let db: Result<Arc<Database>> = injector.get();
        assert!(db.is_ok());
    }
}
