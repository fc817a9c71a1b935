//! Test-mode configurations.
//!
//! These only change what happens to a type with no binding at all. Explicit
//! bindings resolve exactly as in production.
//!
//! - [`Configuration::explicit_only`]: unbound types fail with
//!   [`DiError::NotBound`](crate::DiError::NotBound), so a test composition
//!   root must name every collaborator.
//! - [`Configuration::auto_stand_in`]: unbound types resolve to a stand-in
//!   built once per injector, so `get::<Dependency>()` after building the
//!   object under test returns the very stand-in it holds.
//!
//! ```rust
//! use autowire::{Configuration, Constructor, Injectable, Injector, Signature, StandIn, StandInFactory};
//! use std::sync::Arc;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct ClockStandIn(Arc<StandIn>);
//! impl Clock for ClockStandIn {
//!     fn now(&self) -> u64 {
//!         self.0.call("now")
//!     }
//! }
//!
//! impl Injectable for dyn Clock {
//!     fn constructor() -> Option<Constructor> {
//!         None
//!     }
//!     fn stand_in() -> Option<StandInFactory> {
//!         Some(StandInFactory::new(&["now"], |s| Arc::new(ClockStandIn(s)) as Arc<dyn Clock>))
//!     }
//! }
//!
//! struct Scheduler {
//!     clock: Arc<dyn Clock>,
//! }
//!
//! impl Injectable for Scheduler {
//!     fn constructor() -> Option<Constructor> {
//!         Some(Constructor::new(
//!             || Signature::new().param::<dyn Clock>("clock"),
//!             |args| Ok(Scheduler { clock: args.get("clock")? }),
//!         ))
//!     }
//! }
//!
//! let mut config = Configuration::auto_stand_in();
//! config.bind::<Scheduler>().globally();
//! let injector = Injector::new(config);
//!
//! let scheduler = injector.get::<Scheduler>().unwrap();
//! injector.stand_in::<dyn Clock>().unwrap().returns("now", 42u64).unwrap();
//! assert_eq!(scheduler.clock.now(), 42);
//! ```

use crate::registry::{Configuration, Fallback};

impl Configuration {
    /// Registry in which every resolved type must be bound.
    #[inline]
    pub fn explicit_only() -> Self {
        Self::with_fallback(Fallback::Error)
    }

    /// Registry in which unbound types resolve to generic stand-ins.
    #[inline]
    pub fn auto_stand_in() -> Self {
        Self::with_fallback(Fallback::StandIn)
    }
}
