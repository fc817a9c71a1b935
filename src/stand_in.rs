//! Generic stand-ins for test configurations.
//!
//! A [`StandIn`] is a behavior table keyed by method name. A contract opts in
//! by returning a [`StandInFactory`] from
//! [`Injectable::stand_in`](crate::Injectable::stand_in); the factory wraps the
//! shared table in a small adapter that implements the contract by delegating
//! every method to [`StandIn::invoke`].
//!
//! # Example
//!
//! ```rust
//! use autowire::{Constructor, Injectable, StandIn, StandInFactory};
//! use std::sync::Arc;
//!
//! trait Mailer: Send + Sync {
//!     fn send(&self, to: &str) -> bool;
//! }
//!
//! struct MailerStandIn(Arc<StandIn>);
//!
//! impl Mailer for MailerStandIn {
//!     fn send(&self, to: &str) -> bool {
//!         self.0.invoke("send", &to.to_string())
//!     }
//! }
//!
//! impl Injectable for dyn Mailer {
//!     fn constructor() -> Option<Constructor> {
//!         None
//!     }
//!
//!     fn stand_in() -> Option<StandInFactory> {
//!         Some(StandInFactory::new(&["send"], |s| {
//!             Arc::new(MailerStandIn(s)) as Arc<dyn Mailer>
//!         }))
//!     }
//! }
//!
//! let controller = Arc::new(StandIn::new("Mailer", &["send"]));
//! let mailer = MailerStandIn(Arc::clone(&controller));
//!
//! assert!(!mailer.send("a@example.com")); // unconfigured: Default::default()
//! controller.returns("send", true).unwrap();
//! assert!(mailer.send("a@example.com"));
//! assert_eq!(controller.calls("send"), 2);
//! assert!(controller.returns("receive", true).is_err());
//! ```

use crate::{DiError, Instance, Result};
use ahash::RandomState;
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::warn;

type Behavior = Arc<dyn Fn(&dyn Any) -> Box<dyn Any + Send> + Send + Sync>;

/// Runtime-programmable object with a fixed method surface.
pub struct StandIn {
    type_name: &'static str,
    surface: &'static [&'static str],
    behaviors: DashMap<&'static str, Behavior, RandomState>,
    calls: DashMap<&'static str, usize, RandomState>,
}

impl StandIn {
    /// A stand-in for `type_name` exposing exactly the methods in `surface`.
    pub fn new(type_name: &'static str, surface: &'static [&'static str]) -> Self {
        Self {
            type_name,
            surface,
            behaviors: DashMap::with_hasher(RandomState::new()),
            calls: DashMap::with_hasher(RandomState::new()),
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn surface(&self) -> &'static [&'static str] {
        self.surface
    }

    fn method(&self, method: &str) -> Result<&'static str> {
        self.surface
            .iter()
            .copied()
            .find(|m| *m == method)
            .ok_or_else(|| DiError::UnknownStandInMethod {
                type_name: self.type_name,
                method: method.to_string(),
            })
    }

    /// Make `method` return a clone of `value` on every call.
    pub fn returns<R>(&self, method: &str, value: R) -> Result<()>
    where
        R: Clone + Send + Sync + 'static,
    {
        let method = self.method(method)?;
        self.behaviors.insert(
            method,
            Arc::new(move |_: &dyn Any| Box::new(value.clone()) as Box<dyn Any + Send>),
        );
        Ok(())
    }

    /// Make `method` compute its result from the call's arguments.
    pub fn answers<A, R, F>(&self, method: &str, answer: F) -> Result<()>
    where
        A: 'static,
        R: Send + 'static,
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        let method = self.method(method)?;
        self.behaviors.insert(
            method,
            Arc::new(move |args: &dyn Any| match args.downcast_ref::<A>() {
                Some(args) => Box::new(answer(args)) as Box<dyn Any + Send>,
                None => Box::new(()) as Box<dyn Any + Send>,
            }),
        );
        Ok(())
    }

    /// Forget the configured behavior of `method`.
    pub fn clear(&self, method: &str) -> Result<()> {
        let method = self.method(method)?;
        self.behaviors.remove(method);
        Ok(())
    }

    /// Dispatch a call. Records it, then runs the configured behavior.
    ///
    /// Unconfigured methods, and behaviors producing a different type than
    /// `R`, yield `R::default()`. A method outside the surface is not
    /// recorded, logs a warning and also yields `R::default()`; use
    /// [`try_invoke`](Self::try_invoke) to get the error instead.
    pub fn invoke<A, R>(&self, method: &'static str, args: &A) -> R
    where
        A: 'static,
        R: Default + 'static,
    {
        self.try_invoke(method, args).unwrap_or_else(|_err| {
            #[cfg(feature = "logging")]
            warn!(
                target: "autowire",
                stand_in = self.type_name,
                method,
                error = %_err,
                "Call outside the stand-in surface"
            );
            R::default()
        })
    }

    /// Dispatch a call, rejecting methods outside the surface.
    pub fn try_invoke<A, R>(&self, method: &str, args: &A) -> Result<R>
    where
        A: 'static,
        R: Default + 'static,
    {
        let method = self.method(method)?;
        *self.calls.entry(method).or_insert(0) += 1;

        let behavior = self.behaviors.get(method).map(|b| Arc::clone(b.value()));
        Ok(behavior
            .and_then(|behavior| behavior(args as &dyn Any).downcast::<R>().ok())
            .map(|boxed| *boxed)
            .unwrap_or_default())
    }

    /// Dispatch a call without arguments.
    #[inline]
    pub fn call<R: Default + 'static>(&self, method: &'static str) -> R {
        self.invoke(method, &())
    }

    /// How many times `method` was invoked.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.get(method).map(|c| *c.value()).unwrap_or(0)
    }

    /// Forget all behaviors and call counts.
    pub fn reset(&self) {
        self.behaviors.clear();
        self.calls.clear();
    }
}

impl fmt::Debug for StandIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandIn")
            .field("type_name", &self.type_name)
            .field("surface", &self.surface)
            .field("configured", &self.behaviors.len())
            .finish()
    }
}

type WrapFn = Arc<dyn Fn(Arc<StandIn>) -> Instance + Send + Sync>;

/// Builds the contract-facing adapter around a shared [`StandIn`].
#[derive(Clone)]
pub struct StandInFactory {
    surface: &'static [&'static str],
    wrap: WrapFn,
}

impl StandInFactory {
    /// `wrap` turns the behavior table into an `Arc<T>` implementing the
    /// contract.
    pub fn new<T, F>(surface: &'static [&'static str], wrap: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<StandIn>) -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            surface,
            wrap: Arc::new(move |stand_in| Instance::from_arc(wrap(stand_in))),
        }
    }

    #[inline]
    pub fn surface(&self) -> &'static [&'static str] {
        self.surface
    }

    #[inline]
    pub(crate) fn wrap(&self, stand_in: Arc<StandIn>) -> Instance {
        (self.wrap)(stand_in)
    }
}

impl fmt::Debug for StandInFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandInFactory")
            .field("surface", &self.surface)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: &[&str] = &["lookup", "store"];

    #[test]
    fn test_unconfigured_returns_default() {
        let stand_in = StandIn::new("Cache", SURFACE);
        let hit: Option<String> = stand_in.invoke("lookup", &"key");
        assert!(hit.is_none());
        assert_eq!(stand_in.calls("lookup"), 1);
        assert_eq!(stand_in.calls("store"), 0);
    }

    #[test]
    fn test_answers_uses_arguments() {
        let stand_in = StandIn::new("Cache", SURFACE);
        stand_in
            .answers("lookup", |key: &String| Some(format!("value-of-{key}")))
            .unwrap();

        let hit: Option<String> = stand_in.invoke("lookup", &String::from("a"));
        assert_eq!(hit.as_deref(), Some("value-of-a"));

        // Wrong argument type falls back to the default
        let miss: Option<String> = stand_in.invoke("lookup", &7u32);
        assert!(miss.is_none());
    }

    #[test]
    fn test_surface_is_enforced() {
        let stand_in = StandIn::new("Cache", SURFACE);
        let err = stand_in.returns("evict", true).unwrap_err();
        assert!(matches!(err, DiError::UnknownStandInMethod { method, .. } if method == "evict"));
    }

    #[test]
    fn test_call_outside_surface_is_rejected() {
        let stand_in = StandIn::new("Cache", SURFACE);
        stand_in.returns("lookup", 5u32).unwrap();

        let err = stand_in.try_invoke::<_, u32>("lokup", &()).unwrap_err();
        assert!(matches!(err, DiError::UnknownStandInMethod { method, .. } if method == "lokup"));

        let fallback: u32 = stand_in.invoke("no_such_method", &());
        assert_eq!(fallback, 0);
        assert_eq!(stand_in.calls("no_such_method"), 0);
        assert_eq!(stand_in.try_invoke::<_, u32>("lookup", &()).unwrap(), 5);
        assert_eq!(stand_in.calls("lookup"), 1);
    }

    #[test]
    fn test_clear_and_reset() {
        let stand_in = StandIn::new("Cache", SURFACE);
        stand_in.returns("store", true).unwrap();
        assert!(stand_in.call::<bool>("store"));

        stand_in.clear("store").unwrap();
        assert!(!stand_in.call::<bool>("store"));

        stand_in.reset();
        assert_eq!(stand_in.calls("store"), 0);
    }
}
