//! Provider traits for dependency injection
//!
//! These traits describe what the injector may build and how contracts map to
//! implementations.

use crate::signature::Constructor;
use crate::stand_in::StandInFactory;
use std::sync::Arc;

/// A type the injector can resolve.
///
/// Implementations supply the metadata the injector cannot discover on its
/// own: the constructor to call when nothing overrides it, and optionally a
/// stand-in for test configurations. Abstract contracts (`dyn Trait`) return
/// `None` from [`constructor`](Injectable::constructor) and must be bound.
///
/// With the `derive` feature, `#[derive(Injectable)]` writes this impl from a
/// struct's fields. [`contract!`](crate::contract) covers types that are only
/// ever bound.
///
/// # Examples
///
/// ```rust
/// use autowire::{Constructor, Injectable, Signature};
/// use std::sync::Arc;
///
/// struct Database;
///
/// impl Injectable for Database {
///     fn constructor() -> Option<Constructor> {
///         Some(Constructor::new(Signature::new, |_| Ok(Database)))
///     }
/// }
///
/// struct UserRepository {
///     db: Arc<Database>,
/// }
///
/// impl Injectable for UserRepository {
///     fn constructor() -> Option<Constructor> {
///         Some(Constructor::new(
///             || Signature::new().param::<Database>("db"),
///             |args| Ok(UserRepository { db: args.get("db")? }),
///         ))
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + 'static {
    /// Constructor used by the default strategy. `None` marks an abstract
    /// contract.
    fn constructor() -> Option<Constructor>;

    /// Stand-in used by auto-stand-in configurations when the type is unbound.
    fn stand_in() -> Option<StandInFactory> {
        None
    }
}

/// Declares that `Self` can stand in for contract `I`.
///
/// Binding `I` with `to_class::<Self>()` resolves `Self` and hands the same
/// object out as an `Arc<I>`. Every injectable type implements itself.
pub trait Implements<I: ?Sized + Injectable>: Injectable + Sized {
    fn upcast(self: Arc<Self>) -> Arc<I>;
}

impl<T: Injectable> Implements<T> for T {
    #[inline]
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Implement [`Injectable`] for types that have no constructor of their own,
/// typically trait objects.
///
/// ```rust
/// use autowire::contract;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// contract!(dyn Clock);
/// ```
#[macro_export]
macro_rules! contract {
    ($($contract:ty),+ $(,)?) => {
        $(
            impl $crate::Injectable for $contract {
                fn constructor() -> ::std::option::Option<$crate::Constructor> {
                    ::std::option::Option::None
                }
            }
        )+
    };
}

/// Implement [`Implements`] for an implementation and one or more contracts.
///
/// ```rust
/// use autowire::{contract, implements, Constructor, Injectable, Signature};
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
/// contract!(dyn Clock);
///
/// struct FixedClock;
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 {
///         0
///     }
/// }
/// impl Injectable for FixedClock {
///     fn constructor() -> Option<Constructor> {
///         Some(Constructor::new(Signature::new, |_| Ok(FixedClock)))
///     }
/// }
///
/// implements!(FixedClock => dyn Clock);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($contract:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$contract> for $implementation {
                fn upcast(self: $crate::Arc<Self>) -> $crate::Arc<$contract> {
                    self
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Signature, TypeKey};

    trait Shape: Send + Sync {
        fn sides(&self) -> u32;
    }
    contract!(dyn Shape);

    struct Square;

    impl Shape for Square {
        fn sides(&self) -> u32 {
            4
        }
    }

    impl Injectable for Square {
        fn constructor() -> Option<Constructor> {
            Some(Constructor::new(Signature::new, |_| Ok(Square)))
        }
    }

    implements!(Square => dyn Shape);

    #[test]
    fn test_contract_has_no_constructor() {
        assert!(<dyn Shape as Injectable>::constructor().is_none());
        assert!(<dyn Shape as Injectable>::stand_in().is_none());
        assert!(Square::constructor().is_some());
    }

    #[test]
    fn test_upcast_preserves_allocation() {
        let square = Arc::new(Square);
        let shape: Arc<dyn Shape> = <Square as Implements<dyn Shape>>::upcast(Arc::clone(&square));
        assert_eq!(shape.sides(), 4);
        assert!(std::ptr::addr_eq(Arc::as_ptr(&shape), Arc::as_ptr(&square)));
    }

    #[test]
    fn test_every_type_implements_itself() {
        let square = Arc::new(Square);
        let same = <Square as Implements<Square>>::upcast(Arc::clone(&square));
        assert!(Arc::ptr_eq(&square, &same));
        assert_ne!(TypeKey::of::<Square>(), TypeKey::of::<dyn Shape>());
    }
}
