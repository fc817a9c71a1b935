//! Signature extraction with memoization.
//!
//! Introspection is a pure function of the callable, so results are kept for
//! the life of the introspector: each [`Constructor`] memoizes its own
//! parameter list, and default constructors are memoized per type key.

use crate::signature::{Constructor, ParamSpec};
use crate::{DiError, Result, TypeKey};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Produces ordered parameter lists for types and factories.
pub struct Introspector {
    defaults: DashMap<TypeKey, Option<Constructor>, RandomState>,
}

impl Introspector {
    #[inline]
    pub fn new() -> Self {
        Self {
            defaults: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
        }
    }

    /// The type's own constructor.
    ///
    /// Fails with `UnresolvableType` for abstract contracts, scalars and
    /// composite keys, none of which can be constructed directly.
    pub fn constructor_for(&self, key: &TypeKey) -> Result<Constructor> {
        if let Some(known) = self.defaults.get(key) {
            return known
                .value()
                .clone()
                .ok_or_else(|| DiError::unresolvable(key.to_string()));
        }

        let constructor = key.type_info().and_then(|info| info.constructor());

        #[cfg(feature = "logging")]
        debug!(
            target: "autowire",
            service = %key,
            constructible = constructor.is_some(),
            "Looked up default constructor"
        );

        self.defaults
            .entry(key.clone())
            .or_insert(constructor)
            .value()
            .clone()
            .ok_or_else(|| DiError::unresolvable(key.to_string()))
    }

    /// Ordered parameter list of `constructor`, computed once per callable.
    pub fn extract_signature(&self, constructor: &Constructor) -> Arc<[ParamSpec]> {
        Arc::clone(constructor.memo.get_or_init(|| {
            #[cfg(feature = "logging")]
            trace!(
                target: "autowire",
                produces = constructor.produces(),
                "Introspecting constructor signature"
            );

            constructor.declare().into_params().into()
        }))
    }

    /// Parameter list of a type's own constructor.
    pub fn signature_of(&self, key: &TypeKey) -> Result<Arc<[ParamSpec]>> {
        let constructor = self.constructor_for(key)?;
        Ok(self.extract_signature(&constructor))
    }

    /// Number of types whose default constructor has been looked up.
    #[inline]
    pub fn len(&self) -> usize {
        self.defaults.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty()
    }
}

impl Default for Introspector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Introspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Introspector")
            .field("known_types", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{contract, Injectable, Signature};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Engine;

    static DECLARED: AtomicU32 = AtomicU32::new(0);

    impl Injectable for Engine {
        fn constructor() -> Option<Constructor> {
            Some(Constructor::new(
                || {
                    DECLARED.fetch_add(1, Ordering::SeqCst);
                    Signature::new().scalar_or("cylinders", 4u8)
                },
                |_| Ok(Engine),
            ))
        }
    }

    trait Vehicle: Send + Sync {}
    contract!(dyn Vehicle);

    #[test]
    fn test_signature_is_memoized() {
        let introspector = Introspector::new();
        let key = TypeKey::of::<Engine>();

        let first = introspector.signature_of(&key).unwrap();
        let second = introspector.signature_of(&key).unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name(), "cylinders");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(DECLARED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_contract_is_unresolvable() {
        let introspector = Introspector::new();
        let err = introspector
            .constructor_for(&TypeKey::of::<dyn Vehicle>())
            .unwrap_err();
        assert!(matches!(err, DiError::UnresolvableType { .. }));
        // The negative answer is memoized too
        assert_eq!(introspector.len(), 1);
        assert!(introspector.signature_of(&TypeKey::of::<dyn Vehicle>()).is_err());
    }

    #[test]
    fn test_scalar_and_composite_are_unresolvable() {
        let introspector = Introspector::new();
        assert!(introspector.constructor_for(&TypeKey::scalar::<String>()).is_err());
        assert!(introspector
            .constructor_for(&TypeKey::optional(TypeKey::of::<Engine>()))
            .is_err());
    }
}
