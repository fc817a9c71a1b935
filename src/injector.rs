//! The object-graph builder.
//!
//! An [`Injector`] owns a [`Configuration`], an [`Introspector`] and a
//! singleton cache keyed by `(target, matched scope)`. `get::<T>()` runs the
//! registry lookup, returns the cached instance if one exists, and otherwise
//! builds it by recursively resolving every constructor parameter.

use crate::registry::{Binding, Fallback, Lookup, Strategy};
use crate::signature::{Args, Constructor, ParamSpec};
use crate::stand_in::StandIn;
use crate::{Configuration, DiError, Injectable, Instance, Introspector, Result, ScopeKey, TypeKey};
use ahash::RandomState;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Cache slot: the target and the scope its binding matched under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    target: TypeKey,
    scope: ScopeKey,
}

/// State of one root request.
///
/// `stack` holds the targets being built, outermost first. Everything built
/// on the way is staged here and only reaches the shared cache once the root
/// request succeeds.
#[derive(Default)]
struct BuildState {
    stack: Vec<CacheKey>,
    staged: HashMap<CacheKey, Instance, RandomState>,
    stand_ins: HashMap<TypeKey, Arc<StandIn>, RandomState>,
}

impl BuildState {
    fn enter(&mut self, key: &CacheKey) -> Result<()> {
        if self.stack.contains(key) {
            let start = self.stack.iter().position(|k| k == key).unwrap_or(0);
            let chain = self.stack[start..]
                .iter()
                .map(|k| k.target.to_string())
                .chain(std::iter::once(key.target.to_string()))
                .collect();
            return Err(DiError::CircularDependency { chain });
        }
        self.stack.push(key.clone());
        Ok(())
    }

    fn leave(&mut self) {
        self.stack.pop();
    }
}

/// Held for the duration of a cache miss. Clears the owner before the lock
/// is released.
struct BuildGuard<'a> {
    _lock: MutexGuard<'a, ()>,
    owner: &'a Mutex<Option<ThreadId>>,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        *self.owner.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// How the current request will be satisfied.
enum Plan<'a> {
    Bound(&'a Binding),
    Construct,
    StandIn,
}

struct Inner {
    config: Configuration,
    introspector: Introspector,
    cache: DashMap<CacheKey, Instance, RandomState>,
    stand_ins: DashMap<TypeKey, Arc<StandIn>, RandomState>,
    /// Serializes cache misses so a slot is built at most once.
    build_lock: Mutex<()>,
    /// Thread currently holding `build_lock`.
    owner: Mutex<Option<ThreadId>>,
}

/// Builds and caches fully wired instances.
///
/// Every resolved instance is a singleton for its `(type, matched scope)`
/// slot, for the lifetime of the injector. Cloning the injector shares the
/// cache.
///
/// A failed request leaves the cache untouched, including the dependencies
/// it managed to build before failing.
///
/// Constructors must not call back into the injector that is building them;
/// such calls fail with [`DiError::ReentrantResolution`] unless the requested
/// instance is already cached.
///
/// # Examples
///
/// ```rust
/// use autowire::{Configuration, Constructor, Injectable, Injector, Signature};
/// use std::sync::Arc;
///
/// struct Dependency;
///
/// impl Injectable for Dependency {
///     fn constructor() -> Option<Constructor> {
///         Some(Constructor::new(Signature::new, |_| Ok(Dependency)))
///     }
/// }
///
/// struct ClassToTest {
///     dep: Arc<Dependency>,
/// }
///
/// impl Injectable for ClassToTest {
///     fn constructor() -> Option<Constructor> {
///         Some(Constructor::new(
///             || Signature::new().param::<Dependency>("dep"),
///             |args| Ok(ClassToTest { dep: args.get("dep")? }),
///         ))
///     }
/// }
///
/// let injector = Injector::new(Configuration::new());
/// let built = injector.get::<ClassToTest>().unwrap();
/// assert!(Arc::ptr_eq(&built.dep, &injector.get::<Dependency>().unwrap()));
/// ```
#[derive(Clone)]
pub struct Injector {
    inner: Arc<Inner>,
}

impl Injector {
    /// Create an injector with an empty cache.
    pub fn new(config: Configuration) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "autowire",
            bindings = config.len(),
            fallback = ?config.fallback(),
            "Creating injector"
        );

        Self {
            inner: Arc::new(Inner {
                config,
                introspector: Introspector::new(),
                cache: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
                stand_ins: DashMap::with_hasher(RandomState::new()),
                build_lock: Mutex::new(()),
                owner: Mutex::new(None),
            }),
        }
    }

    /// The configuration this injector was built from.
    #[inline]
    pub fn configuration(&self) -> &Configuration {
        &self.inner.config
    }

    /// The introspector used for constructor signatures.
    #[inline]
    pub fn introspector(&self) -> &Introspector {
        &self.inner.introspector
    }

    /// Resolve `T` as a root request.
    pub fn get<T: ?Sized + Injectable>(&self) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        let instance = self.get_key(&key)?;
        instance.downcast::<T>().ok_or_else(|| {
            DiError::creation_failed(
                key.to_string(),
                format!("binding produced {}", instance.type_name()),
            )
        })
    }

    /// Resolve `T`, discarding the error.
    #[inline]
    pub fn try_get<T: ?Sized + Injectable>(&self) -> Option<Arc<T>> {
        self.get::<T>().ok()
    }

    /// Resolve any key as a root request, e.g. a union binding.
    pub fn get_key(&self, key: &TypeKey) -> Result<Instance> {
        if let Some(hit) = self.cached(key) {
            #[cfg(feature = "logging")]
            trace!(target: "autowire", service = %key, "Resolved from cache");
            return Ok(hit);
        }

        let _guard = self.begin_build(key)?;
        let mut state = BuildState::default();
        let instance = self.resolve(key, None, &mut state)?;
        self.commit(state);
        Ok(instance)
    }

    /// Take the build lock, refusing re-entry from the thread that holds it.
    fn begin_build(&self, key: &TypeKey) -> Result<BuildGuard<'_>> {
        let current = thread::current().id();
        let owner = &self.inner.owner;
        if *owner.lock().unwrap_or_else(PoisonError::into_inner) == Some(current) {
            #[cfg(feature = "logging")]
            debug!(target: "autowire", service = %key, "Rejecting re-entrant resolution");
            return Err(DiError::ReentrantResolution {
                type_name: key.to_string(),
            });
        }

        let lock = self
            .inner
            .build_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *owner.lock().unwrap_or_else(PoisonError::into_inner) = Some(current);
        Ok(BuildGuard { _lock: lock, owner })
    }

    /// Publish everything a successful request built.
    fn commit(&self, state: BuildState) {
        #[cfg(feature = "logging")]
        debug!(
            target: "autowire",
            instances = state.staged.len(),
            stand_ins = state.stand_ins.len(),
            "Committing built instances"
        );

        for (slot, instance) in state.staged {
            self.inner.cache.insert(slot, instance);
        }
        for (key, controller) in state.stand_ins {
            self.inner.stand_ins.entry(key).or_insert(controller);
        }
    }

    /// The controller of `T`'s stand-in, building the stand-in if needed.
    ///
    /// Only available when `T` resolved to a stand-in, i.e. under
    /// [`Fallback::StandIn`] with no binding for `T`.
    pub fn stand_in<T: ?Sized + Injectable>(&self) -> Result<Arc<StandIn>> {
        let key = TypeKey::of::<T>();
        self.get_key(&key)?;
        self.inner
            .stand_ins
            .get(&key)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(|| DiError::NoStandIn {
                type_name: key.to_string(),
            })
    }

    /// True if a root request for `T` would be served from the cache.
    pub fn contains_cached<T: ?Sized + Injectable>(&self) -> bool {
        self.cached(&TypeKey::of::<T>()).is_some()
    }

    /// Number of cache slots filled so far.
    #[inline]
    pub fn cached_len(&self) -> usize {
        self.inner.cache.len()
    }

    /// Root-request cache lookup without building.
    fn cached(&self, key: &TypeKey) -> Option<Instance> {
        let scope = match self.inner.config.lookup(key, None) {
            Lookup::Bound(_, scope) => scope.clone(),
            Lookup::Unbound(Fallback::Error) => return None,
            Lookup::Unbound(_) => ScopeKey::Global,
        };
        self.inner
            .cache
            .get(&CacheKey {
                target: key.clone(),
                scope,
            })
            .map(|hit| hit.value().clone())
    }

    /// Resolve `key` on behalf of `parent` (`None` for root requests).
    fn resolve(
        &self,
        key: &TypeKey,
        parent: Option<&TypeKey>,
        state: &mut BuildState,
    ) -> Result<Instance> {
        let config = &self.inner.config;
        let (plan, scope) = match config.lookup(key, parent) {
            Lookup::Bound(binding, scope) => (Plan::Bound(binding), scope.clone()),
            Lookup::Unbound(Fallback::Construct) => (Plan::Construct, ScopeKey::Global),
            Lookup::Unbound(Fallback::StandIn) => (Plan::StandIn, ScopeKey::Global),
            Lookup::Unbound(Fallback::Error) => {
                #[cfg(feature = "logging")]
                debug!(target: "autowire", service = %key, "Rejecting unbound type");
                return Err(DiError::NotBound {
                    type_name: key.to_string(),
                });
            }
        };

        let slot = CacheKey {
            target: key.clone(),
            scope,
        };
        if let Some(hit) = self.inner.cache.get(&slot) {
            #[cfg(feature = "logging")]
            trace!(
                target: "autowire",
                service = %key,
                scope = %slot.scope,
                "Resolved from cache"
            );
            return Ok(hit.value().clone());
        }
        if let Some(staged) = state.staged.get(&slot) {
            return Ok(staged.clone());
        }

        state.enter(&slot)?;
        let built = self.build(key, plan, parent, state);
        state.leave();
        let instance = built?;

        #[cfg(feature = "logging")]
        debug!(
            target: "autowire",
            service = %key,
            scope = %slot.scope,
            instance = instance.type_name(),
            "Built instance"
        );

        state.staged.insert(slot, instance.clone());
        Ok(instance)
    }

    fn build(
        &self,
        key: &TypeKey,
        plan: Plan<'_>,
        parent: Option<&TypeKey>,
        state: &mut BuildState,
    ) -> Result<Instance> {
        match plan {
            Plan::StandIn => self.build_stand_in(key, state),
            Plan::Construct => {
                let constructor = self.inner.introspector.constructor_for(key)?;
                self.construct(key, &constructor, None, state)
            }
            Plan::Bound(binding) => match binding.strategy() {
                Strategy::ToInstance(instance) => Ok(instance.clone()),
                Strategy::ToClass(target) if target.key() != key => {
                    let substitute = self.resolve(target.key(), parent, state)?;
                    target.upcast(substitute)
                }
                Strategy::ToConstructor(factory) => {
                    self.construct(key, factory, Some(binding), state)
                }
                Strategy::ToClass(_) | Strategy::Default => {
                    let constructor = self.inner.introspector.constructor_for(key)?;
                    self.construct(key, &constructor, Some(binding), state)
                }
            },
        }
    }

    /// Resolve every parameter in declared order, then invoke once.
    fn construct(
        &self,
        key: &TypeKey,
        constructor: &Constructor,
        binding: Option<&Binding>,
        state: &mut BuildState,
    ) -> Result<Instance> {
        let params = self.inner.introspector.extract_signature(constructor);
        if let Some(binding) = binding {
            binding.check_overrides(&params, key)?;
        }

        let mut args = Args::with_capacity(params.len());
        for param in params.iter() {
            let value = self.argument(key, param, binding, state)?;
            args.insert(param.name(), value);
        }

        constructor.invoke(&args)
    }

    fn argument(
        &self,
        consumer: &TypeKey,
        param: &ParamSpec,
        binding: Option<&Binding>,
        state: &mut BuildState,
    ) -> Result<Instance> {
        if let Some(literal) = binding.and_then(|b| b.kwarg(param.name())) {
            return Ok(literal.clone());
        }

        let substituted = binding.and_then(|b| b.arg_type(param.name()));
        let effective = substituted.map_or(param.declared(), |target| target.key());
        let bound = self.inner.config.find(effective, Some(consumer)).is_some();

        if !bound {
            // A default wins over construction until the type is bound, unless
            // a substitute type was requested for this parameter.
            if let Some(default) = param.default_value().filter(|_| substituted.is_none()) {
                return Ok(default.clone());
            }
            if effective.is_composite() {
                return Err(DiError::AmbiguousType {
                    type_name: effective.to_string(),
                    parameter: param.name(),
                    consumer: consumer.to_string(),
                });
            }
            if effective.is_scalar() {
                return Err(DiError::unresolvable(effective.to_string()));
            }
        }

        let resolved = self.resolve(effective, Some(consumer), state)?;
        match substituted {
            Some(target) => target.upcast(resolved),
            None => Ok(resolved),
        }
    }

    fn build_stand_in(&self, key: &TypeKey, state: &mut BuildState) -> Result<Instance> {
        let no_stand_in = || DiError::NoStandIn {
            type_name: key.to_string(),
        };
        let info = key.type_info().ok_or_else(no_stand_in)?;
        let factory = info.stand_in().ok_or_else(no_stand_in)?;

        let committed = self.inner.stand_ins.get(key).map(|s| Arc::clone(s.value()));
        let controller = match committed {
            Some(controller) => controller,
            None => Arc::clone(
                state
                    .stand_ins
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(StandIn::new(info.name(), factory.surface()))),
            ),
        };

        #[cfg(feature = "logging")]
        debug!(target: "autowire", service = %key, "Building stand-in");

        Ok(factory.wrap(controller))
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("bindings", &self.inner.config.len())
            .field("cached", &self.inner.cache.len())
            .finish()
    }
}
