//! Binding registry: resolution rules keyed by target type and scope.
//!
//! `bind` selects a target, `globally` / `for_parent` select the scope, and
//! the returned [`ResolverBuilder`] chooses the strategy. Selecting a scope
//! already records a `Default` binding, so `config.bind::<T>().globally()` on
//! its own is a complete rule. Re-binding the same target and scope replaces
//! the previous rule.

use crate::signature::{Constructor, ParamSpec};
use crate::{DiError, Implements, Injectable, Instance, Result, ScopeKey, TypeKey};
use ahash::RandomState;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

type UpcastFn = Arc<dyn Fn(Instance) -> Result<Instance> + Send + Sync>;

/// A substitute type together with the conversion back to the bound target.
#[derive(Clone)]
pub struct ClassTarget {
    key: TypeKey,
    upcast: UpcastFn,
}

impl ClassTarget {
    /// Resolve `C` and hand the instance out unchanged.
    pub fn identity<C: ?Sized + Injectable>() -> Self {
        Self::keyed(TypeKey::of::<C>())
    }

    /// Resolve `key` and hand the instance out unchanged.
    pub fn keyed(key: TypeKey) -> Self {
        Self {
            key,
            upcast: Arc::new(|instance: Instance| -> Result<Instance> { Ok(instance) }),
        }
    }

    /// Resolve `C` and hand it out as an `Arc<T>`.
    pub fn upcasting<T: ?Sized + Injectable, C: Implements<T>>() -> Self {
        let upcast: UpcastFn = Arc::new(|instance: Instance| {
            instance
                .downcast::<C>()
                .map(|c| Instance::from_arc::<T>(<C as Implements<T>>::upcast(c)))
                .ok_or_else(|| {
                    DiError::creation_failed(
                        std::any::type_name::<T>(),
                        format!("substitute resolved to {}", instance.type_name()),
                    )
                })
        });
        Self {
            key: TypeKey::of::<C>(),
            upcast,
        }
    }

    #[inline]
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    #[inline]
    pub(crate) fn upcast(&self, instance: Instance) -> Result<Instance> {
        (self.upcast)(instance)
    }
}

impl fmt::Debug for ClassTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassTarget").field(&self.key).finish()
    }
}

/// How a bound target is produced.
#[derive(Clone, Default)]
pub enum Strategy {
    /// Hand out this exact value; nothing is constructed.
    ToInstance(Instance),
    /// Resolve another type in the same parent context and alias it.
    ToClass(ClassTarget),
    /// Introspect and invoke a factory.
    ToConstructor(Constructor),
    /// Introspect and invoke the target's own constructor.
    #[default]
    Default,
}

impl Strategy {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToInstance(_) => "instance",
            Self::ToClass(_) => "class",
            Self::ToConstructor(_) => "constructor",
            Self::Default => "default",
        }
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToInstance(instance) => f.debug_tuple("ToInstance").field(instance).finish(),
            Self::ToClass(target) => f.debug_tuple("ToClass").field(&target.key).finish(),
            Self::ToConstructor(ctor) => f.debug_tuple("ToConstructor").field(ctor).finish(),
            Self::Default => f.write_str("Default"),
        }
    }
}

/// A registered rule: strategy plus per-parameter overrides.
#[derive(Clone, Debug, Default)]
pub struct Binding {
    strategy: Strategy,
    kwargs: BTreeMap<String, Instance>,
    arg_types: BTreeMap<String, ClassTarget>,
}

impl Binding {
    #[inline]
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Literal override for parameter `name`.
    #[inline]
    pub fn kwarg(&self, name: &str) -> Option<&Instance> {
        self.kwargs.get(name)
    }

    /// Substitute declared type for parameter `name`.
    #[inline]
    pub fn arg_type(&self, name: &str) -> Option<&ClassTarget> {
        self.arg_types.get(name)
    }

    /// Every override must name a parameter the constructor declares.
    pub(crate) fn check_overrides(&self, params: &[ParamSpec], target: &TypeKey) -> Result<()> {
        let unknown = self
            .kwargs
            .keys()
            .chain(self.arg_types.keys())
            .find(|name| !params.iter().any(|p| p.name() == name.as_str()));

        match unknown {
            Some(name) => Err(DiError::UnknownOverrideParameter {
                parameter: name.clone(),
                type_name: target.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// What the registry does with a type that has no binding at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Fallback {
    /// Build it with its own constructor (production behavior).
    #[default]
    Construct,
    /// Fail: every type must be bound explicitly.
    Error,
    /// Build and cache a stand-in once.
    StandIn,
}

/// Outcome of the registry lookup for one request.
#[derive(Debug, Clone, Copy)]
pub enum Lookup<'a> {
    /// A binding matched, under the given scope.
    Bound(&'a Binding, &'a ScopeKey),
    /// Nothing matched; apply the configuration's fallback under the global
    /// scope.
    Unbound(Fallback),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct BindingKey {
    target: TypeKey,
    scope: ScopeKey,
}

static GLOBAL: ScopeKey = ScopeKey::Global;

/// The set of bindings an injector is built from.
///
/// # Examples
///
/// ```rust
/// use autowire::{Configuration, Constructor, Injectable, Injector, Signature};
///
/// struct CacheClient {
///     pool: String,
/// }
///
/// impl Injectable for CacheClient {
///     fn constructor() -> Option<Constructor> {
///         Some(Constructor::new(
///             || Signature::new().scalar::<String>("pool"),
///             |args| Ok(CacheClient { pool: args.value("pool")? }),
///         ))
///     }
/// }
///
/// let mut config = Configuration::new();
/// config
///     .bind::<CacheClient>()
///     .globally()
///     .with_kwarg("pool", String::from("DEFAULT"));
///
/// let injector = Injector::new(config);
/// assert_eq!(injector.get::<CacheClient>().unwrap().pool, "DEFAULT");
/// ```
#[derive(Clone, Default)]
pub struct Configuration {
    bindings: HashMap<BindingKey, Binding, RandomState>,
    fallback: Fallback,
}

impl Configuration {
    /// Empty configuration that constructs unbound types directly.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty configuration with a specific fallback for unbound types.
    #[inline]
    pub fn with_fallback(fallback: Fallback) -> Self {
        Self {
            bindings: HashMap::default(),
            fallback,
        }
    }

    #[inline]
    pub fn fallback(&self) -> Fallback {
        self.fallback
    }

    /// Start a binding for `T`.
    #[inline]
    pub fn bind<T: ?Sized + Injectable>(&mut self) -> ScopeSelector<'_, T> {
        ScopeSelector {
            config: self,
            target: TypeKey::of::<T>(),
            _marker: PhantomData,
        }
    }

    /// Start a binding for an arbitrary key, e.g. a nullable or union type.
    ///
    /// Scalars cannot be bound; supply them with kwarg overrides instead.
    pub fn bind_key(&mut self, target: TypeKey) -> Result<ScopeSelector<'_, dyn Any + Send + Sync>> {
        if target.is_scalar() {
            return Err(DiError::ScalarBinding {
                type_name: target.to_string(),
            });
        }
        Ok(ScopeSelector {
            config: self,
            target,
            _marker: PhantomData,
        })
    }

    /// True if a rule exists for exactly this target and scope.
    pub fn is_bound(&self, target: &TypeKey, scope: &ScopeKey) -> bool {
        self.bindings.contains_key(&BindingKey {
            target: target.clone(),
            scope: scope.clone(),
        })
    }

    /// Number of rules.
    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The binding for `target` requested by `parent`: the parent-specific
    /// rule first, then the global one. Never applies the fallback.
    pub fn find(&self, target: &TypeKey, parent: Option<&TypeKey>) -> Option<(&Binding, &ScopeKey)> {
        let specific = parent.and_then(|parent| {
            self.bindings
                .get_key_value(&BindingKey {
                    target: target.clone(),
                    scope: ScopeKey::Parent(parent.clone()),
                })
                .map(|(k, b)| (b, &k.scope))
        });

        specific.or_else(|| {
            self.bindings
                .get(&BindingKey {
                    target: target.clone(),
                    scope: ScopeKey::Global,
                })
                .map(|b| (b, &GLOBAL))
        })
    }

    /// Full lookup: exact parent match, then global, then the fallback.
    pub fn lookup(&self, target: &TypeKey, parent: Option<&TypeKey>) -> Lookup<'_> {
        match self.find(target, parent) {
            Some((binding, scope)) => Lookup::Bound(binding, scope),
            None => Lookup::Unbound(self.fallback),
        }
    }

    fn insert(&mut self, target: TypeKey, scope: ScopeKey) -> &mut Binding {
        #[cfg(feature = "logging")]
        debug!(
            target: "autowire",
            service = %target,
            scope = %scope,
            bindings = self.bindings.len() + 1,
            "Registering binding"
        );

        let slot = self.bindings.entry(BindingKey { target, scope }).or_default();
        *slot = Binding::default();
        slot
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("bindings", &self.bindings.len())
            .field("fallback", &self.fallback)
            .finish()
    }
}

/// Chooses the scope of a binding.
pub struct ScopeSelector<'a, T: ?Sized> {
    config: &'a mut Configuration,
    target: TypeKey,
    _marker: PhantomData<fn() -> *const T>,
}

impl<'a, T: ?Sized> ScopeSelector<'a, T> {
    /// Applies to every parent without a more specific rule.
    pub fn globally(self) -> ResolverBuilder<'a, T> {
        self.scoped(ScopeKey::Global)
    }

    /// Applies only while building `P`.
    pub fn for_parent<P: ?Sized + Injectable>(self) -> ResolverBuilder<'a, T> {
        self.for_parent_key(TypeKey::of::<P>())
    }

    /// Applies only while building the type identified by `parent`.
    pub fn for_parent_key(self, parent: TypeKey) -> ResolverBuilder<'a, T> {
        self.scoped(ScopeKey::Parent(parent))
    }

    fn scoped(self, scope: ScopeKey) -> ResolverBuilder<'a, T> {
        let Self { config, target, .. } = self;
        ResolverBuilder {
            binding: config.insert(target.clone(), scope),
            target,
            _marker: PhantomData,
        }
    }
}

/// Chooses the strategy and overrides of a binding. Leaving it untouched
/// keeps the `Default` strategy.
pub struct ResolverBuilder<'a, T: ?Sized> {
    binding: &'a mut Binding,
    target: TypeKey,
    _marker: PhantomData<fn() -> *const T>,
}

impl<'a, T: ?Sized + Injectable> ResolverBuilder<'a, T> {
    /// Always hand out `instance`.
    pub fn to_instance(self, instance: Arc<T>) {
        self.to_instance_any(Instance::from_arc(instance));
    }

    /// Resolve `C` instead and hand it out as `T`.
    pub fn to_class<C: Implements<T>>(self) {
        self.set_terminal(Strategy::ToClass(ClassTarget::upcasting::<T, C>()));
    }
}

impl<'a, T: ?Sized> ResolverBuilder<'a, T> {
    /// Always hand out `instance`, whatever its type.
    pub fn to_instance_any(self, instance: Instance) {
        self.set_terminal(Strategy::ToInstance(instance));
    }

    /// Resolve `C` instead and hand out the `C` instance unchanged. Used for
    /// nullable and union targets.
    pub fn to_class_any<C: ?Sized + Injectable>(self) {
        self.set_terminal(Strategy::ToClass(ClassTarget::identity::<C>()));
    }

    /// Build with `factory` instead of the target's own constructor.
    pub fn to_constructor(self, factory: Constructor) -> Self {
        self.binding.strategy = Strategy::ToConstructor(factory);
        self
    }

    /// Pass `value` for parameter `name`, skipping injection.
    pub fn with_kwarg<V: Send + Sync + 'static>(self, name: impl Into<String>, value: V) -> Self {
        self.with_kwarg_instance(name, Instance::new(value))
    }

    /// Pass a shared value for parameter `name`.
    pub fn with_kwarg_arc<V: ?Sized + Send + Sync + 'static>(
        self,
        name: impl Into<String>,
        value: Arc<V>,
    ) -> Self {
        self.with_kwarg_instance(name, Instance::from_arc(value))
    }

    /// Pass the absent value for a nullable parameter.
    pub fn with_kwarg_absent(self, name: impl Into<String>) -> Self {
        self.with_kwarg_instance(name, Instance::absent())
    }

    pub fn with_kwarg_instance(self, name: impl Into<String>, value: Instance) -> Self {
        self.binding.kwargs.insert(name.into(), value);
        self
    }

    /// Resolve parameter `name` as `C` instead of its declared type and pass
    /// the `C` instance unchanged.
    pub fn with_arg_type<C: ?Sized + Injectable>(self, name: impl Into<String>) -> Self {
        self.with_arg_class(name, ClassTarget::identity::<C>())
    }

    /// Resolve parameter `name` as `C` and pass it as the contract `I` the
    /// parameter declares.
    pub fn with_arg_type_as<I: ?Sized + Injectable, C: Implements<I>>(
        self,
        name: impl Into<String>,
    ) -> Self {
        self.with_arg_class(name, ClassTarget::upcasting::<I, C>())
    }

    pub fn with_arg_type_key(self, name: impl Into<String>, declared: TypeKey) -> Self {
        self.with_arg_class(name, ClassTarget::keyed(declared))
    }

    pub fn with_arg_class(self, name: impl Into<String>, target: ClassTarget) -> Self {
        self.binding.arg_types.insert(name.into(), target);
        self
    }

    fn set_terminal(self, strategy: Strategy) {
        if !self.binding.kwargs.is_empty() || !self.binding.arg_types.is_empty() {
            #[cfg(feature = "logging")]
            warn!(
                target: "autowire",
                service = %self.target,
                strategy = strategy.name(),
                "Dropping parameter overrides: only constructor strategies accept them"
            );
            self.binding.kwargs.clear();
            self.binding.arg_types.clear();
        }
        self.binding.strategy = strategy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{contract, Signature};

    struct Repo;
    struct Service;
    struct Other;
    contract!(Repo, Service, Other);

    #[test]
    fn test_scope_selection_records_default() {
        let mut config = Configuration::new();
        config.bind::<Repo>().globally();

        assert!(config.is_bound(&TypeKey::of::<Repo>(), &ScopeKey::Global));
        let (binding, scope) = config.find(&TypeKey::of::<Repo>(), None).unwrap();
        assert!(matches!(binding.strategy(), Strategy::Default));
        assert_eq!(scope, &ScopeKey::Global);
    }

    #[test]
    fn test_lookup_prefers_parent_then_global_then_fallback() {
        let mut config = Configuration::new();
        config.bind::<Repo>().globally().with_kwarg("name", "global");
        config.bind::<Repo>().for_parent::<Service>().with_kwarg("name", "service");

        let repo = TypeKey::of::<Repo>();
        let service = TypeKey::of::<Service>();
        let other = TypeKey::of::<Other>();

        match config.lookup(&repo, Some(&service)) {
            Lookup::Bound(_, scope) => assert_eq!(scope, &ScopeKey::Parent(service.clone())),
            Lookup::Unbound(_) => panic!("expected parent binding"),
        }
        match config.lookup(&repo, Some(&other)) {
            Lookup::Bound(_, scope) => assert_eq!(scope, &ScopeKey::Global),
            Lookup::Unbound(_) => panic!("expected global binding"),
        }
        match config.lookup(&repo, None) {
            Lookup::Bound(_, scope) => assert_eq!(scope, &ScopeKey::Global),
            Lookup::Unbound(_) => panic!("expected global binding"),
        }
        assert!(matches!(
            config.lookup(&other, None),
            Lookup::Unbound(Fallback::Construct)
        ));
    }

    #[test]
    fn test_rebinding_overwrites() {
        let mut config = Configuration::new();
        config.bind::<Repo>().globally().with_kwarg("name", "first");
        config.bind::<Repo>().globally();

        assert_eq!(config.len(), 1);
        let (binding, _) = config.find(&TypeKey::of::<Repo>(), None).unwrap();
        assert!(binding.kwarg("name").is_none());
    }

    #[test]
    fn test_scalar_binding_rejected() {
        let mut config = Configuration::new();
        let err = config.bind_key(TypeKey::scalar::<String>()).err().unwrap();
        assert!(matches!(err, DiError::ScalarBinding { .. }));
        assert!(config.is_empty());
    }

    #[test]
    fn test_terminal_strategy_drops_overrides() {
        let mut config = Configuration::new();
        config
            .bind::<Repo>()
            .globally()
            .with_kwarg("name", "ignored")
            .to_instance(Arc::new(Repo));

        let (binding, _) = config.find(&TypeKey::of::<Repo>(), None).unwrap();
        assert!(matches!(binding.strategy(), Strategy::ToInstance(_)));
        assert!(binding.kwarg("name").is_none());
    }

    #[test]
    fn test_arg_type_records_substitute() {
        let mut config = Configuration::new();
        config
            .bind::<Service>()
            .for_parent::<Other>()
            .with_arg_type::<Repo>("repo")
            .with_arg_type_key("fallback", TypeKey::optional(TypeKey::of::<Repo>()));

        let (binding, scope) = config
            .find(&TypeKey::of::<Service>(), Some(&TypeKey::of::<Other>()))
            .unwrap();
        assert_eq!(scope, &ScopeKey::Parent(TypeKey::of::<Other>()));
        assert_eq!(binding.arg_type("repo").unwrap().key(), &TypeKey::of::<Repo>());
        assert!(binding.arg_type("fallback").unwrap().key().is_composite());
        assert!(binding.arg_type("missing").is_none());
        // No global rule, so other parents are unbound
        assert!(config.find(&TypeKey::of::<Service>(), None).is_none());
    }

    #[test]
    fn test_check_overrides() {
        let mut config = Configuration::new();
        config
            .bind::<Repo>()
            .globally()
            .with_kwarg("name", "x")
            .with_arg_type::<Other>("nope");

        let signature = Signature::new().scalar::<&'static str>("name");
        let (binding, _) = config.find(&TypeKey::of::<Repo>(), None).unwrap();
        let err = binding
            .check_overrides(signature.params(), &TypeKey::of::<Repo>())
            .unwrap_err();
        assert!(matches!(err, DiError::UnknownOverrideParameter { parameter, .. } if parameter == "nope"));
    }
}
