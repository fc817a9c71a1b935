//! Parameter declarations and the constructors that consume them.
//!
//! A [`Constructor`] pairs a signature (the ordered [`ParamSpec`] list the
//! injector resolves) with a build function that receives the resolved
//! values as an [`Args`] pack. Types describe their own constructor through
//! [`Injectable`](crate::Injectable); factories bound with `to_constructor`
//! are built the same way.

use crate::{DiError, Injectable, Instance, Result, TypeKey};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// One declared constructor parameter.
#[derive(Clone)]
pub struct ParamSpec {
    name: &'static str,
    declared: TypeKey,
    default: Option<Instance>,
}

impl ParamSpec {
    /// A parameter without a default.
    #[inline]
    pub fn new(name: &'static str, declared: TypeKey) -> Self {
        Self {
            name,
            declared,
            default: None,
        }
    }

    /// Attach a default value.
    #[inline]
    pub fn with_default(mut self, value: Instance) -> Self {
        self.default = Some(value);
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn declared(&self) -> &TypeKey {
        &self.declared
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    #[inline]
    pub fn default_value(&self) -> Option<&Instance> {
        self.default.as_ref()
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("has_default", &self.has_default())
            .finish()
    }
}

/// Ordered parameter list, built fluently.
///
/// # Examples
///
/// ```rust
/// use autowire::{contract, Signature};
///
/// struct Pool;
/// contract!(Pool);
///
/// let signature = Signature::new()
///     .param::<Pool>("pool")
///     .scalar_or("name", String::from("primary"))
///     .optional::<Pool>("replica");
///
/// let names: Vec<_> = signature.params().iter().map(|p| p.name()).collect();
/// assert_eq!(names, ["pool", "name", "replica"]);
/// assert!(signature.params()[1].has_default());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Signature {
    params: Vec<ParamSpec>,
}

impl Signature {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dependency on an injectable `T`, received as `Arc<T>`.
    pub fn param<T: ?Sized + Injectable>(self, name: &'static str) -> Self {
        self.with(ParamSpec::new(name, TypeKey::of::<T>()))
    }

    /// Dependency on `T` that falls back to `default` while `T` is unbound.
    pub fn param_or<T: ?Sized + Injectable>(self, name: &'static str, default: Arc<T>) -> Self {
        self.with(ParamSpec::new(name, TypeKey::of::<T>()).with_default(Instance::from_arc(default)))
    }

    /// Nullable dependency on `T`, received as `Option<Arc<T>>`.
    pub fn optional<T: ?Sized + Injectable>(self, name: &'static str) -> Self {
        self.with(ParamSpec::new(name, TypeKey::optional(TypeKey::of::<T>())))
    }

    /// Nullable dependency on `T` with a default.
    pub fn optional_or<T: ?Sized + Injectable>(
        self,
        name: &'static str,
        default: Option<Arc<T>>,
    ) -> Self {
        let default = default.map_or_else(Instance::absent, Instance::from_arc);
        self.with(ParamSpec::new(name, TypeKey::optional(TypeKey::of::<T>())).with_default(default))
    }

    /// Plain value parameter. Satisfied only by a default or a kwarg override.
    pub fn scalar<V: Send + Sync + 'static>(self, name: &'static str) -> Self {
        self.with(ParamSpec::new(name, TypeKey::scalar::<V>()))
    }

    /// Plain value parameter with a default.
    pub fn scalar_or<V: Send + Sync + 'static>(self, name: &'static str, default: V) -> Self {
        self.with(ParamSpec::new(name, TypeKey::scalar::<V>()).with_default(Instance::new(default)))
    }

    /// Parameter declared with an arbitrary key, e.g. a union.
    pub fn keyed(self, name: &'static str, declared: TypeKey) -> Self {
        self.with(ParamSpec::new(name, declared))
    }

    /// Append a prepared parameter.
    #[inline]
    pub fn with(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    #[inline]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub(crate) fn into_params(self) -> Vec<ParamSpec> {
        self.params
    }
}

/// Resolved arguments handed to a build function, by parameter name.
#[derive(Clone, Debug, Default)]
pub struct Args {
    values: Vec<(&'static str, Instance)>,
}

impl Args {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Add (or replace) an argument.
    pub fn insert(&mut self, name: &'static str, value: Instance) {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    /// The raw instance for `name`.
    pub fn instance(&self, name: &str) -> Result<Instance> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| DiError::missing_argument(name))
    }

    /// A required dependency.
    pub fn get<T: ?Sized + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let instance = self.instance(name)?;
        instance
            .downcast::<T>()
            .ok_or_else(|| mismatch::<T>(name, &instance))
    }

    /// A nullable dependency. The explicit absent value maps to `None`.
    pub fn optional<T: ?Sized + 'static>(&self, name: &str) -> Result<Option<Arc<T>>> {
        let instance = self.instance(name)?;
        if instance.is_absent() {
            return Ok(None);
        }
        instance
            .downcast::<T>()
            .map(Some)
            .ok_or_else(|| mismatch::<T>(name, &instance))
    }

    /// A plain value, cloned out of its shared slot.
    pub fn value<V: Clone + 'static>(&self, name: &str) -> Result<V> {
        self.get::<V>(name).map(|v| (*v).clone())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(n, _)| *n)
    }
}

fn mismatch<T: ?Sized>(name: &str, instance: &Instance) -> DiError {
    DiError::ArgumentTypeMismatch {
        parameter: name.to_string(),
        expected: std::any::type_name::<T>(),
        actual: instance.type_name(),
    }
}

type SignatureFn = Arc<dyn Fn() -> Signature + Send + Sync>;
type BuildFn = Arc<dyn Fn(&Args) -> Result<Instance> + Send + Sync>;

/// A callable the injector can introspect and invoke: a type's own
/// constructor or a factory bound with `to_constructor`.
///
/// Clones share the memoized parameter list.
///
/// # Examples
///
/// ```rust
/// use autowire::{Args, Constructor, Injectable, Instance, Signature};
///
/// struct Greeting {
///     text: String,
/// }
///
/// impl Injectable for Greeting {
///     fn constructor() -> Option<Constructor> {
///         Some(Constructor::new(
///             || Signature::new().scalar_or("text", String::from("hello")),
///             |args| Ok(Greeting { text: args.value("text")? }),
///         ))
///     }
/// }
///
/// let ctor = Greeting::constructor().unwrap();
/// let mut args = Args::new();
/// args.insert("text", Instance::new(String::from("hi")));
/// let built = ctor.invoke(&args).unwrap();
/// assert_eq!(built.downcast::<Greeting>().unwrap().text, "hi");
/// ```
#[derive(Clone)]
pub struct Constructor {
    produces: &'static str,
    signature: SignatureFn,
    build: BuildFn,
    pub(crate) memo: Arc<OnceCell<Arc<[ParamSpec]>>>,
}

impl Constructor {
    /// Constructor producing an owned `T`.
    pub fn new<T, S, F>(signature: S, build: F) -> Self
    where
        T: Send + Sync + 'static,
        S: Fn() -> Signature + Send + Sync + 'static,
        F: Fn(&Args) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            produces: std::any::type_name::<T>(),
            signature: Arc::new(signature),
            build: Arc::new(move |args| build(args).map(Instance::new)),
            memo: Arc::new(OnceCell::new()),
        }
    }

    /// Constructor producing an already shared `Arc<T>`, e.g. a factory
    /// returning a trait object.
    pub fn shared<T, S, F>(signature: S, build: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        S: Fn() -> Signature + Send + Sync + 'static,
        F: Fn(&Args) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Self {
            produces: std::any::type_name::<T>(),
            signature: Arc::new(signature),
            build: Arc::new(move |args| build(args).map(Instance::from_arc)),
            memo: Arc::new(OnceCell::new()),
        }
    }

    /// Name of the produced type.
    #[inline]
    pub fn produces(&self) -> &'static str {
        self.produces
    }

    /// Run the signature function. Callers wanting memoization go through
    /// the [`Introspector`](crate::Introspector).
    #[inline]
    pub(crate) fn declare(&self) -> Signature {
        (self.signature)()
    }

    /// Invoke the build function once with a fully assembled argument pack.
    #[inline]
    pub fn invoke(&self, args: &Args) -> Result<Instance> {
        (self.build)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("produces", &self.produces)
            .field("introspected", &self.memo.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract;

    struct Pool;
    contract!(Pool);

    #[test]
    fn test_signature_keys() {
        let sig = Signature::new()
            .param::<Pool>("pool")
            .optional::<Pool>("replica")
            .scalar::<u16>("port");

        assert_eq!(sig.len(), 3);
        assert_eq!(sig.params()[0].declared(), &TypeKey::of::<Pool>());
        assert!(sig.params()[1].declared().is_composite());
        assert!(sig.params()[2].declared().is_scalar());
        assert!(!sig.params()[2].has_default());
    }

    #[test]
    fn test_optional_default_none_is_absent() {
        let sig = Signature::new().optional_or::<Pool>("replica", None);
        assert!(sig.params()[0].default_value().unwrap().is_absent());
    }

    #[test]
    fn test_args_accessors() {
        let pool = Arc::new(Pool);
        let mut args = Args::new();
        args.insert("pool", Instance::from_arc(Arc::clone(&pool)));
        args.insert("replica", Instance::absent());
        args.insert("port", Instance::new(5432u16));

        assert!(Arc::ptr_eq(&args.get::<Pool>("pool").unwrap(), &pool));
        assert!(args.optional::<Pool>("replica").unwrap().is_none());
        assert_eq!(args.value::<u16>("port").unwrap(), 5432);
        assert_eq!(args.names().collect::<Vec<_>>(), ["pool", "replica", "port"]);
    }

    #[test]
    fn test_args_errors() {
        let mut args = Args::new();
        args.insert("port", Instance::new(5432u16));

        assert!(matches!(
            args.get::<Pool>("missing"),
            Err(DiError::MissingArgument { .. })
        ));
        assert!(matches!(
            args.value::<String>("port"),
            Err(DiError::ArgumentTypeMismatch { expected, .. }) if expected.contains("String")
        ));
    }

    #[test]
    fn test_insert_replaces() {
        let mut args = Args::with_capacity(1);
        args.insert("n", Instance::new(1u8));
        args.insert("n", Instance::new(2u8));
        assert_eq!(args.len(), 1);
        assert_eq!(args.value::<u8>("n").unwrap(), 2);
    }

    #[test]
    fn test_shared_constructor_keeps_trait_object() {
        trait Named: Send + Sync {
            fn name(&self) -> &'static str;
        }
        struct Fixed;
        impl Named for Fixed {
            fn name(&self) -> &'static str {
                "fixed"
            }
        }

        let ctor = Constructor::shared(Signature::new, |_| Ok(Arc::new(Fixed) as Arc<dyn Named>));
        let built = ctor.invoke(&Args::new()).unwrap();
        assert_eq!(built.downcast::<dyn Named>().unwrap().name(), "fixed");
        assert_eq!(ctor.produces(), std::any::type_name::<dyn Named>());
    }
}
