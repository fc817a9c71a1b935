//! Keys identifying what is being resolved and on whose behalf.
//!
//! A [`TypeKey`] names a target: an injectable type, a scalar value type, or a
//! composite (nullable, union, named alias) that is never decomposed. A
//! [`ScopeKey`] qualifies a binding as global or specific to one requesting
//! parent type.

use crate::signature::Constructor;
use crate::stand_in::StandInFactory;
use crate::Injectable;
use std::any::TypeId;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity and metadata hooks of an injectable type.
///
/// Equality and hashing only look at the `TypeId`; the hooks are carried so a
/// key found in a parameter list is enough to construct its type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    constructor: fn() -> Option<Constructor>,
    stand_in: fn() -> Option<StandInFactory>,
}

impl TypeInfo {
    /// Metadata of `T`.
    #[inline]
    pub fn of<T: ?Sized + Injectable>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            constructor: T::constructor,
            stand_in: T::stand_in,
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type's own constructor, `None` for abstract contracts.
    #[inline]
    pub fn constructor(&self) -> Option<Constructor> {
        (self.constructor)()
    }

    /// The type's stand-in factory, if it offers one.
    #[inline]
    pub fn stand_in(&self) -> Option<StandInFactory> {
        (self.stand_in)()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Identity of a plain value type (strings, numbers, flags).
#[derive(Clone, Copy)]
pub struct ScalarInfo {
    id: TypeId,
    name: &'static str,
}

impl ScalarInfo {
    #[inline]
    pub fn of<V: 'static>() -> Self {
        Self {
            id: TypeId::of::<V>(),
            name: std::any::type_name::<V>(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ScalarInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ScalarInfo {}

impl Hash for ScalarInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ScalarInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A resolvable target.
///
/// # Examples
///
/// ```rust
/// use autowire::{contract, TypeKey};
///
/// trait Greeter: Send + Sync {}
/// contract!(dyn Greeter);
///
/// struct Loud;
/// struct Quiet;
/// contract!(Loud, Quiet);
///
/// // Union membership is order-insensitive.
/// assert_eq!(
///     TypeKey::union([TypeKey::of::<Loud>(), TypeKey::of::<Quiet>()]),
///     TypeKey::union([TypeKey::of::<Quiet>(), TypeKey::of::<Loud>()]),
/// );
///
/// // Nullable and union keys are opaque: they never equal their members.
/// assert_ne!(TypeKey::optional(TypeKey::of::<Loud>()), TypeKey::of::<Loud>());
/// assert!(TypeKey::optional(TypeKey::of::<dyn Greeter>()).is_composite());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// An injectable type or abstract contract.
    Type(TypeInfo),
    /// A plain value type. Never bound, only defaulted or overridden.
    Scalar(ScalarInfo),
    /// `T` or absent.
    Optional(Arc<TypeKey>),
    /// One of several alternatives, sorted and de-duplicated.
    Union(Arc<[TypeKey]>),
    /// A named alias distinct from the key it wraps.
    Named(&'static str, Arc<TypeKey>),
}

impl TypeKey {
    /// Key of an injectable type.
    #[inline]
    pub fn of<T: ?Sized + Injectable>() -> Self {
        Self::Type(TypeInfo::of::<T>())
    }

    /// Key of a scalar value type.
    #[inline]
    pub fn scalar<V: 'static>() -> Self {
        Self::Scalar(ScalarInfo::of::<V>())
    }

    /// Nullable key wrapping `inner`.
    pub fn optional(inner: TypeKey) -> Self {
        match inner {
            already @ Self::Optional(_) => already,
            inner => Self::Optional(Arc::new(inner)),
        }
    }

    /// Union of `members`. Nested unions are flattened; a single distinct
    /// member collapses to that member.
    pub fn union(members: impl IntoIterator<Item = TypeKey>) -> Self {
        let mut flat = Vec::new();
        for member in members {
            match member {
                Self::Union(nested) => flat.extend(nested.iter().cloned()),
                other => flat.push(other),
            }
        }
        flat.sort();
        flat.dedup();

        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Self::Union(flat.into())
        }
    }

    /// Named alias of `inner`.
    #[inline]
    pub fn named(name: &'static str, inner: TypeKey) -> Self {
        Self::Named(name, Arc::new(inner))
    }

    /// Metadata of an injectable type key.
    #[inline]
    pub fn type_info(&self) -> Option<&TypeInfo> {
        match self {
            Self::Type(info) => Some(info),
            _ => None,
        }
    }

    /// Nullable or union, possibly behind an alias.
    pub fn is_composite(&self) -> bool {
        match self {
            Self::Optional(_) | Self::Union(_) => true,
            Self::Named(_, inner) => inner.is_composite(),
            Self::Type(_) | Self::Scalar(_) => false,
        }
    }

    /// A plain value type.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Type(_) => 0,
            Self::Scalar(_) => 1,
            Self::Optional(_) => 2,
            Self::Union(_) => 3,
            Self::Named(..) => 4,
        }
    }
}

impl Ord for TypeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Type(a), Self::Type(b)) => a.id.cmp(&b.id),
            (Self::Scalar(a), Self::Scalar(b)) => a.id.cmp(&b.id),
            (Self::Optional(a), Self::Optional(b)) => a.cmp(b),
            (Self::Union(a), Self::Union(b)) => a.iter().cmp(b.iter()),
            (Self::Named(na, a), Self::Named(nb, b)) => na.cmp(nb).then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for TypeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(info) => f.write_str(info.name),
            Self::Scalar(info) => f.write_str(info.name),
            Self::Optional(inner) => write!(f, "Option<{inner}>"),
            Self::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            Self::Named(name, _) => f.write_str(name),
        }
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({self})")
    }
}

/// Which requesting parent a binding applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    /// Every parent without a more specific binding.
    Global,
    /// Only requests made while building this parent type.
    Parent(TypeKey),
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Parent(parent) => write!(f, "parent:{parent}"),
        }
    }
}
