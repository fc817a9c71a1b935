//! Type-erased shared instances.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Marker stored for an explicitly absent nullable value.
struct Absent;

/// A resolved value of any type, shared by reference.
///
/// Holds an `Arc<T>` behind `dyn Any`, so both sized types and trait objects
/// (`Arc<dyn Trait>`) can be stored and recovered. Two instances are the same
/// object when they point at the same allocation, even if one was upcast to a
/// contract.
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    addr: usize,
    type_name: &'static str,
}

impl Instance {
    /// Wrap an owned value.
    #[inline]
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an existing shared value without copying it.
    #[inline]
    pub fn from_arc<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        let addr = Arc::as_ptr(&value) as *const () as usize;
        Self {
            value: Arc::new(value),
            addr,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The explicit "absent" value handed to nullable parameters.
    #[inline]
    pub fn absent() -> Self {
        Self::new(Absent)
    }

    #[inline]
    pub fn is_absent(&self) -> bool {
        self.value.is::<Arc<Absent>>()
    }

    /// Recover the typed handle, if this instance holds a `T`.
    #[inline]
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// True when both instances refer to the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        self.addr == other.addr
    }

    /// True when this instance refers to `other`'s allocation.
    #[inline]
    pub fn is<T: ?Sized>(&self, other: &Arc<T>) -> bool {
        self.addr == Arc::as_ptr(other) as *const () as usize
    }

    /// Name of the stored type, as seen at wrap time.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        if self.is_absent() {
            "None"
        } else {
            self.type_name
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.type_name())
            .field("addr", &format_args!("{:#x}", self.addr))
            .finish()
    }
}
