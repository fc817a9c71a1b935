//! Error types for dependency injection

use thiserror::Error;

/// Errors that can occur while configuring or resolving an object graph.
///
/// Every variant describes a wiring mistake or a failing constructor. None of
/// them are transient, so nothing in the crate retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// The type has no constructor (abstract contract) and nothing binds it,
    /// or it is a scalar parameter without a default.
    #[error("Cannot resolve type: {type_name}")]
    UnresolvableType { type_name: String },

    /// A nullable or union parameter has no binding and no default.
    #[error(
        "Ambiguous type {type_name} for parameter '{parameter}' of {consumer}: bind it explicitly or give it a default"
    )]
    AmbiguousType {
        type_name: String,
        parameter: &'static str,
        consumer: String,
    },

    /// An override names a parameter the constructor does not declare.
    #[error("Override for unknown parameter '{parameter}' of {type_name}")]
    UnknownOverrideParameter {
        parameter: String,
        type_name: String,
    },

    /// Explicit-only configuration and the type has no binding.
    #[error("No explicit binding for {type_name}")]
    NotBound { type_name: String },

    /// Scalars are supplied through defaults or kwargs, never bound.
    #[error("Scalar type {type_name} cannot be bound; use a kwarg override instead")]
    ScalarBinding { type_name: String },

    /// Auto-stand-in configuration and the type cannot produce a stand-in.
    #[error("Type {type_name} does not provide a stand-in")]
    NoStandIn { type_name: String },

    /// A stand-in was configured for a method outside its surface.
    #[error("Stand-in for {type_name} has no method '{method}'")]
    UnknownStandInMethod {
        type_name: &'static str,
        method: String,
    },

    /// The type is already being built further up the same call tree.
    #[error("Circular dependency detected: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// A constructor or factory called back into the injector building it.
    #[error("Re-entrant resolution of {type_name}: constructors must not call the injector that builds them")]
    ReentrantResolution { type_name: String },

    /// The constructor or factory itself failed.
    #[error("Failed to create {type_name}: {reason}")]
    CreationFailed { type_name: String, reason: String },

    /// A constructor asked its argument pack for a parameter it never declared.
    #[error("Missing argument '{parameter}'")]
    MissingArgument { parameter: String },

    /// A constructor asked for an argument as the wrong type.
    #[error("Argument '{parameter}' is {actual}, not {expected}")]
    ArgumentTypeMismatch {
        parameter: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Broad classification of a [`DiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The bindings do not describe a buildable graph.
    Configuration,
    /// A dependency cycle.
    Cyclic,
    /// A constructor ran and failed.
    Instantiation,
}

impl DiError {
    /// Create an UnresolvableType error
    #[inline]
    pub fn unresolvable(type_name: impl Into<String>) -> Self {
        Self::UnresolvableType {
            type_name: type_name.into(),
        }
    }

    /// Create a CreationFailed error
    #[inline]
    pub fn creation_failed(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingArgument error
    #[inline]
    pub fn missing_argument(parameter: impl Into<String>) -> Self {
        Self::MissingArgument {
            parameter: parameter.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CircularDependency { .. } => ErrorKind::Cyclic,
            Self::CreationFailed { .. }
            | Self::MissingArgument { .. }
            | Self::ArgumentTypeMismatch { .. } => ErrorKind::Instantiation,
            _ => ErrorKind::Configuration,
        }
    }

    /// True for wiring mistakes that are not cycles.
    #[inline]
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// True for dependency cycles.
    #[inline]
    pub fn is_cyclic(&self) -> bool {
        self.kind() == ErrorKind::Cyclic
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(DiError::unresolvable("A").kind(), ErrorKind::Configuration);
        assert_eq!(
            DiError::CircularDependency {
                chain: vec!["A".into(), "B".into(), "A".into()]
            }
            .kind(),
            ErrorKind::Cyclic
        );
        assert_eq!(
            DiError::creation_failed("A", "boom").kind(),
            ErrorKind::Instantiation
        );
        assert!(DiError::NotBound { type_name: "A".into() }.is_configuration());
    }

    #[test]
    fn test_cycle_message_lists_chain() {
        let err = DiError::CircularDependency {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: A -> B -> A");
    }
}
