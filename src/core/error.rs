//! Errors raised while rebuilding a record.

use thiserror::Error;

/// Errors that abort a single transition.
///
/// A failed transition never publishes a partial record; the previously
/// published record stays visible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// A field demanded its own value while it was still being computed.
    ///
    /// `chain` is the exact path of field names from the outermost demand
    /// to the re-entrant field, so `["a", "b", "a"]` means `a` computed `b`
    /// which computed `a` again.
    #[error("circular dependency detected: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<&'static str> },

    /// The registered schema could not locate a field or build the record.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaError),
}

impl TransitionError {
    /// The dependency chain of a circular dependency, if this is one.
    pub fn chain(&self) -> Option<&[&'static str]> {
        match self {
            Self::CircularDependency { chain } => Some(chain),
            Self::SchemaMismatch(_) => None,
        }
    }
}

/// Configuration errors in a record's registered schema.
///
/// These are programmer errors: replaying the same event fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("field '{field}' is declared more than once on {record}")]
    DuplicateField {
        record: &'static str,
        field: &'static str,
    },

    #[error("field '{field}' is not declared on {record}")]
    UnknownField {
        record: &'static str,
        field: &'static str,
    },

    #[error("field '{field}' holds {expected}, not {found}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field '{field}' on {record} is a pass-through and has no spec to compute")]
    NotAProperty {
        record: &'static str,
        field: &'static str,
    },

    #[error("no value was resolved for field '{field}'")]
    MissingValue { field: &'static str },

    #[error("failed to construct {record}: {reason}")]
    Construction {
        record: &'static str,
        reason: String,
    },
}
