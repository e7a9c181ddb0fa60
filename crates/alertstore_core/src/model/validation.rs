//! Validation errors raised before any SQL runs.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-misuse errors detected from descriptors and entity rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A filter or update names a field the entity type does not declare.
    UnknownField { entity: &'static str, field: String },
    /// A value does not fit the declared kind of its field.
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    /// An update tries to overwrite identity or a storage-managed timestamp.
    ImmutableField { entity: &'static str, field: String },
    /// An entity-level rule rejected the value.
    InvalidValue { field: &'static str, message: String },
}

impl ValidationError {
    pub fn unknown_field(entity: &'static str, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity,
            field: field.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::UnknownField { field, .. } => field,
            Self::TypeMismatch { field, .. } => field,
            Self::ImmutableField { field, .. } => field,
            Self::InvalidValue { field, .. } => field,
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { entity, field } => {
                write!(f, "{entity} has no field `{field}`")
            }
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => write!(f, "field `{field}` expects {expected}, got {found}"),
            Self::ImmutableField { entity, field } => {
                write!(f, "{entity}.{field} is managed by storage and cannot be set")
            }
            Self::InvalidValue { field, message } => write!(f, "invalid `{field}`: {message}"),
        }
    }
}

impl Error for ValidationError {}

/// Rejects empty or whitespace-only text for a required field.
pub fn require_non_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field,
            message: "must not be blank".to_string(),
        });
    }
    Ok(())
}
