//! Field values and field descriptors shared by every entity type.
//!
//! # Invariants
//! - Enum-valued fields carry the variant identity (`FieldValue::Enum`),
//!   never a display string; text never matches an enum field.
//! - `FieldMap` iteration order is the field-name order, so generated SQL
//!   is deterministic.

use super::validation::ValidationError;
use std::collections::BTreeMap;

/// Field-name to value mapping used for filters and explicit input fields.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Equality filter set: every entry must match (logical AND).
pub type FilterMap = FieldMap;

/// Builds a `FieldMap` from name/value pairs.
pub fn field_map<K, V, I>(entries: I) -> FieldMap
where
    K: Into<String>,
    V: Into<FieldValue>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

/// Declared storage kind of one persisted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
    /// Closed set of variant names.
    Enum(&'static [&'static str]),
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Enum(_) => "enum",
        }
    }
}

/// Descriptor entry for one persisted, caller-writable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldDef {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }

    /// Returns whether `value` can be stored in (or compared against) this field.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self.kind, value) {
            (_, FieldValue::Null) => self.nullable,
            (FieldKind::Integer, FieldValue::Integer(_)) => true,
            (FieldKind::Real, FieldValue::Real(_) | FieldValue::Integer(_)) => true,
            (FieldKind::Text, FieldValue::Text(_)) => true,
            (FieldKind::Enum(names), FieldValue::Enum(name)) => names.contains(name),
            _ => false,
        }
    }
}

/// Enumerations persisted by variant name.
pub trait DbEnum: Sized + Copy + 'static {
    /// Every variant name, in declaration order.
    const NAMES: &'static [&'static str];

    fn db_name(self) -> &'static str;

    fn from_db_name(name: &str) -> Option<Self>;
}

/// One scalar value of a persisted field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// Variant name of a `DbEnum`.
    Enum(&'static str),
}

impl FieldValue {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Enum(_) => "enum",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn into_text(self, field: &str) -> Result<String, ValidationError> {
        match self {
            Self::Text(value) => Ok(value),
            other => Err(other.mismatch(field, "text")),
        }
    }

    pub fn into_optional_text(self, field: &str) -> Result<Option<String>, ValidationError> {
        match self {
            Self::Null => Ok(None),
            other => other.into_text(field).map(Some),
        }
    }

    pub fn into_integer(self, field: &str) -> Result<i64, ValidationError> {
        match self {
            Self::Integer(value) => Ok(value),
            other => Err(other.mismatch(field, "integer")),
        }
    }

    pub fn into_optional_integer(self, field: &str) -> Result<Option<i64>, ValidationError> {
        match self {
            Self::Null => Ok(None),
            other => other.into_integer(field).map(Some),
        }
    }

    pub fn into_enum<T: DbEnum>(self, field: &str) -> Result<T, ValidationError> {
        match self {
            Self::Enum(name) => T::from_db_name(name).ok_or_else(|| ValidationError::TypeMismatch {
                field: field.to_string(),
                expected: "enum",
                found: "unknown variant",
            }),
            other => Err(other.mismatch(field, "enum")),
        }
    }

    fn mismatch(&self, field: &str, expected: &'static str) -> ValidationError {
        ValidationError::TypeMismatch {
            field: field.to_string(),
            expected,
            found: self.kind_label(),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
