//! Typed input contracts for create and partial-update calls.
//!
//! # Invariants
//! - `explicit_fields` returns only the fields the caller set, never the
//!   defaults a typed input falls back to.
//! - `EntityInput::to_entity` uses every field, defaults included.

use super::entity::Entity;
use super::value::{FieldMap, FieldValue};
use std::collections::BTreeSet;

/// Reports the fields a caller supplied explicitly.
pub trait ExplicitFields {
    fn explicit_fields(&self) -> FieldMap;
}

/// A typed input that can be materialized into a new entity.
pub trait EntityInput<E: Entity>: ExplicitFields {
    fn to_entity(&self) -> E;
}

impl ExplicitFields for FieldMap {
    fn explicit_fields(&self) -> FieldMap {
        self.clone()
    }
}

impl<T: ExplicitFields + ?Sized> ExplicitFields for &T {
    fn explicit_fields(&self) -> FieldMap {
        (**self).explicit_fields()
    }
}

impl<T: ExplicitFields + ?Sized> ExplicitFields for Box<T> {
    fn explicit_fields(&self) -> FieldMap {
        (**self).explicit_fields()
    }
}

/// Tracks which input fields were set through a builder setter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvidedFields(BTreeSet<&'static str>);

impl ProvidedFields {
    pub fn mark(&mut self, field: &'static str) {
        self.0.insert(field);
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keeps the entries whose field was marked as provided.
    pub fn select<const N: usize>(&self, entries: [(&'static str, FieldValue); N]) -> FieldMap {
        entries
            .into_iter()
            .filter(|(name, _)| self.contains(name))
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}
