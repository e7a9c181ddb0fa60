//! Entity descriptor contract and the persisted record wrapper.
//!
//! # Responsibility
//! - Describe a persisted type: identity, timestamps and writable fields.
//! - Map fields by name through explicit per-type functions.
//!
//! # Invariants
//! - `id` is assigned by storage on insert and never changes afterwards.
//! - `created_at` is set once; `updated_at` advances on every mutation.
//! - `FIELDS` lists only caller-writable fields; identity and timestamp
//!   columns are described by the `*_FIELD` constants.

use super::validation::ValidationError;
use super::value::{FieldDef, FieldKind, FieldMap, FieldValue};
use crate::db::table_name;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::ops::{Deref, DerefMut};

/// Surrogate identity assigned by storage.
pub type EntityId = i64;

/// Unix epoch milliseconds.
pub type Timestamp = i64;

/// A persisted domain type.
///
/// Implementors provide explicit name-based accessors instead of relying on
/// reflection. `Default` is the starting point when a row is read back.
pub trait Entity: Clone + Debug + Default {
    /// CamelCase type name; the table name is its snake_case form.
    const TYPE_NAME: &'static str;
    const ID_FIELD: &'static str = "id";
    const CREATED_AT_FIELD: &'static str = "created_at";
    const UPDATED_AT_FIELD: &'static str = "updated_at";
    /// Caller-writable persisted fields, in column order.
    const FIELDS: &'static [FieldDef];

    /// Returns the current value of a declared field, `None` for unknown names.
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Overwrites a declared field.
    ///
    /// # Errors
    /// - `UnknownField` when `field` is not declared.
    /// - `TypeMismatch` when `value` does not fit the field.
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), ValidationError>;

    /// Entity-level rules checked before every write.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Builds an entity from a complete set of field values.
    fn from_fields(mut fields: FieldMap) -> Result<Self, ValidationError> {
        let mut entity = Self::default();
        for def in Self::FIELDS {
            let value = fields.remove(def.name).unwrap_or(FieldValue::Null);
            entity.set_field(def.name, value)?;
        }
        if let Some(name) = fields.into_keys().next() {
            return Err(ValidationError::unknown_field(Self::TYPE_NAME, name));
        }
        Ok(entity)
    }
}

/// Runtime view of an `Entity` type, resolved once per repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub type_name: &'static str,
    pub table: String,
    pub id_field: &'static str,
    pub created_at_field: &'static str,
    pub updated_at_field: &'static str,
    pub fields: &'static [FieldDef],
}

impl EntityDescriptor {
    pub fn of<E: Entity>() -> Self {
        Self {
            type_name: E::TYPE_NAME,
            table: table_name(E::TYPE_NAME),
            id_field: E::ID_FIELD,
            created_at_field: E::CREATED_AT_FIELD,
            updated_at_field: E::UPDATED_AT_FIELD,
            fields: E::FIELDS,
        }
    }

    /// Returns whether `name` is the identity or a timestamp column.
    pub fn is_managed(&self, name: &str) -> bool {
        name == self.id_field || name == self.created_at_field || name == self.updated_at_field
    }

    /// Looks up any filterable column, including identity and timestamps.
    pub fn column(&self, name: &str) -> Option<FieldDef> {
        if name == self.id_field {
            return Some(FieldDef::required(self.id_field, FieldKind::Integer));
        }
        if name == self.created_at_field {
            return Some(FieldDef::required(self.created_at_field, FieldKind::Integer));
        }
        if name == self.updated_at_field {
            return Some(FieldDef::required(self.updated_at_field, FieldKind::Integer));
        }
        self.fields.iter().find(|def| def.name == name).copied()
    }

    /// Every column name in select order: identity, timestamps, then fields.
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut names = vec![self.id_field, self.created_at_field, self.updated_at_field];
        names.extend(self.fields.iter().map(|def| def.name));
        names
    }
}

/// One stored row: storage-assigned metadata plus domain fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<E> {
    pub id: EntityId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub entity: E,
}

impl<E: Entity> Record<E> {
    /// Reads any column by name, including identity and timestamps.
    pub fn field_value(&self, name: &str) -> Option<FieldValue> {
        if name == E::ID_FIELD {
            return Some(FieldValue::Integer(self.id));
        }
        if name == E::CREATED_AT_FIELD {
            return Some(FieldValue::Integer(self.created_at));
        }
        if name == E::UPDATED_AT_FIELD {
            return Some(FieldValue::Integer(self.updated_at));
        }
        self.entity.field_value(name)
    }

    pub fn into_entity(self) -> E {
        self.entity
    }
}

impl<E> Deref for Record<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.entity
    }
}

impl<E> DerefMut for Record<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::{Entity, EntityDescriptor, Record};
    use crate::model::region::{District, State};
    use crate::model::validation::ValidationError;
    use crate::model::value::{field_map, FieldKind, FieldValue};

    #[test]
    fn descriptor_derives_table_and_column_order() {
        let descriptor = EntityDescriptor::of::<District>();
        assert_eq!(descriptor.table, "district");
        assert_eq!(
            descriptor.column_names(),
            ["id", "created_at", "updated_at", "state_id", "name", "external_id"]
        );
        assert!(descriptor.is_managed("updated_at"));
        assert!(!descriptor.is_managed("name"));
        assert_eq!(descriptor.column("id").unwrap().kind, FieldKind::Integer);
        assert!(descriptor.column("missing").is_none());
    }

    #[test]
    fn from_fields_rejects_leftover_names() {
        let err = State::from_fields(field_map([
            ("name", FieldValue::from("Goa")),
            ("external_id", FieldValue::Integer(30)),
            ("capital", FieldValue::from("Panaji")),
        ]))
        .unwrap_err();
        assert_eq!(err, ValidationError::unknown_field("State", "capital"));
    }

    #[test]
    fn record_serializes_entity_fields_inline() {
        let record = Record {
            id: 7,
            created_at: 1_000,
            updated_at: 1_001,
            entity: State {
                name: "Goa".to_string(),
                external_id: 30,
            },
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "created_at": 1_000,
                "updated_at": 1_001,
                "name": "Goa",
                "external_id": 30
            })
        );
        assert_eq!(record.field_value("id"), Some(FieldValue::Integer(7)));
        assert_eq!(record.name, "Goa");
    }
}
