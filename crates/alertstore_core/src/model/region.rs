//! Region entities: states and the districts inside them.
//!
//! # Invariants
//! - `name` is never blank.
//! - `external_id` is the identifier used by the upstream availability feed.
//! - `District::state_id`, when set, must reference an existing state.

use super::entity::{Entity, EntityId};
use super::input::{EntityInput, ExplicitFields, ProvidedFields};
use super::validation::{require_non_blank, ValidationError};
use super::value::{FieldDef, FieldKind, FieldMap, FieldValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub external_id: i64,
}

impl Entity for State {
    const TYPE_NAME: &'static str = "State";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::required("name", FieldKind::Text),
        FieldDef::required("external_id", FieldKind::Integer),
    ];

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "name" => Some(self.name.as_str().into()),
            "external_id" => Some(self.external_id.into()),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), ValidationError> {
        match field {
            "name" => self.name = value.into_text(field)?,
            "external_id" => self.external_id = value.into_integer(field)?,
            _ => return Err(ValidationError::unknown_field(Self::TYPE_NAME, field)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)
    }
}

/// Create/update input for `State`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateInput {
    name: String,
    external_id: i64,
    provided: ProvidedFields,
}

impl StateInput {
    pub fn new(name: impl Into<String>, external_id: i64) -> Self {
        Self::default().name(name).external_id(external_id)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.provided.mark("name");
        self
    }

    pub fn external_id(mut self, external_id: i64) -> Self {
        self.external_id = external_id;
        self.provided.mark("external_id");
        self
    }
}

impl ExplicitFields for StateInput {
    fn explicit_fields(&self) -> FieldMap {
        self.provided.select([
            ("name", self.name.as_str().into()),
            ("external_id", self.external_id.into()),
        ])
    }
}

impl EntityInput<State> for StateInput {
    fn to_entity(&self) -> State {
        State {
            name: self.name.clone(),
            external_id: self.external_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub state_id: Option<EntityId>,
    pub name: String,
    pub external_id: i64,
}

impl Entity for District {
    const TYPE_NAME: &'static str = "District";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::optional("state_id", FieldKind::Integer),
        FieldDef::required("name", FieldKind::Text),
        FieldDef::required("external_id", FieldKind::Integer),
    ];

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "state_id" => Some(self.state_id.into()),
            "name" => Some(self.name.as_str().into()),
            "external_id" => Some(self.external_id.into()),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), ValidationError> {
        match field {
            "state_id" => self.state_id = value.into_optional_integer(field)?,
            "name" => self.name = value.into_text(field)?,
            "external_id" => self.external_id = value.into_integer(field)?,
            _ => return Err(ValidationError::unknown_field(Self::TYPE_NAME, field)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)
    }
}

/// Create/update input for `District`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistrictInput {
    state_id: Option<EntityId>,
    name: String,
    external_id: i64,
    provided: ProvidedFields,
}

impl DistrictInput {
    pub fn new(name: impl Into<String>, external_id: i64) -> Self {
        Self::default().name(name).external_id(external_id)
    }

    pub fn state_id(mut self, state_id: Option<EntityId>) -> Self {
        self.state_id = state_id;
        self.provided.mark("state_id");
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.provided.mark("name");
        self
    }

    pub fn external_id(mut self, external_id: i64) -> Self {
        self.external_id = external_id;
        self.provided.mark("external_id");
        self
    }
}

impl ExplicitFields for DistrictInput {
    fn explicit_fields(&self) -> FieldMap {
        self.provided.select([
            ("state_id", self.state_id.into()),
            ("name", self.name.as_str().into()),
            ("external_id", self.external_id.into()),
        ])
    }
}

impl EntityInput<District> for DistrictInput {
    fn to_entity(&self) -> District {
        District {
            state_id: self.state_id,
            name: self.name.clone(),
            external_id: self.external_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{District, DistrictInput, State, StateInput};
    use crate::model::entity::Entity;
    use crate::model::input::{EntityInput, ExplicitFields};
    use crate::model::validation::ValidationError;
    use crate::model::value::{field_map, FieldValue};

    #[test]
    fn default_input_reports_no_explicit_fields() {
        assert!(StateInput::default().explicit_fields().is_empty());
    }

    #[test]
    fn setters_mark_fields_explicit() {
        let input = DistrictInput::default().state_id(None).external_id(7);
        assert_eq!(
            input.explicit_fields(),
            field_map([("state_id", FieldValue::Null), ("external_id", 7.into())])
        );
    }

    #[test]
    fn to_entity_uses_defaults_for_unset_fields() {
        let district = DistrictInput::default().name("Pune").to_entity();
        assert_eq!(
            district,
            District {
                state_id: None,
                name: "Pune".to_string(),
                external_id: 0,
            }
        );
    }

    #[test]
    fn set_field_rejects_unknown_and_mistyped_values() {
        let mut state = StateInput::new("Kerala", 17).to_entity();

        let unknown = state.set_field("capital", "x".into()).unwrap_err();
        assert_eq!(unknown, ValidationError::unknown_field("State", "capital"));

        let mistyped = state.set_field("external_id", "17".into()).unwrap_err();
        assert!(matches!(mistyped, ValidationError::TypeMismatch { .. }));
        assert_eq!(state.external_id, 17);
    }

    #[test]
    fn blank_name_fails_validation() {
        let state = State {
            name: "  ".to_string(),
            external_id: 1,
        };
        assert!(state.validate().is_err());
    }
}
