//! Alert subscriptions and the filters attached to them.
//!
//! # Invariants
//! - `AlertConfig::chat_id` and `name` are never blank.
//! - `FilterKind` and `Evaluator` persist by variant name; `Evaluator::symbol`
//!   is presentation only.

use super::entity::{Entity, EntityId};
use super::input::{EntityInput, ExplicitFields, ProvidedFields};
use super::validation::{require_non_blank, ValidationError};
use super::value::{DbEnum, FieldDef, FieldKind, FieldMap, FieldValue};
use serde::{Deserialize, Serialize};

/// Attribute of an availability slot that a filter inspects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    #[default]
    Vaccine,
    Age,
    Dose,
}

impl DbEnum for FilterKind {
    const NAMES: &'static [&'static str] = &["Vaccine", "Age", "Dose"];

    fn db_name(self) -> &'static str {
        match self {
            Self::Vaccine => "Vaccine",
            Self::Age => "Age",
            Self::Dose => "Dose",
        }
    }

    fn from_db_name(name: &str) -> Option<Self> {
        match name {
            "Vaccine" => Some(Self::Vaccine),
            "Age" => Some(Self::Age),
            "Dose" => Some(Self::Dose),
            _ => None,
        }
    }
}

impl From<FilterKind> for FieldValue {
    fn from(value: FilterKind) -> Self {
        Self::Enum(value.db_name())
    }
}

/// Comparison applied between a slot attribute and the configured value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Evaluator {
    #[default]
    Equals,
    GreaterThan,
    LessThan,
    In,
}

impl Evaluator {
    /// Display form shown to chat users.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::In => "in",
        }
    }
}

impl DbEnum for Evaluator {
    const NAMES: &'static [&'static str] = &["Equals", "GreaterThan", "LessThan", "In"];

    fn db_name(self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::GreaterThan => "GreaterThan",
            Self::LessThan => "LessThan",
            Self::In => "In",
        }
    }

    fn from_db_name(name: &str) -> Option<Self> {
        match name {
            "Equals" => Some(Self::Equals),
            "GreaterThan" => Some(Self::GreaterThan),
            "LessThan" => Some(Self::LessThan),
            "In" => Some(Self::In),
            _ => None,
        }
    }
}

impl From<Evaluator> for FieldValue {
    fn from(value: Evaluator) -> Self {
        Self::Enum(value.db_name())
    }
}

/// One chat's subscription to availability alerts for a district.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub district_id: Option<EntityId>,
    pub chat_id: String,
    pub name: String,
    pub description: Option<String>,
}

impl Entity for AlertConfig {
    const TYPE_NAME: &'static str = "AlertConfig";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::optional("district_id", FieldKind::Integer),
        FieldDef::required("chat_id", FieldKind::Text),
        FieldDef::required("name", FieldKind::Text),
        FieldDef::optional("description", FieldKind::Text),
    ];

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "district_id" => Some(self.district_id.into()),
            "chat_id" => Some(self.chat_id.as_str().into()),
            "name" => Some(self.name.as_str().into()),
            "description" => Some(self.description.as_deref().into()),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), ValidationError> {
        match field {
            "district_id" => self.district_id = value.into_optional_integer(field)?,
            "chat_id" => self.chat_id = value.into_text(field)?,
            "name" => self.name = value.into_text(field)?,
            "description" => self.description = value.into_optional_text(field)?,
            _ => return Err(ValidationError::unknown_field(Self::TYPE_NAME, field)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("chat_id", &self.chat_id)?;
        require_non_blank("name", &self.name)
    }
}

/// Create/update input for `AlertConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertConfigInput {
    district_id: Option<EntityId>,
    chat_id: String,
    name: String,
    description: Option<String>,
    provided: ProvidedFields,
}

impl AlertConfigInput {
    pub fn new(chat_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::default().chat_id(chat_id).name(name)
    }

    pub fn district_id(mut self, district_id: Option<EntityId>) -> Self {
        self.district_id = district_id;
        self.provided.mark("district_id");
        self
    }

    pub fn chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = chat_id.into();
        self.provided.mark("chat_id");
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.provided.mark("name");
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self.provided.mark("description");
        self
    }
}

impl ExplicitFields for AlertConfigInput {
    fn explicit_fields(&self) -> FieldMap {
        self.provided.select([
            ("district_id", self.district_id.into()),
            ("chat_id", self.chat_id.as_str().into()),
            ("name", self.name.as_str().into()),
            ("description", self.description.as_deref().into()),
        ])
    }
}

impl EntityInput<AlertConfig> for AlertConfigInput {
    fn to_entity(&self) -> AlertConfig {
        AlertConfig {
            district_id: self.district_id,
            chat_id: self.chat_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// A single filter rule attached to an alert config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredFilter {
    pub alert_config_id: Option<EntityId>,
    pub filter: FilterKind,
    pub evaluator: Evaluator,
    pub value: String,
}

impl Entity for ConfiguredFilter {
    const TYPE_NAME: &'static str = "ConfiguredFilter";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::optional("alert_config_id", FieldKind::Integer),
        FieldDef::required("filter", FieldKind::Enum(FilterKind::NAMES)),
        FieldDef::required("evaluator", FieldKind::Enum(Evaluator::NAMES)),
        FieldDef::required("value", FieldKind::Text),
    ];

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "alert_config_id" => Some(self.alert_config_id.into()),
            "filter" => Some(self.filter.into()),
            "evaluator" => Some(self.evaluator.into()),
            "value" => Some(self.value.as_str().into()),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), ValidationError> {
        match field {
            "alert_config_id" => self.alert_config_id = value.into_optional_integer(field)?,
            "filter" => self.filter = value.into_enum(field)?,
            "evaluator" => self.evaluator = value.into_enum(field)?,
            "value" => self.value = value.into_text(field)?,
            _ => return Err(ValidationError::unknown_field(Self::TYPE_NAME, field)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("value", &self.value)
    }
}

/// Create/update input for `ConfiguredFilter`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfiguredFilterInput {
    alert_config_id: Option<EntityId>,
    filter: FilterKind,
    evaluator: Evaluator,
    value: String,
    provided: ProvidedFields,
}

impl ConfiguredFilterInput {
    pub fn new(filter: FilterKind, evaluator: Evaluator, value: impl Into<String>) -> Self {
        Self::default()
            .filter(filter)
            .evaluator(evaluator)
            .value(value)
    }

    pub fn alert_config_id(mut self, alert_config_id: Option<EntityId>) -> Self {
        self.alert_config_id = alert_config_id;
        self.provided.mark("alert_config_id");
        self
    }

    pub fn filter(mut self, filter: FilterKind) -> Self {
        self.filter = filter;
        self.provided.mark("filter");
        self
    }

    pub fn evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self.provided.mark("evaluator");
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self.provided.mark("value");
        self
    }
}

impl ExplicitFields for ConfiguredFilterInput {
    fn explicit_fields(&self) -> FieldMap {
        self.provided.select([
            ("alert_config_id", self.alert_config_id.into()),
            ("filter", self.filter.into()),
            ("evaluator", self.evaluator.into()),
            ("value", self.value.as_str().into()),
        ])
    }
}

impl EntityInput<ConfiguredFilter> for ConfiguredFilterInput {
    fn to_entity(&self) -> ConfiguredFilter {
        ConfiguredFilter {
            alert_config_id: self.alert_config_id,
            filter: self.filter,
            evaluator: self.evaluator,
            value: self.value.clone(),
        }
    }
}
