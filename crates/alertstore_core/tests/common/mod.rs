#![allow(dead_code)]

use alertstore_core::model::validation::require_non_blank;
use alertstore_core::{
    open_db_in_memory, Entity, EntityInput, ExplicitFields, FieldDef, FieldKind, FieldMap,
    FieldValue, ProvidedFields, SqliteUnitOfWork, ValidationError,
};
use rusqlite::Connection;

pub const WIDGET_DDL: &str = "
CREATE TABLE widget (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    name TEXT NOT NULL,
    label TEXT,
    count INTEGER
);";

/// Minimal entity used to exercise the generic repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Widget {
    pub name: String,
    pub label: Option<String>,
    pub count: Option<i64>,
}

impl Entity for Widget {
    const TYPE_NAME: &'static str = "Widget";
    const FIELDS: &'static [FieldDef] = &[
        FieldDef::required("name", FieldKind::Text),
        FieldDef::optional("label", FieldKind::Text),
        FieldDef::optional("count", FieldKind::Integer),
    ];

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "name" => Some(self.name.as_str().into()),
            "label" => Some(self.label.as_deref().into()),
            "count" => Some(self.count.into()),
            _ => None,
        }
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), ValidationError> {
        match field {
            "name" => self.name = value.into_text(field)?,
            "label" => self.label = value.into_optional_text(field)?,
            "count" => self.count = value.into_optional_integer(field)?,
            _ => return Err(ValidationError::unknown_field(Self::TYPE_NAME, field)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WidgetInput {
    name: String,
    label: Option<String>,
    count: Option<i64>,
    provided: ProvidedFields,
}

impl WidgetInput {
    pub fn new(name: &str) -> Self {
        Self::default().name(name)
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self.provided.mark("name");
        self
    }

    pub fn label(mut self, label: Option<&str>) -> Self {
        self.label = label.map(str::to_string);
        self.provided.mark("label");
        self
    }

    pub fn count(mut self, count: Option<i64>) -> Self {
        self.count = count;
        self.provided.mark("count");
        self
    }
}

impl ExplicitFields for WidgetInput {
    fn explicit_fields(&self) -> FieldMap {
        self.provided.select([
            ("name", self.name.as_str().into()),
            ("label", self.label.as_deref().into()),
            ("count", self.count.into()),
        ])
    }
}

impl EntityInput<Widget> for WidgetInput {
    fn to_entity(&self) -> Widget {
        Widget {
            name: self.name.clone(),
            label: self.label.clone(),
            count: self.count,
        }
    }
}

/// Migrated in-memory store with the `widget` table added.
pub fn widget_session() -> SqliteUnitOfWork {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(WIDGET_DDL).unwrap();
    SqliteUnitOfWork::new(conn).unwrap()
}

pub fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
