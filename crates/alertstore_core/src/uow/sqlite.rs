//! SQLite-backed unit of work.
//!
//! # Responsibility
//! - Translate descriptor-driven fetch/add/save/delete calls into SQL.
//! - Group writes into one pending scope that the strategy commits or
//!   discards.
//!
//! # Invariants
//! - Only descriptor-declared identifiers are interpolated into SQL; every
//!   value is bound as a parameter.
//! - `created_at` and `updated_at` come from the database clock inside the
//!   writing statement; `updated_at` strictly increases on every save.
//! - A save writes only the columns it is told about, so concurrent partial
//!   updates to other columns of the same row survive.
//! - Pending writes are rolled back when the session closes or drops.

use super::strategy::{DurableCommit, TransactionStrategy};
use super::UnitOfWork;
use crate::db::migrations::{current_user_version, latest_version};
use crate::model::entity::{Entity, EntityDescriptor, EntityId, Record};
use crate::model::validation::ValidationError;
use crate::model::value::{FieldDef, FieldKind, FieldMap, FieldValue, FilterMap};
use crate::repo::{RepoError, RepoResult};
use log::{debug, warn};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, Row, ToSql};

/// Epoch milliseconds from the database clock, stable within one statement.
const NOW_MS_SQL: &str = "CAST(ROUND((julianday('now') - 2440587.5) * 86400000.0) AS INTEGER)";

/// Unit of work owning one SQLite connection.
pub struct SqliteUnitOfWork<S: TransactionStrategy = DurableCommit> {
    conn: Connection,
    strategy: S,
    pending: bool,
    closed: bool,
}

impl SqliteUnitOfWork<DurableCommit> {
    /// Wraps a migrated connection with durable commits.
    pub fn new(conn: Connection) -> RepoResult<Self> {
        Self::with_strategy(conn, DurableCommit)
    }
}

impl<S: TransactionStrategy> SqliteUnitOfWork<S> {
    /// Wraps a migrated connection with an explicit transaction strategy.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not the latest.
    pub fn with_strategy(conn: Connection, strategy: S) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        strategy.on_open(&conn)?;
        debug!(
            "event=uow_open module=uow status=ok strategy={}",
            strategy.name()
        );
        Ok(Self {
            conn,
            strategy,
            pending: false,
            closed: false,
        })
    }

    /// Borrow of the underlying connection for ad-hoc reads.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn has_pending_writes(&self) -> bool {
        self.pending
    }

    /// Verifies the table and every descriptor column of `E` exist.
    pub fn ensure_entity_table<E: Entity>(&self) -> RepoResult<()> {
        let descriptor = EntityDescriptor::of::<E>();
        if !table_exists(&self.conn, &descriptor.table)? {
            return Err(RepoError::MissingRequiredTable(descriptor.table));
        }
        for column in descriptor.column_names() {
            if !table_has_column(&self.conn, &descriptor.table, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table: descriptor.table,
                    column,
                });
            }
        }
        Ok(())
    }

    /// Discards pending writes and releases the strategy's session state.
    pub fn close(mut self) -> RepoResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> RepoResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.pending {
            warn!(
                "event=uow_close module=uow status=discarded strategy={}",
                self.strategy.name()
            );
            self.pending = false;
            self.strategy.rollback(&self.conn)?;
        }
        self.strategy.on_close(&self.conn)?;
        Ok(())
    }

    fn open_write_scope(&mut self) -> RepoResult<()> {
        if !self.pending {
            self.strategy.begin(&self.conn)?;
            self.pending = true;
        }
        Ok(())
    }

    fn query_records<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        sql: &str,
        params: &[FieldValue],
    ) -> RepoResult<Vec<Record<E>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record(descriptor, row)?);
        }
        Ok(records)
    }
}

impl<S: TransactionStrategy> Drop for SqliteUnitOfWork<S> {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!("event=uow_close module=uow status=error error={err}");
        }
    }
}

impl<S: TransactionStrategy> UnitOfWork for SqliteUnitOfWork<S> {
    fn fetch_by_id<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        id: EntityId,
    ) -> RepoResult<Option<Record<E>>> {
        let sql = format!(
            "{} WHERE {} = ?1 LIMIT 1;",
            select_sql(descriptor),
            quote_ident(descriptor.id_field)
        );
        let records = self.query_records(descriptor, &sql, &[FieldValue::Integer(id)])?;
        Ok(records.into_iter().next())
    }

    fn fetch_one<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        filters: &FilterMap,
    ) -> RepoResult<Option<Record<E>>> {
        let mut params = Vec::new();
        let sql = format!(
            "{}{} LIMIT 1;",
            select_sql(descriptor),
            where_clause(descriptor, filters, &mut params)?
        );
        let records = self.query_records(descriptor, &sql, &params)?;
        Ok(records.into_iter().next())
    }

    fn fetch_many<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        filters: Option<&FilterMap>,
        skip: u32,
        limit: u32,
    ) -> RepoResult<Vec<Record<E>>> {
        let mut params = Vec::new();
        let mut sql = select_sql(descriptor);
        if let Some(filters) = filters {
            sql.push_str(&where_clause(descriptor, filters, &mut params)?);
        }
        params.push(FieldValue::Integer(i64::from(limit)));
        params.push(FieldValue::Integer(i64::from(skip)));
        sql.push_str(&format!(
            " ORDER BY {} ASC LIMIT ?{} OFFSET ?{};",
            quote_ident(descriptor.id_field),
            params.len() - 1,
            params.len()
        ));
        self.query_records(descriptor, &sql, &params)
    }

    fn add<E: Entity>(&mut self, descriptor: &EntityDescriptor, entity: &E) -> RepoResult<EntityId> {
        let values = field_values(descriptor, entity)?;
        self.open_write_scope()?;

        let mut columns = Vec::with_capacity(values.len() + 2);
        let mut placeholders = Vec::with_capacity(values.len() + 2);
        for (index, def) in descriptor.fields.iter().enumerate() {
            columns.push(quote_ident(def.name));
            placeholders.push(format!("?{}", index + 1));
        }
        for column in [descriptor.created_at_field, descriptor.updated_at_field] {
            columns.push(quote_ident(column));
            placeholders.push(NOW_MS_SQL.to_string());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            quote_ident(&descriptor.table),
            columns.join(", "),
            placeholders.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn save<E: Entity>(
        &mut self,
        descriptor: &EntityDescriptor,
        record: &Record<E>,
        fields: &[&'static str],
    ) -> RepoResult<()> {
        let mut values = Vec::with_capacity(fields.len() + 1);
        let mut assignments = Vec::with_capacity(fields.len() + 1);
        for name in fields {
            let def = descriptor
                .fields
                .iter()
                .find(|def| def.name == *name)
                .ok_or_else(|| ValidationError::unknown_field(descriptor.type_name, *name))?;
            values.push(checked_value(descriptor, def, &record.entity)?);
            assignments.push(format!("{} = ?{}", quote_ident(def.name), values.len()));
        }
        self.open_write_scope()?;

        let updated_at = quote_ident(descriptor.updated_at_field);
        assignments.push(format!("{updated_at} = MAX({updated_at} + 1, {NOW_MS_SQL})"));
        values.push(FieldValue::Integer(record.id));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{};",
            quote_ident(&descriptor.table),
            assignments.join(", "),
            quote_ident(descriptor.id_field),
            values.len()
        );
        let changed = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        if changed == 0 {
            return Err(RepoError::MissingTarget {
                entity: descriptor.type_name,
                id: record.id,
            });
        }
        Ok(())
    }

    fn delete(&mut self, descriptor: &EntityDescriptor, id: EntityId) -> RepoResult<()> {
        self.open_write_scope()?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1;",
            quote_ident(&descriptor.table),
            quote_ident(descriptor.id_field)
        );
        let changed = self.conn.execute(&sql, [id])?;
        if changed == 0 {
            return Err(RepoError::MissingTarget {
                entity: descriptor.type_name,
                id,
            });
        }
        Ok(())
    }

    fn commit(&mut self) -> RepoResult<()> {
        if !self.pending {
            return Ok(());
        }
        self.strategy.commit(&self.conn)?;
        self.pending = false;
        debug!(
            "event=uow_commit module=uow status=ok strategy={}",
            self.strategy.name()
        );
        Ok(())
    }

    fn rollback(&mut self) -> RepoResult<()> {
        if !self.pending {
            return Ok(());
        }
        self.pending = false;
        self.strategy.rollback(&self.conn)?;
        debug!(
            "event=uow_rollback module=uow status=ok strategy={}",
            self.strategy.name()
        );
        Ok(())
    }

    fn refresh<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        id: EntityId,
    ) -> RepoResult<Record<E>> {
        self.fetch_by_id(descriptor, id)?
            .ok_or(RepoError::MissingTarget {
                entity: descriptor.type_name,
                id,
            })
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(Value::Null),
            Self::Integer(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            Self::Real(value) => ToSqlOutput::Owned(Value::Real(*value)),
            Self::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
            Self::Enum(name) => ToSqlOutput::Borrowed(ValueRef::Text(name.as_bytes())),
        })
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn select_sql(descriptor: &EntityDescriptor) -> String {
    let columns: Vec<String> = descriptor
        .column_names()
        .into_iter()
        .map(quote_ident)
        .collect();
    format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        quote_ident(&descriptor.table)
    )
}

/// Builds ` WHERE a = ?1 AND b IS NULL`, appending bound values to `params`.
fn where_clause(
    descriptor: &EntityDescriptor,
    filters: &FilterMap,
    params: &mut Vec<FieldValue>,
) -> RepoResult<String> {
    if filters.is_empty() {
        return Ok(String::new());
    }

    let mut clauses = Vec::with_capacity(filters.len());
    for (name, value) in filters {
        let def = descriptor
            .column(name)
            .ok_or_else(|| ValidationError::unknown_field(descriptor.type_name, name.as_str()))?;
        if value.is_null() {
            clauses.push(format!("{} IS NULL", quote_ident(def.name)));
        } else {
            params.push(value.clone());
            clauses.push(format!("{} = ?{}", quote_ident(def.name), params.len()));
        }
    }
    Ok(format!(" WHERE {}", clauses.join(" AND ")))
}

/// Collects every declared field of `entity`, checked against its descriptor.
fn field_values<E: Entity>(
    descriptor: &EntityDescriptor,
    entity: &E,
) -> RepoResult<Vec<FieldValue>> {
    descriptor
        .fields
        .iter()
        .map(|def| checked_value(descriptor, def, entity))
        .collect()
}

fn checked_value<E: Entity>(
    descriptor: &EntityDescriptor,
    def: &FieldDef,
    entity: &E,
) -> RepoResult<FieldValue> {
    let value = entity
        .field_value(def.name)
        .ok_or_else(|| ValidationError::unknown_field(descriptor.type_name, def.name))?;
    if !def.accepts(&value) {
        return Err(ValidationError::TypeMismatch {
            field: def.name.to_string(),
            expected: def.kind.label(),
            found: value.kind_label(),
        }
        .into());
    }
    Ok(value)
}

fn parse_record<E: Entity>(descriptor: &EntityDescriptor, row: &Row<'_>) -> RepoResult<Record<E>> {
    let id: EntityId = row.get(0)?;
    let created_at = row.get(1)?;
    let updated_at = row.get(2)?;

    let mut fields = FieldMap::new();
    for (offset, def) in descriptor.fields.iter().enumerate() {
        let value = read_field(descriptor, def, row.get_ref(offset + 3)?)?;
        fields.insert(def.name.to_string(), value);
    }

    let entity = E::from_fields(fields).map_err(|err| {
        RepoError::InvalidData(format!("row {id} in {}: {err}", descriptor.table))
    })?;
    Ok(Record {
        id,
        created_at,
        updated_at,
        entity,
    })
}

fn read_field(
    descriptor: &EntityDescriptor,
    def: &FieldDef,
    value: ValueRef<'_>,
) -> RepoResult<FieldValue> {
    let invalid = |detail: String| {
        RepoError::InvalidData(format!(
            "invalid {detail} in {}.{}",
            descriptor.table, def.name
        ))
    };
    let text = |bytes: &[u8]| {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| invalid("utf-8 text".to_string()))
    };

    match (def.kind, value) {
        (_, ValueRef::Null) => Ok(FieldValue::Null),
        (FieldKind::Integer, ValueRef::Integer(value)) => Ok(FieldValue::Integer(value)),
        (FieldKind::Real, ValueRef::Real(value)) => Ok(FieldValue::Real(value)),
        (FieldKind::Real, ValueRef::Integer(value)) => Ok(FieldValue::Real(value as f64)),
        (FieldKind::Text, ValueRef::Text(bytes)) => text(bytes).map(FieldValue::Text),
        (FieldKind::Enum(names), ValueRef::Text(bytes)) => {
            let name = text(bytes)?;
            names
                .iter()
                .find(|candidate| **candidate == name)
                .map(|candidate| FieldValue::Enum(*candidate))
                .ok_or_else(|| invalid(format!("enum value `{name}`")))
        }
        (kind, other) => Err(invalid(format!(
            "{} value for {} field",
            other.data_type(),
            kind.label()
        ))),
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", quote_ident(table)))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
