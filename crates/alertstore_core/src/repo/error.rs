//! Repository error taxonomy.

use crate::db::DbError;
use crate::model::entity::EntityId;
use crate::model::validation::ValidationError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from repository and unit-of-work operations.
///
/// "Not found" on lookups is not an error; lookups return `Ok(None)`.
#[derive(Debug)]
pub enum RepoError {
    /// Caller misuse detected before SQL ran.
    Validation(ValidationError),
    /// Unique, foreign-key, NOT NULL or CHECK constraint violated.
    Integrity(rusqlite::Error),
    /// A remove/save targeted an identity with no stored row.
    MissingTarget { entity: &'static str, id: EntityId },
    /// The write committed but reloading the row failed.
    Refresh {
        entity: &'static str,
        id: EntityId,
        source: Box<RepoError>,
    },
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(String),
    /// Required column is missing from expected table.
    MissingRequiredColumn { table: String, column: &'static str },
    /// Persisted data cannot be converted to the entity type.
    InvalidData(String),
}

impl RepoError {
    /// Returns whether this failure left no durable change behind.
    ///
    /// Only a post-commit refresh failure means the write did happen.
    pub fn is_write_discarded(&self) -> bool {
        !matches!(self, Self::Refresh { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::Integrity(err) => write!(f, "integrity constraint violated: {err}"),
            Self::MissingTarget { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Refresh { entity, id, source } => {
                write!(f, "{entity} {id} was written but could not be reloaded: {source}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Integrity(err) => Some(err),
            Self::MissingTarget { .. } => None,
            Self::Refresh { source, .. } => Some(source.as_ref()),
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_constraint_violation(&value) {
            return Self::Integrity(value);
        }
        Self::Db(DbError::Sqlite(value))
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}
