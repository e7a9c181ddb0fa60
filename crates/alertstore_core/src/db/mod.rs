//! SQLite storage bootstrap, schema migrations and table naming.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the alert store.
//! - Apply schema migrations in deterministic order.
//! - Derive table names from entity type names.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No repository may touch a connection before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod naming;
mod open;

pub use naming::table_name;
pub use open::{open_db, open_db_in_memory, open_db_with};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening, configuring or migrating the alert store.
#[derive(Debug)]
pub enum DbError {
    /// SQLite refused to open the file or in-memory database.
    Open {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// A numbered schema migration failed; the whole batch was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build of the alert store.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Connection setting rejected before any SQL ran.
    InvalidConfig(&'static str),
    /// Any other statement failure on an open connection.
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// The underlying SQLite error, when there is one.
    pub fn sqlite_error(&self) -> Option<&rusqlite::Error> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::InvalidConfig(_) => None,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { mode, source } => {
                write!(f, "cannot open {mode} alert store: {source}")
            }
            Self::Migration {
                version,
                name,
                source,
            } => write!(
                f,
                "alert store migration {version:04}_{name} failed: {source}"
            ),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "alert store schema v{db_version} was written by a newer build; this build reads up to v{latest_supported}"
            ),
            Self::InvalidConfig(message) => write!(f, "invalid alert store config: {message}"),
            Self::Sqlite(err) => write!(f, "alert store sqlite error: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.sqlite_error().map(|err| err as &(dyn Error + 'static))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use std::error::Error;

    fn sqlite_failure() -> rusqlite::Error {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("SELECT * FROM missing;", []).unwrap_err()
    }

    #[test]
    fn migration_error_names_the_failed_step() {
        let err = DbError::Migration {
            version: 2,
            name: "alert_configs",
            source: sqlite_failure(),
        };

        let message = err.to_string();
        assert!(message.starts_with("alert store migration 0002_alert_configs failed: "));
        assert!(err.source().is_some());
        assert!(err.sqlite_error().is_some());
    }

    #[test]
    fn schema_and_config_errors_carry_no_sqlite_source() {
        let newer = DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 2,
        };
        assert_eq!(
            newer.to_string(),
            "alert store schema v9 was written by a newer build; this build reads up to v2"
        );
        assert!(newer.source().is_none());

        let config = DbError::InvalidConfig("path cannot be empty");
        assert_eq!(
            config.to_string(),
            "invalid alert store config: path cannot be empty"
        );
        assert!(config.sqlite_error().is_none());
    }
}
