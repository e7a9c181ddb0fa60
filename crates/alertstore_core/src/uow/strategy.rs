//! Transaction strategies injected into `SqliteUnitOfWork`.
//!
//! `DurableCommit` is the production behavior. `FlushOnly` keeps one outer
//! transaction open for the whole session: a commit only releases a
//! savepoint, so writes become visible on the same connection but are
//! discarded when the session closes.

use rusqlite::Connection;

const FLUSH_SAVEPOINT: &str = "uow_flush";

/// How a unit of work opens, commits and discards pending writes.
pub trait TransactionStrategy {
    /// Short label used in log events.
    fn name(&self) -> &'static str;

    /// Runs once when the session takes ownership of the connection.
    fn on_open(&self, _conn: &Connection) -> rusqlite::Result<()> {
        Ok(())
    }

    /// Opens the scope for the next batch of pending writes.
    fn begin(&self, conn: &Connection) -> rusqlite::Result<()>;

    fn commit(&self, conn: &Connection) -> rusqlite::Result<()>;

    fn rollback(&self, conn: &Connection) -> rusqlite::Result<()>;

    /// Runs once when the session closes, after pending writes were discarded.
    fn on_close(&self, _conn: &Connection) -> rusqlite::Result<()> {
        Ok(())
    }
}

/// Each commit ends a `BEGIN IMMEDIATE` transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurableCommit;

impl TransactionStrategy for DurableCommit {
    fn name(&self) -> &'static str {
        "durable"
    }

    fn begin(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch("BEGIN IMMEDIATE;")
    }

    fn commit(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch("COMMIT;")
    }

    fn rollback(&self, conn: &Connection) -> rusqlite::Result<()> {
        // SQLite may already have rolled back on its own (e.g. SQLITE_FULL).
        if conn.is_autocommit() {
            return Ok(());
        }
        conn.execute_batch("ROLLBACK;")
    }
}

/// Commits release a savepoint inside a session-wide transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlushOnly;

impl TransactionStrategy for FlushOnly {
    fn name(&self) -> &'static str {
        "flush_only"
    }

    fn on_open(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch("BEGIN;")
    }

    fn begin(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(&format!("SAVEPOINT {FLUSH_SAVEPOINT};"))
    }

    fn commit(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(&format!("RELEASE SAVEPOINT {FLUSH_SAVEPOINT};"))
    }

    fn rollback(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(&format!(
            "ROLLBACK TO SAVEPOINT {FLUSH_SAVEPOINT}; RELEASE SAVEPOINT {FLUSH_SAVEPOINT};"
        ))
    }

    fn on_close(&self, conn: &Connection) -> rusqlite::Result<()> {
        if conn.is_autocommit() {
            return Ok(());
        }
        conn.execute_batch("ROLLBACK;")
    }
}
