//! Explicit session factory replacing a process-wide engine.
//!
//! # Responsibility
//! - Validate config and migrate the store once, at construction.
//! - Hand out units of work that each own a fresh connection.
//!
//! # Invariants
//! - Every session is migrated and uses the factory's pragmas.
//! - With `path = None` every session is an independent in-memory database.

use super::sqlite::SqliteUnitOfWork;
use super::strategy::{FlushOnly, TransactionStrategy};
use crate::config::DbConfig;
use crate::db::open_db_with;
use crate::repo::RepoResult;
use log::info;

/// Opens units of work against one configured store.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    config: DbConfig,
}

impl SessionFactory {
    /// Initializes the store: opens it once, applies migrations, closes it.
    pub fn new(config: DbConfig) -> RepoResult<Self> {
        if config.path.is_some() {
            drop(open_db_with(&config)?);
        }
        info!(
            "event=session_factory_init module=uow status=ok mode={}",
            config.mode()
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Opens a unit of work with durable commits.
    pub fn session(&self) -> RepoResult<SqliteUnitOfWork> {
        SqliteUnitOfWork::new(open_db_with(&self.config)?)
    }

    /// Opens a unit of work whose commits are discarded when it closes.
    pub fn scratch_session(&self) -> RepoResult<SqliteUnitOfWork<FlushOnly>> {
        self.session_with(FlushOnly)
    }

    /// Opens a unit of work with a caller-chosen transaction strategy.
    pub fn session_with<S: TransactionStrategy>(
        &self,
        strategy: S,
    ) -> RepoResult<SqliteUnitOfWork<S>> {
        SqliteUnitOfWork::with_strategy(open_db_with(&self.config)?, strategy)
    }
}
