//! Core persistence layer for the vaccine-alert store.
//! Generic CRUD over SQLite through an explicit unit of work.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod uow;

pub use config::{DbConfig, LoggingConfig};
pub use db::{open_db, open_db_in_memory, open_db_with, table_name, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::alert::{
    AlertConfig, AlertConfigInput, ConfiguredFilter, ConfiguredFilterInput, Evaluator, FilterKind,
};
pub use model::entity::{Entity, EntityDescriptor, EntityId, Record, Timestamp};
pub use model::input::{EntityInput, ExplicitFields, ProvidedFields};
pub use model::region::{District, DistrictInput, State, StateInput};
pub use model::validation::ValidationError;
pub use model::value::{field_map, DbEnum, FieldDef, FieldKind, FieldMap, FieldValue, FilterMap};
pub use repo::{CrudRepository, ListQuery, RepoError, RepoResult, DEFAULT_LIST_LIMIT};
pub use service::alert_service::AlertService;
pub use uow::{
    DurableCommit, FlushOnly, SessionFactory, SqliteUnitOfWork, TransactionStrategy, UnitOfWork,
};

/// Minimal health-check API for smoke probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
