//! Unit-of-work contract and its SQLite implementation.
//!
//! # Responsibility
//! - Define the transactional handle the generic repository writes through.
//! - Keep transaction boundaries explicit: writes stay pending until
//!   `commit`, and `rollback` discards every pending write.
//!
//! # Invariants
//! - A unit of work is single-owner; writes take `&mut self`.
//! - `refresh` fails when the row is gone instead of returning `None`.

mod factory;
mod sqlite;
mod strategy;

pub use factory::SessionFactory;
pub use sqlite::SqliteUnitOfWork;
pub use strategy::{DurableCommit, FlushOnly, TransactionStrategy};

use crate::model::entity::{Entity, EntityDescriptor, EntityId, Record};
use crate::model::value::FilterMap;
use crate::repo::RepoResult;

/// Transactional handle bound to one storage connection.
///
/// Filter maps reaching this trait are already validated against the
/// descriptor; implementations only translate them.
pub trait UnitOfWork {
    fn fetch_by_id<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        id: EntityId,
    ) -> RepoResult<Option<Record<E>>>;

    fn fetch_one<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        filters: &FilterMap,
    ) -> RepoResult<Option<Record<E>>>;

    fn fetch_many<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        filters: Option<&FilterMap>,
        skip: u32,
        limit: u32,
    ) -> RepoResult<Vec<Record<E>>>;

    /// Registers a new row and returns its storage-assigned identity.
    fn add<E: Entity>(&mut self, descriptor: &EntityDescriptor, entity: &E) -> RepoResult<EntityId>;

    /// Writes the named `fields` of an existing row from `record` and
    /// advances `updated_at`. Columns not named keep their stored values.
    fn save<E: Entity>(
        &mut self,
        descriptor: &EntityDescriptor,
        record: &Record<E>,
        fields: &[&'static str],
    ) -> RepoResult<()>;

    /// Registers a row for deletion; a missing row is `MissingTarget`.
    fn delete(&mut self, descriptor: &EntityDescriptor, id: EntityId) -> RepoResult<()>;

    /// Makes every pending write durable. A no-op when nothing is pending.
    fn commit(&mut self) -> RepoResult<()>;

    /// Discards every pending write. A no-op when nothing is pending.
    fn rollback(&mut self) -> RepoResult<()>;

    /// Reloads a row, including storage-assigned identity and timestamps.
    fn refresh<E: Entity>(
        &self,
        descriptor: &EntityDescriptor,
        id: EntityId,
    ) -> RepoResult<Record<E>>;
}
