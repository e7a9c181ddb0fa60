//! Generic CRUD repository bound to one entity type.
//!
//! # Responsibility
//! - Provide create/read/update/delete for any `Entity` through a
//!   caller-owned unit of work.
//! - Apply partial-update merge semantics for explicit input fields.
//!
//! # Invariants
//! - Every write call ends in exactly one commit; on any failure before or
//!   during that commit the unit of work is rolled back, so a batch is
//!   all-or-nothing.
//! - Filters and update inputs naming undeclared fields are rejected.
//! - Identity and timestamps are never written from caller input.
//! - Lookups report "not found" as `Ok(None)`; removals report it as
//!   `RepoError::MissingTarget`.

use super::error::{RepoError, RepoResult};
use crate::model::entity::{Entity, EntityDescriptor, EntityId, Record};
use crate::model::input::{EntityInput, ExplicitFields};
use crate::model::validation::ValidationError;
use crate::model::value::FilterMap;
use crate::uow::UnitOfWork;
use log::{debug, error, info, warn};
use std::marker::PhantomData;
use std::time::Instant;

/// Page size used when a list query does not set one.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Filter and pagination options for `get_multi`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// Equality filters; `None` lists every row.
    pub filters: Option<FilterMap>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filters: None,
            skip: 0,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ListQuery {
    pub fn filtered(filters: FilterMap) -> Self {
        Self {
            filters: Some(filters),
            ..Self::default()
        }
    }
}

/// Stateless repository for entities of type `E`.
///
/// Holds only the entity descriptor, so one instance can serve any number
/// of independently owned units of work.
#[derive(Debug, Clone)]
pub struct CrudRepository<E: Entity> {
    descriptor: EntityDescriptor,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Default for CrudRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> CrudRepository<E> {
    pub fn new() -> Self {
        Self::with_descriptor(EntityDescriptor::of::<E>())
    }

    /// Binds the repository to an explicit descriptor, e.g. a renamed table.
    pub fn with_descriptor(descriptor: EntityDescriptor) -> Self {
        Self {
            descriptor,
            _entity: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// Loads one row by identity.
    pub fn get_by_id<U: UnitOfWork>(&self, uow: &U, id: EntityId) -> RepoResult<Option<Record<E>>> {
        uow.fetch_by_id(&self.descriptor, id)
    }

    /// Loads the first row matching every filter entry.
    ///
    /// Which row is "first" among several matches is storage-defined; pass
    /// a uniquely identifying filter when that matters.
    pub fn get<U: UnitOfWork>(&self, uow: &U, filters: &FilterMap) -> RepoResult<Option<Record<E>>> {
        self.check_filters(filters)?;
        uow.fetch_one(&self.descriptor, filters)
    }

    /// Lists rows matching optional filters, ordered by identity.
    pub fn get_multi<U: UnitOfWork>(&self, uow: &U, query: &ListQuery) -> RepoResult<Vec<Record<E>>> {
        if let Some(filters) = &query.filters {
            self.check_filters(filters)?;
        }
        uow.fetch_many(
            &self.descriptor,
            query.filters.as_ref(),
            query.skip,
            query.limit,
        )
    }

    /// Inserts one entity built from `input`, commits, and reloads it.
    ///
    /// # Errors
    /// - `Validation`/`Integrity` when nothing was written.
    /// - `Refresh` when the row committed but could not be reloaded.
    pub fn create<U, I>(&self, uow: &mut U, input: &I) -> RepoResult<Record<E>>
    where
        U: UnitOfWork,
        I: EntityInput<E> + ?Sized,
    {
        let id = self.write("create", uow, |uow| Ok((self.insert(uow, input)?, 1)))?;
        self.reload(uow, id)
    }

    /// Inserts every input under one shared commit.
    ///
    /// Assigned identities are not returned; re-fetch when they are needed.
    pub fn create_multi<'a, U, I, P>(&self, uow: &mut U, inputs: P) -> RepoResult<()>
    where
        U: UnitOfWork,
        I: EntityInput<E> + ?Sized + 'a,
        P: IntoIterator<Item = &'a I>,
    {
        self.write("create_multi", uow, |uow| {
            let mut count = 0usize;
            for input in inputs {
                self.insert(uow, input)?;
                count += 1;
            }
            Ok(((), count))
        })
    }

    /// Overwrites the explicitly supplied fields of `record`, commits, and
    /// reloads it.
    pub fn update<U, I>(&self, uow: &mut U, record: Record<E>, input: &I) -> RepoResult<Record<E>>
    where
        U: UnitOfWork,
        I: ExplicitFields + ?Sized,
    {
        let id = record.id;
        self.write("update", uow, |uow| {
            let (merged, fields) = self.merge(record, input)?;
            uow.save(&self.descriptor, &merged, &fields)?;
            Ok(((), 1))
        })?;
        self.reload(uow, id)
    }

    /// Applies the partial merge to every pair under one shared commit.
    pub fn update_multi<'a, U, I, P>(&self, uow: &mut U, pairs: P) -> RepoResult<()>
    where
        E: 'a,
        U: UnitOfWork,
        I: ExplicitFields + ?Sized + 'a,
        P: IntoIterator<Item = (&'a Record<E>, &'a I)>,
    {
        self.write("update_multi", uow, |uow| {
            let mut count = 0usize;
            for (record, input) in pairs {
                let (merged, fields) = self.merge(record.clone(), input)?;
                uow.save(&self.descriptor, &merged, &fields)?;
                count += 1;
            }
            Ok(((), count))
        })
    }

    /// Deletes the row with identity `id` and returns it as it was.
    pub fn remove_with_id<U: UnitOfWork>(&self, uow: &mut U, id: EntityId) -> RepoResult<Record<E>> {
        self.write("remove_with_id", uow, |uow| Ok((self.delete_by_id(uow, id)?, 1)))
    }

    /// Deletes the row behind `record` and returns it as it was stored,
    /// which may differ from a stale `record`.
    pub fn remove<U: UnitOfWork>(&self, uow: &mut U, record: &Record<E>) -> RepoResult<Record<E>> {
        self.write("remove", uow, |uow| Ok((self.delete_by_id(uow, record.id)?, 1)))
    }

    /// Deletes every identity under one shared commit.
    pub fn remove_multi_with_id<U, P>(&self, uow: &mut U, ids: P) -> RepoResult<()>
    where
        U: UnitOfWork,
        P: IntoIterator<Item = EntityId>,
    {
        self.write("remove_multi_with_id", uow, |uow| {
            let mut count = 0usize;
            for id in ids {
                self.delete_by_id(uow, id)?;
                count += 1;
            }
            Ok(((), count))
        })
    }

    /// Deletes every record under one shared commit.
    pub fn remove_multi<'a, U, P>(&self, uow: &mut U, records: P) -> RepoResult<()>
    where
        E: 'a,
        U: UnitOfWork,
        P: IntoIterator<Item = &'a Record<E>>,
    {
        self.write("remove_multi", uow, |uow| {
            let mut count = 0usize;
            for record in records {
                uow.delete(&self.descriptor, record.id)?;
                count += 1;
            }
            Ok(((), count))
        })
    }

    /// Runs `work` as one pending scope and commits it, rolling back on failure.
    ///
    /// `work` returns its value plus the number of rows it touched.
    fn write<U, T, F>(&self, operation: &'static str, uow: &mut U, work: F) -> RepoResult<T>
    where
        U: UnitOfWork,
        F: FnOnce(&mut U) -> RepoResult<(T, usize)>,
    {
        let started_at = Instant::now();
        let outcome = match work(uow) {
            Ok(written) => uow.commit().map(|()| written),
            Err(err) => Err(err),
        };

        match outcome {
            Ok((value, count)) => {
                info!(
                    "event=crud_{operation} module=repo status=ok entity={} count={count} duration_ms={}",
                    self.descriptor.type_name,
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = uow.rollback() {
                    warn!(
                        "event=crud_{operation} module=repo status=rollback_failed entity={} error={rollback_err}",
                        self.descriptor.type_name
                    );
                }
                error!(
                    "event=crud_{operation} module=repo status=error entity={} duration_ms={} error={err}",
                    self.descriptor.type_name,
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    fn insert<U, I>(&self, uow: &mut U, input: &I) -> RepoResult<EntityId>
    where
        U: UnitOfWork,
        I: EntityInput<E> + ?Sized,
    {
        let entity = input.to_entity();
        entity.validate()?;
        uow.add(&self.descriptor, &entity)
    }

    fn delete_by_id<U: UnitOfWork>(&self, uow: &mut U, id: EntityId) -> RepoResult<Record<E>> {
        let record = uow
            .fetch_by_id(&self.descriptor, id)?
            .ok_or(RepoError::MissingTarget {
                entity: self.descriptor.type_name,
                id,
            })?;
        uow.delete(&self.descriptor, id)?;
        Ok(record)
    }

    fn reload<U: UnitOfWork>(&self, uow: &U, id: EntityId) -> RepoResult<Record<E>> {
        uow.refresh(&self.descriptor, id)
            .map_err(|source| RepoError::Refresh {
                entity: self.descriptor.type_name,
                id,
                source: Box::new(source),
            })
    }

    /// Overwrites only the fields `input` reports as explicitly supplied and
    /// returns them alongside the merged record, so the save touches nothing
    /// else.
    fn merge<I>(
        &self,
        mut record: Record<E>,
        input: &I,
    ) -> RepoResult<(Record<E>, Vec<&'static str>)>
    where
        I: ExplicitFields + ?Sized,
    {
        let entity_name = self.descriptor.type_name;
        let mut supplied = Vec::new();
        for (field, value) in input.explicit_fields() {
            if self.descriptor.is_managed(&field) {
                return Err(ValidationError::ImmutableField {
                    entity: entity_name,
                    field,
                }
                .into());
            }
            let def = self
                .descriptor
                .fields
                .iter()
                .find(|def| def.name == field)
                .ok_or_else(|| ValidationError::unknown_field(entity_name, field.as_str()))?;
            record.entity.set_field(def.name, value)?;
            supplied.push(def.name);
        }
        record.entity.validate()?;
        debug!(
            "event=crud_merge module=repo status=ok entity={entity_name} id={} fields={}",
            record.id,
            supplied.len()
        );
        Ok((record, supplied))
    }

    fn check_filters(&self, filters: &FilterMap) -> Result<(), ValidationError> {
        for (name, value) in filters {
            let def = self
                .descriptor
                .column(name)
                .ok_or_else(|| ValidationError::unknown_field(self.descriptor.type_name, name.as_str()))?;
            if !def.accepts(value) {
                return Err(ValidationError::TypeMismatch {
                    field: name.clone(),
                    expected: def.kind.label(),
                    found: value.kind_label(),
                });
            }
        }
        Ok(())
    }
}
