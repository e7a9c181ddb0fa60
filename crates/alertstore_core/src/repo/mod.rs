//! Repository layer over the unit-of-work contract.
//!
//! # Responsibility
//! - Provide one generic CRUD repository usable with any `Entity`.
//! - Classify failures into validation, integrity, missing-target and
//!   storage errors.
//!
//! # Invariants
//! - Repository writes run `Entity::validate()` before persistence.
//! - Repositories hold no connection; callers pass the unit of work.

mod crud;
mod error;

pub use crud::{CrudRepository, ListQuery, DEFAULT_LIST_LIMIT};
pub use error::{RepoError, RepoResult};
