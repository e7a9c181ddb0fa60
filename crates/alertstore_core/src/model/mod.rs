//! Entity contracts, field values and the alert-store domain types.
//!
//! # Responsibility
//! - Define the descriptor, record and input contracts the generic
//!   repository is parameterized over.
//! - Define the region and alert entities persisted by this crate.
//!
//! # Invariants
//! - Field mapping is explicit per type; no reflection.
//! - This module never touches SQLite directly.

pub mod alert;
pub mod entity;
pub mod input;
pub mod region;
pub mod validation;
pub mod value;
