//! Core use-case services.
//!
//! # Responsibility
//! - Compose generic repository calls into alert-subscription use cases.
//! - Keep callers decoupled from descriptor and filter-map details.

pub mod alert_service;
