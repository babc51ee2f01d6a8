//! Patient domain model.
//!
//! # Responsibility
//! - Define the canonical patient document and its typed field values.
//! - Own field-level validation rules shared by add and update paths.
//!
//! # Invariants
//! - Every patient document is keyed by a unique, immutable `patient_id`.
//! - Validators are pure predicates; they never touch the store.

pub mod patient;
pub mod validation;
