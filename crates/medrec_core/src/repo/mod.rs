//! Persistence layer for patient documents.
//!
//! # Responsibility
//! - Define the document-store contract consumed by the service layer.
//! - Isolate SQLite query details from validation and command handling.
//!
//! # Invariants
//! - Store APIs report semantic failures (`DuplicatePatientId`,
//!   `TextIndexMissing`) separately from transport errors.
//! - Zero-match updates and deletes are outcomes, not errors.

pub mod patient_store;
