//! Core domain logic for the patient records manager.
//! This crate owns validation, store expression building and the patient
//! store contract; callers only collect input and print results.

pub mod command;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use command::{
    dispatch, Command, CommandError, CommandName, CommandOutput, CommandResult,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::patient::{
    assemble_record, FieldValue, Gender, NewPatient, PatientField, PatientRecord, RecordId,
};
pub use model::validation::{
    validate_age, validate_date, validate_email, validate_gender, validate_phone,
    ValidationError,
};
pub use query::aggregate::{condition_stats_pipeline, GroupCount, Pipeline, Stage, StatRow};
pub use query::filter::{build_search_filter, SearchField, SearchFilter};
pub use query::mutation::{build_update, Mutation, UpdateField, UpdatePlan};
pub use query::QueryError;
pub use repo::patient_store::{
    DeleteOutcome, PatientStore, SqlitePatientStore, StoreError, StoreResult, UpdateOutcome,
};
pub use service::patient_service::{ErrorKind, PatientService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
