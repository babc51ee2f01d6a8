//! Patient use-case service.
//!
//! # Responsibility
//! - Provide add/search/update/delete/stats entry points for command callers.
//! - Run validation and expression building before delegating to the store.
//!
//! # Invariants
//! - A validation or builder failure returns before any store call.
//! - The service never caches record state between calls.
//! - Store failures are surfaced unchanged and never retried.

use crate::model::patient::{assemble_record, NewPatient, PatientRecord};
use crate::model::validation::ValidationError;
use crate::query::aggregate::{condition_stats_pipeline, stat_rows, StatRow};
use crate::query::filter::{build_search_filter, SearchFilter};
use crate::query::mutation::build_update;
use crate::query::QueryError;
use crate::repo::patient_store::{DeleteOutcome, PatientStore, StoreError, UpdateOutcome};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error category reported back to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationError,
    InvalidSearchField,
    InvalidUpdateField,
    MalformedNumber,
    StoreError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::InvalidSearchField => "invalid_search_field",
            Self::InvalidUpdateField => "invalid_update_field",
            Self::MalformedNumber => "malformed_number",
            Self::StoreError => "store_error",
        }
    }
}

/// Service error for patient use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    InvalidSearchField(String),
    InvalidUpdateField(String),
    MalformedNumber { field: &'static str, value: String },
    Store(StoreError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::InvalidSearchField(_) => ErrorKind::InvalidSearchField,
            Self::InvalidUpdateField(_) => ErrorKind::InvalidUpdateField,
            Self::MalformedNumber { .. } => ErrorKind::MalformedNumber,
            Self::Store(_) => ErrorKind::StoreError,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidSearchField(field) => write!(f, "invalid search field `{field}`"),
            Self::InvalidUpdateField(field) => write!(f, "invalid update field `{field}`"),
            Self::MalformedNumber { field, value } => {
                write!(f, "invalid {field} format: `{value}` is not an integer")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<QueryError> for ServiceError {
    fn from(value: QueryError) -> Self {
        match value {
            QueryError::Validation(err) => Self::Validation(err),
            QueryError::InvalidSearchField(field) => Self::InvalidSearchField(field),
            QueryError::InvalidUpdateField(field) => Self::InvalidUpdateField(field),
            QueryError::MalformedNumber { field, value } => Self::MalformedNumber { field, value },
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

/// Patient service facade over an injected store handle.
pub struct PatientService<S: PatientStore> {
    store: S,
}

impl<S: PatientStore> PatientService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrows the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validates and inserts a new patient record.
    ///
    /// A duplicate `patient_id` surfaces as a store error.
    pub fn add(&self, input: NewPatient) -> ServiceResult<PatientRecord> {
        let record = assemble_record(input).map_err(|err| {
            warn!(
                "event=patient_add module=service status=rejected field={}",
                err.field()
            );
            err
        })?;

        self.store.insert_one(&record).map_err(|err| {
            let error_code = match &err {
                StoreError::DuplicatePatientId(_) => "duplicate_patient_id",
                _ => "store_insert_failed",
            };
            warn!("event=patient_add module=service status=error error_code={error_code}");
            err
        })?;
        info!("event=patient_add module=service status=ok");
        Ok(record)
    }

    /// Finds records by one search field.
    pub fn search(&self, field: &str, value: &str) -> ServiceResult<Vec<PatientRecord>> {
        let filter = build_search_filter(field, value)?;
        self.find(&filter)
    }

    /// Runs an already-built filter against the store.
    pub fn find(&self, filter: &SearchFilter) -> ServiceResult<Vec<PatientRecord>> {
        let records = self.store.find(filter)?;
        info!(
            "event=patient_search module=service status=ok filter={} hits={}",
            filter.kind(),
            records.len()
        );
        Ok(records)
    }

    /// Overwrites one field of the record keyed by `patient_id`.
    ///
    /// `matched_count == 0` means no such patient.
    pub fn update(&self, patient_id: &str, field: &str, value: &str) -> ServiceResult<UpdateOutcome> {
        let plan = build_update(patient_id, field, value)?;
        let outcome = self.store.update_one(&plan.filter, &plan.mutation)?;
        info!(
            "event=patient_update module=service status=ok field={} matched={} modified={}",
            plan.mutation.field.as_str(),
            outcome.matched_count,
            outcome.modified_count
        );
        Ok(outcome)
    }

    /// Deletes the record keyed by `patient_id`.
    ///
    /// `deleted_count == 0` means no such patient.
    pub fn delete(&self, patient_id: &str) -> ServiceResult<DeleteOutcome> {
        let outcome = self.store.delete_one(&SearchFilter::by_patient_id(patient_id))?;
        info!(
            "event=patient_delete module=service status=ok deleted={}",
            outcome.deleted_count
        );
        Ok(outcome)
    }

    /// Counts patients per condition, largest group first.
    pub fn stats(&self) -> ServiceResult<Vec<StatRow>> {
        let groups = self.store.aggregate(&condition_stats_pipeline())?;
        info!(
            "event=patient_stats module=service status=ok groups={}",
            groups.len()
        );
        Ok(stat_rows(groups))
    }
}
