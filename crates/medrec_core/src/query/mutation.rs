//! Single-field update construction.
//!
//! # Responsibility
//! - Map `(patient_id, field, value)` to a filter plus `$set` mutation.
//! - Re-run the field's validator before any mutation is built.
//!
//! # Invariants
//! - The filter always targets one document by `patient_id` equality.
//! - List fields are overwritten with a one-element sequence, never appended.
//! - `patient_id` itself is not writable.

use crate::model::patient::{FieldValue, PatientField};
use crate::model::validation::{
    check_age, check_date, check_email, check_phone, validate_gender, ValidationError,
};
use crate::query::filter::SearchFilter;
use crate::query::{QueryError, QueryResult};
use serde_json::{json, Value as JsonValue};

/// Fields an update may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateField {
    Name,
    Gender,
    Age,
    Phone,
    Email,
    Allergies,
    MedicalHistory,
    Condition,
    VisitDate,
}

impl UpdateField {
    /// Parses an update field name. `history` is accepted for
    /// `medical_history`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "gender" => Some(Self::Gender),
            "age" => Some(Self::Age),
            "phone" => Some(Self::Phone),
            "email" => Some(Self::Email),
            "allergies" => Some(Self::Allergies),
            "medical_history" | "history" => Some(Self::MedicalHistory),
            "condition" => Some(Self::Condition),
            "visit_date" => Some(Self::VisitDate),
            _ => None,
        }
    }

    pub fn document_field(self) -> PatientField {
        match self {
            Self::Name => PatientField::Name,
            Self::Gender => PatientField::Gender,
            Self::Age => PatientField::Age,
            Self::Phone => PatientField::Phone,
            Self::Email => PatientField::Email,
            Self::Allergies => PatientField::Allergies,
            Self::MedicalHistory => PatientField::MedicalHistory,
            Self::Condition => PatientField::Condition,
            Self::VisitDate => PatientField::VisitDate,
        }
    }
}

/// `$set` of one document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub field: PatientField,
    pub value: FieldValue,
}

impl Mutation {
    pub fn set(field: PatientField, value: FieldValue) -> Self {
        Self { field, value }
    }

    /// Renders the mutation in document-store update form.
    pub fn to_document(&self) -> JsonValue {
        json!({ "$set": { self.field.as_str(): self.value.to_json() } })
    }
}

/// Filter and mutation for one `update_one` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    pub filter: SearchFilter,
    pub mutation: Mutation,
}

/// Validates `value` for `field` and builds the update for `patient_id`.
///
/// # Errors
/// - [`QueryError::InvalidUpdateField`] for unknown or read-only fields.
/// - [`QueryError::MalformedNumber`] when `age` is not an integer.
/// - [`QueryError::Validation`] when the value fails its validator.
pub fn build_update(patient_id: &str, field: &str, value: &str) -> QueryResult<UpdatePlan> {
    let update_field =
        UpdateField::parse(field).ok_or_else(|| QueryError::InvalidUpdateField(field.to_string()))?;
    let value = field_value(update_field, value)?;

    Ok(UpdatePlan {
        filter: SearchFilter::by_patient_id(patient_id),
        mutation: Mutation::set(update_field.document_field(), value),
    })
}

fn field_value(field: UpdateField, raw: &str) -> QueryResult<FieldValue> {
    let value = match field {
        UpdateField::Phone => {
            check_phone(raw)?;
            FieldValue::Text(raw.to_string())
        }
        UpdateField::Email => {
            check_email(raw)?;
            FieldValue::Text(raw.to_string())
        }
        UpdateField::VisitDate => {
            check_date(raw)?;
            FieldValue::Text(raw.to_string())
        }
        UpdateField::Gender => {
            if !validate_gender(raw) {
                return Err(ValidationError::InvalidGender.into());
            }
            FieldValue::Text(raw.to_string())
        }
        UpdateField::Age => {
            let age = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| QueryError::MalformedNumber {
                    field: "age",
                    value: raw.to_string(),
                })?;
            check_age(age)?;
            FieldValue::Integer(age)
        }
        UpdateField::Allergies | UpdateField::MedicalHistory => {
            FieldValue::single_entry_list(raw)
        }
        UpdateField::Name | UpdateField::Condition => FieldValue::Text(raw.to_string()),
    };
    Ok(value)
}
