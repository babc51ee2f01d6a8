//! Patient record model and record assembly.
//!
//! # Responsibility
//! - Define the canonical patient document shape.
//! - Build complete records from validated operator input.
//!
//! # Invariants
//! - Every field of a stored record satisfies its validator at write time.
//! - `patient_id` never changes after creation.
//! - `allergies` and `medical_history` are sequences; a single free-text
//!   entry is wrapped as a one-element list and never split.

use crate::model::validation::{
    check_age, check_date, check_email, check_phone, ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Store-assigned document id, rendered as `_id`.
pub type RecordId = Uuid;

/// Patient gender as accepted by the `gender` validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Parses the exact, case-sensitive spelling.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

/// Document keys of a patient record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatientField {
    PatientId,
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

impl PatientField {
    pub const ALL: [PatientField; 10] = [
        Self::PatientId,
        Self::Name,
        Self::Gender,
        Self::Age,
        Self::Phone,
        Self::Email,
        Self::Allergies,
        Self::MedicalHistory,
        Self::Condition,
        Self::VisitDate,
    ];

    /// Document key, also used as the storage column name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PatientId => "patient_id",
            Self::Name => "name",
            Self::Gender => "gender",
            Self::Age => "age",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Allergies => "allergies",
            Self::MedicalHistory => "medical_history",
            Self::Condition => "condition",
            Self::VisitDate => "visit_date",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == value)
    }

    /// Whether values of this field are stored as string sequences.
    pub fn is_list(self) -> bool {
        matches!(self, Self::Allergies | Self::MedicalHistory)
    }
}

/// Typed value written into one document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    List(Vec<String>),
}

impl FieldValue {
    /// Wraps one free-text entry as a single-element sequence.
    pub fn single_entry_list(entry: impl Into<String>) -> Self {
        Self::List(vec![entry.into()])
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Text(value) => JsonValue::from(value.as_str()),
            Self::Integer(value) => JsonValue::from(*value),
            Self::List(values) => JsonValue::from(values.clone()),
        }
    }
}

/// One patient's clinical profile as stored in the patients collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "_id")]
    pub record_id: RecordId,
    pub patient_id: String,
    pub name: String,
    pub gender: Gender,
    pub age: i64,
    pub phone: String,
    pub email: String,
    pub allergies: Vec<String>,
    pub medical_history: Vec<String>,
    pub condition: String,
    pub visit_date: String,
}

impl PatientRecord {
    /// Re-checks every validated field.
    ///
    /// Read paths call this to reject persisted state that bypassed the
    /// write-time checks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_phone(&self.phone)?;
        check_email(&self.email)?;
        check_date(&self.visit_date)?;
        check_age(self.age)?;
        Ok(())
    }
}

/// Raw operator input for a new patient. `age` is already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub patient_id: String,
    pub name: String,
    pub gender: String,
    pub age: i64,
    pub phone: String,
    pub email: String,
    pub allergy: String,
    pub medical_history: String,
    pub condition: String,
    pub visit_date: String,
}

/// Validates `input` and builds a complete record with a fresh `_id`.
///
/// Checks run in a fixed order (phone, email, visit date, gender, age) and
/// the first failure is returned.
pub fn assemble_record(input: NewPatient) -> Result<PatientRecord, ValidationError> {
    assemble_record_with_id(Uuid::new_v4(), input)
}

/// Same as [`assemble_record`] with a caller-provided document id.
pub fn assemble_record_with_id(
    record_id: RecordId,
    input: NewPatient,
) -> Result<PatientRecord, ValidationError> {
    check_phone(&input.phone)?;
    check_email(&input.email)?;
    check_date(&input.visit_date)?;
    let gender = Gender::parse(&input.gender).ok_or(ValidationError::InvalidGender)?;
    check_age(input.age)?;

    Ok(PatientRecord {
        record_id,
        patient_id: input.patient_id,
        name: input.name,
        gender,
        age: input.age,
        phone: input.phone,
        email: input.email,
        allergies: vec![input.allergy],
        medical_history: vec![input.medical_history],
        condition: input.condition,
        visit_date: input.visit_date,
    })
}
