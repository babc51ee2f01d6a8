//! Search filter construction.
//!
//! # Responsibility
//! - Map a `(search field, value)` pair to a store filter.
//!
//! # Invariants
//! - `patient_id` searches are exact equality.
//! - `name` and `condition` searches go through the store text index.
//! - `visit_date` searches are `>=` range filters, never equality.

use crate::model::patient::PatientField;
use crate::model::validation::check_date;
use crate::query::{QueryError, QueryResult};
use serde_json::{json, Value as JsonValue};

/// Fields the operator may search by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    PatientId,
    Name,
    Condition,
    VisitDate,
}

impl SearchField {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "patient_id" => Some(Self::PatientId),
            "name" => Some(Self::Name),
            "condition" => Some(Self::Condition),
            "visit_date" => Some(Self::VisitDate),
            _ => None,
        }
    }
}

/// Transient store filter over patient documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// `{field: value}`
    Equals { field: PatientField, value: String },
    /// `{"$text": {"$search": search}}` over the `name`+`condition` index.
    Text { search: String },
    /// `{field: {"$gte": value}}`
    AtLeast { field: PatientField, value: String },
}

impl SearchFilter {
    /// Exact-match filter on the patient key.
    pub fn by_patient_id(patient_id: impl Into<String>) -> Self {
        Self::Equals {
            field: PatientField::PatientId,
            value: patient_id.into(),
        }
    }

    /// Renders the filter in document-store query form.
    pub fn to_document(&self) -> JsonValue {
        match self {
            Self::Equals { field, value } => json!({ field.as_str(): value }),
            Self::Text { search } => json!({ "$text": { "$search": search } }),
            Self::AtLeast { field, value } => json!({ field.as_str(): { "$gte": value } }),
        }
    }

    /// Short label for metadata-only logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Equals { .. } => "equals",
            Self::Text { .. } => "text",
            Self::AtLeast { .. } => "at_least",
        }
    }
}

/// Builds a filter from a raw field name and value.
///
/// Unknown field names return [`QueryError::InvalidSearchField`].
pub fn build_search_filter(field: &str, value: &str) -> QueryResult<SearchFilter> {
    let field = SearchField::parse(field)
        .ok_or_else(|| QueryError::InvalidSearchField(field.to_string()))?;
    build_filter(field, value)
}

/// Builds a filter for an already-resolved search field.
pub fn build_filter(field: SearchField, value: &str) -> QueryResult<SearchFilter> {
    match field {
        SearchField::PatientId => Ok(SearchFilter::by_patient_id(value)),
        SearchField::Name | SearchField::Condition => Ok(SearchFilter::Text {
            search: value.to_string(),
        }),
        SearchField::VisitDate => {
            check_date(value)?;
            Ok(SearchFilter::AtLeast {
                field: PatientField::VisitDate,
                value: value.to_string(),
            })
        }
    }
}
