//! Store expression builders.
//!
//! # Responsibility
//! - Turn operator-supplied field/value pairs into typed filter, mutation
//!   and aggregation expressions for the document store.
//! - Reject unsupported fields and malformed values before any store call.
//!
//! # Invariants
//! - Builders are pure; they never hold or call a store handle.
//! - A rejected input never yields a partial expression.

use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod aggregate;
pub mod filter;
pub mod mutation;

pub type QueryResult<T> = Result<T, QueryError>;

/// Builder rejection for search and update input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Field value failed its validator.
    Validation(ValidationError),
    /// Search requested on a field that has no search rule.
    InvalidSearchField(String),
    /// Update requested on a field that cannot be written.
    InvalidUpdateField(String),
    /// Numeric field value could not be parsed as an integer.
    MalformedNumber { field: &'static str, value: String },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidSearchField(field) => write!(f, "invalid search field `{field}`"),
            Self::InvalidUpdateField(field) => write!(f, "invalid update field `{field}`"),
            Self::MalformedNumber { field, value } => {
                write!(f, "invalid {field} format: `{value}` is not an integer")
            }
        }
    }
}

impl Error for QueryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for QueryError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
