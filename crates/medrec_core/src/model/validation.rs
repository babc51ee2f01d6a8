//! Field-level validators for patient record input.
//!
//! # Responsibility
//! - Decide whether a single raw field value is syntactically well-formed.
//! - Provide typed validation errors for write paths.
//!
//! # Invariants
//! - Predicates are pure: no I/O, no store access, no logging.
//! - `validate_date` is syntactic only; `2024-13-99` is accepted.
//! - `validate_email` accepts multi-dot or dash-ended domains (loose form).

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MIN_AGE: i64 = 0;
pub const MAX_AGE: i64 = 150;

// ASCII-only classes; `\d` in `regex` also matches non-ASCII digits.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("valid phone regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+\-]+@[a-zA-Z0-9\-]+\.[a-zA-Z0-9\-.]+$").expect("valid email regex")
});
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));

/// Accepted spellings for `gender`, case-sensitive.
pub const GENDER_VALUES: [&str; 3] = ["Male", "Female", "Other"];

/// Returns `true` iff `value` is exactly 10 ASCII decimal digits.
pub fn validate_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

/// Returns `true` iff `value` looks like `local@domain.tld`.
pub fn validate_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Returns `true` iff `value` has the `YYYY-MM-DD` shape.
///
/// Calendar validity is not checked.
pub fn validate_date(value: &str) -> bool {
    DATE_RE.is_match(value)
}

/// Returns `true` iff `value` is one of `Male`, `Female`, `Other`.
pub fn validate_gender(value: &str) -> bool {
    GENDER_VALUES.contains(&value)
}

/// Returns `true` iff `0 <= age <= 150`.
pub fn validate_age(age: i64) -> bool {
    (MIN_AGE..=MAX_AGE).contains(&age)
}

/// Rejection reason for a malformed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidPhone,
    InvalidEmail,
    InvalidDate,
    InvalidGender,
    InvalidAge(i64),
}

impl ValidationError {
    /// Field name the rejected value belonged to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidPhone => "phone",
            Self::InvalidEmail => "email",
            Self::InvalidDate => "visit_date",
            Self::InvalidGender => "gender",
            Self::InvalidAge(_) => "age",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPhone => write!(f, "invalid phone number (must be 10 digits)"),
            Self::InvalidEmail => write!(f, "invalid email format"),
            Self::InvalidDate => write!(f, "invalid date format (use YYYY-MM-DD)"),
            Self::InvalidGender => write!(f, "invalid gender (use Male/Female/Other)"),
            Self::InvalidAge(age) => write!(f, "invalid age {age} (0-150)"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn check_phone(value: &str) -> Result<(), ValidationError> {
    if validate_phone(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

pub(crate) fn check_email(value: &str) -> Result<(), ValidationError> {
    if validate_email(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

pub(crate) fn check_date(value: &str) -> Result<(), ValidationError> {
    if validate_date(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidDate)
    }
}

pub(crate) fn check_age(age: i64) -> Result<(), ValidationError> {
    if validate_age(age) {
        Ok(())
    } else {
        Err(ValidationError::InvalidAge(age))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        validate_age, validate_date, validate_email, validate_gender, validate_phone,
        ValidationError,
    };

    #[test]
    fn phone_requires_exactly_ten_ascii_digits() {
        assert!(validate_phone("0123456789"));
        assert!(!validate_phone("555"));
        assert!(!validate_phone("012-345-6789"));
        assert!(!validate_phone("+123456789"));
        assert!(!validate_phone("01234567890"));
        assert!(!validate_phone("٠١٢٣٤٥٦٧٨٩"));
    }

    #[test]
    fn email_uses_loose_domain_rules() {
        assert!(validate_email("jane.doe+clinic@example.com"));
        assert!(validate_email("a@b.c"));
        assert!(validate_email("a@b..c"));
        assert!(!validate_email("no-at-sign.example.com"));
        assert!(!validate_email("a@nodot"));
        assert!(!validate_email("a b@example.com"));
    }

    #[test]
    fn date_is_shape_only() {
        assert!(validate_date("2025-06-01"));
        assert!(validate_date("2024-13-99"));
        assert!(!validate_date("2025-6-1"));
        assert!(!validate_date("2025/06/01"));
        assert!(!validate_date(" 2025-06-01"));
    }

    #[test]
    fn gender_is_case_sensitive() {
        assert!(validate_gender("Male"));
        assert!(validate_gender("Female"));
        assert!(validate_gender("Other"));
        assert!(!validate_gender("male"));
        assert!(!validate_gender(""));
    }

    #[test]
    fn age_bounds_are_inclusive() {
        assert!(validate_age(0));
        assert!(validate_age(150));
        assert!(!validate_age(-1));
        assert!(!validate_age(151));
    }

    #[test]
    fn error_reports_field_name() {
        assert_eq!(ValidationError::InvalidDate.field(), "visit_date");
        assert_eq!(ValidationError::InvalidAge(200).field(), "age");
    }
}
