use serde::{Deserialize, Serialize};
use crate::error::AppError;

pub mod email;
pub mod schemas;

pub use email::EmailValidator;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    pub code: String,
    pub message: String,
    pub field: String,
}

impl ValidationError {
    pub fn new(code: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: field.to_string(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.message)
    }
}

/// Single-value validator.
pub trait Validator {
    fn validate(&self, input: &str) -> Result<(), ValidationError>;
}

/// Whole-request schema check. Reports the first failing field, in field order.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub fn min_chars(field: &str, value: &str, min: usize, message: &str) -> Result<(), ValidationError> {
    if value.trim().chars().count() < min {
        return Err(ValidationError::new("too_small", field, message));
    }
    Ok(())
}

pub fn max_chars(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::new(
            "too_big",
            field,
            format!("{} cannot exceed {} characters", field, max),
        ));
    }
    Ok(())
}

pub fn email(field: &str, value: &str, message: &str) -> Result<(), ValidationError> {
    EmailValidator::new()
        .validate(value)
        .map_err(|e| ValidationError::new(&e.code, field, message))
}

/// `Some("  ")` and `None` are the same thing for optional form fields.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_chars_counts_characters_not_bytes() {
        assert!(min_chars("name", "Zoë", 3, "too short").is_ok());
        assert!(min_chars("name", "  a ", 2, "too short").is_err());
    }

    #[test]
    fn test_max_chars_message() {
        let err = max_chars("title", &"x".repeat(201), 200).unwrap_err();
        assert_eq!(err.code, "too_big");
        assert_eq!(err.message, "title cannot exceed 200 characters");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" ACME ")), Some("ACME".to_string()));
    }

    #[test]
    fn test_validation_error_maps_to_bad_request() {
        let err: AppError = ValidationError::new("too_small", "title", "Job title must be at least 3 characters").into();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Job title must be at least 3 characters"));
    }
}
