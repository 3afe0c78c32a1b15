use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Validation errors for record and class names.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// When a value does not match the required pattern.
    #[error("{field} ('{value}') is not allowed")]
    PatternMismatch {
        /// Field name that failed validation.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// When a count or size is out of bounds.
    #[error("{field} ({value}) is out of bounds")]
    OutOfBounds {
        /// Field name that is out of bounds.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// When a name appears twice where names must be unique.
    #[error("duplicate {field} '{value}'")]
    Duplicate {
        /// What was duplicated.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}

fn type_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*((\.|::)[A-Za-z_][A-Za-z0-9_]*)*$").expect("invalid regex"))
}

fn field_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid regex"))
}

/// Checks a record type or extension class name (`name`, `pkg.name`, `pkg::name`).
pub fn validate_type_name(name: &str) -> Result<(), ValidationError> {
    if !type_name_pattern().is_match(name) {
        return Err(ValidationError::PatternMismatch {
            field: "type name",
            value: name.to_string(),
        });
    }
    Ok(())
}

/// Checks a record field name (identifier).
pub fn validate_field_name(name: &str) -> Result<(), ValidationError> {
    if !field_name_pattern().is_match(name) {
        return Err(ValidationError::PatternMismatch {
            field: "field name",
            value: name.to_string(),
        });
    }
    Ok(())
}
