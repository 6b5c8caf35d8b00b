//! Validation error types
//!
//! A [`ValidationError`] lists every violation found in one record, never
//! just the first.

use std::fmt;

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Field path (e.g., "owner.address.city", "items[2]")
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: "field to be present".into(),
            actual: "missing".into(),
        }
    }

    pub fn extra_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: "no undeclared fields".into(),
            actual: "extra field present".into(),
        }
    }

    pub fn type_mismatch(field: impl Into<String>, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::new(field, expected, actual)
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: "non-null value".into(),
            actual: "null".into(),
        }
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': expected {}, got {}", self.field, self.expected, self.actual)
    }
}

/// Every violation found while validating one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    record: &'static str,
    details: Vec<ValidationDetails>,
}

impl ValidationError {
    pub fn new(record: &'static str, details: Vec<ValidationDetails>) -> Self {
        Self { record, details }
    }

    /// Record type that failed validation
    pub fn record(&self) -> &'static str {
        self.record
    }

    /// Violations in discovery order
    pub fn details(&self) -> &[ValidationDetails] {
        &self.details
    }

    /// Paths of all offending fields
    pub fn fields(&self) -> Vec<&str> {
        self.details.iter().map(|d| d.field.as_str()).collect()
    }

    /// The violation reported for `field`, if any
    pub fn detail_for(&self, field: &str) -> Option<&ValidationDetails> {
        self.details.iter().find(|d| d.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation of {} failed with {} violation(s)",
            self.record,
            self.details.len()
        )?;
        for detail in &self.details {
            write!(f, "; {}", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_details_display() {
        let details = ValidationDetails::type_mismatch("age", "integer", "string");
        let display = format!("{}", details);
        assert!(display.contains("age"));
        assert!(display.contains("integer"));
        assert!(display.contains("string"));
    }

    #[test]
    fn test_error_lists_every_violation() {
        let err = ValidationError::new(
            "User",
            vec![
                ValidationDetails::missing_field("email"),
                ValidationDetails::null_value("name"),
            ],
        );

        assert_eq!(err.fields(), vec!["email", "name"]);
        assert_eq!(err.detail_for("name").unwrap().actual, "null");
        let display = err.to_string();
        assert!(display.contains("2 violation(s)"));
        assert!(display.contains("email"));
        assert!(display.contains("name"));
    }
}
