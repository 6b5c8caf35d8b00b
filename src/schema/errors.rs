//! Schema compilation errors
//!
//! Error codes:
//! - SCHEMA_UNSUPPORTED_TYPE
//! - SCHEMA_MISSING_METADATA
//! - SCHEMA_INVALID_METADATA
//! - SCHEMA_DUPLICATE_NAME
//! - SCHEMA_CYCLE_DROPPED

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Declared type has no target kind
    UnsupportedType,
    /// Required coercion metadata (decimal places) is absent
    MissingMetadata,
    /// Metadata present but unusable
    InvalidMetadata,
    /// Two fields share a serialized name
    DuplicateName,
    /// A back-edge of a cyclic schema outlived its target table
    CycleDropped,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::UnsupportedType => "SCHEMA_UNSUPPORTED_TYPE",
            SchemaErrorCode::MissingMetadata => "SCHEMA_MISSING_METADATA",
            SchemaErrorCode::InvalidMetadata => "SCHEMA_INVALID_METADATA",
            SchemaErrorCode::DuplicateName => "SCHEMA_DUPLICATE_NAME",
            SchemaErrorCode::CycleDropped => "SCHEMA_CYCLE_DROPPED",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    code: SchemaErrorCode,
    /// Record type being compiled
    record: &'static str,
    /// Offending field, if the error is field-level
    field: Option<String>,
    message: String,
}

impl SchemaError {
    /// Declared type cannot be mapped to a target kind
    pub fn unsupported_type(record: &'static str, field: &str, declared: impl fmt::Display) -> Self {
        Self {
            code: SchemaErrorCode::UnsupportedType,
            record,
            field: Some(field.to_string()),
            message: format!("unsupported declared type '{}'", declared),
        }
    }

    /// A fixed-decimal field without `places`
    pub fn missing_places(record: &'static str, field: &str) -> Self {
        Self {
            code: SchemaErrorCode::MissingMetadata,
            record,
            field: Some(field.to_string()),
            message: "decimal field requires places metadata".into(),
        }
    }

    pub fn invalid_metadata(record: &'static str, field: &str, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::InvalidMetadata,
            record,
            field: Some(field.to_string()),
            message: reason.into(),
        }
    }

    /// `second` maps onto a serialized name already taken by `first`
    pub fn duplicate_name(record: &'static str, serialized: &str, first: &str, second: &str) -> Self {
        Self {
            code: SchemaErrorCode::DuplicateName,
            record,
            field: Some(second.to_string()),
            message: format!(
                "serialized name '{}' is produced by both '{}' and '{}'",
                serialized, first, second
            ),
        }
    }

    pub fn cycle_dropped(record: &'static str) -> Self {
        Self {
            code: SchemaErrorCode::CycleDropped,
            record,
            field: None,
            message: "cyclic schema reference no longer alive".into(),
        }
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.record)?;
        if let Some(field) = &self.field {
            write!(f, ".{}", field)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
