//! Crate-level error type
//!
//! Each subsystem keeps its own error ([`SchemaError`], [`ValidationError`]);
//! `RecipeError` is what the public operations return.

use thiserror::Error;

use crate::hooks::HookError;
use crate::schema::SchemaError;
use crate::validate::ValidationError;

/// Fast-path rejection: a field's host value has the wrong type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{record}.{field}: expected {expected}, got {actual}")]
pub struct TypeMismatch {
    pub record: &'static str,
    /// Field path, `a.b` / `items[2]` for nested values
    pub field: String,
    pub expected: String,
    pub actual: String,
}

/// A value of the right type that cannot be dumped (NaN, infinity)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{record}.{field}: {reason}")]
pub struct ValueError {
    pub record: &'static str,
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("type error: {0}")]
    Type(#[from] TypeMismatch),

    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Raised by a pre-load hook; the hook's own error is the source
    #[error("pre-load hook failed: {0}")]
    Hook(#[source] HookError),

    /// A batch element failed; the batch produced no output
    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<RecipeError>,
    },

    #[error("encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RecipeError {
    pub(crate) fn element(index: usize, source: RecipeError) -> Self {
        RecipeError::Element {
            index,
            source: Box::new(source),
        }
    }

    /// The error with batch wrapping removed
    pub fn root(&self) -> &RecipeError {
        match self {
            RecipeError::Element { source, .. } => source.root(),
            other => other,
        }
    }

    /// Index of the failing batch element, if any
    pub fn element_index(&self) -> Option<usize> {
        match self {
            RecipeError::Element { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Aggregated violations, if this is a validation failure
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self.root() {
            RecipeError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for recipe operations
pub type RecipeResult<T> = Result<T, RecipeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ValidationDetails;

    #[test]
    fn test_element_unwraps_to_root() {
        let inner = RecipeError::Type(TypeMismatch {
            record: "Point",
            field: "x".into(),
            expected: "integer".into(),
            actual: "string".into(),
        });
        let err = RecipeError::element(3, inner);

        assert_eq!(err.element_index(), Some(3));
        assert!(matches!(err.root(), RecipeError::Type(_)));
        assert!(err.to_string().starts_with("element 3: type error: Point.x"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_as_validation() {
        let err = RecipeError::from(ValidationError::new(
            "Point",
            vec![ValidationDetails::missing_field("x")],
        ));
        let wrapped = RecipeError::element(0, err);
        assert_eq!(wrapped.as_validation().unwrap().details().len(), 1);
    }

    #[test]
    fn test_hook_error_keeps_source() {
        let err = RecipeError::Hook("bad input".into());
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "bad input");
    }
}
