//! The missing sentinel
//!
//! `MISSING` means "the caller did not supply this field". It is distinct
//! from an explicit null (`None`) and from a key being absent from a raw
//! mapping: an absent optional key is *loaded as* `MISSING`, and an
//! optional field holding `MISSING` is omitted on dump.

use std::fmt;

use crate::record::{FieldRef, FieldValue};

/// Type of the [`MISSING`] sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MissingType;

/// The missing sentinel
pub const MISSING: MissingType = MissingType;

impl fmt::Display for MissingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MISSING>")
    }
}

impl From<MissingType> for FieldValue {
    fn from(_: MissingType) -> Self {
        FieldValue::Missing
    }
}

impl From<MissingType> for FieldRef<'_> {
    fn from(_: MissingType) -> Self {
        FieldRef::Missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_is_not_null() {
        let missing: FieldValue = MISSING.into();
        assert!(missing.is_missing());
        assert!(!missing.is_none());
        assert!(FieldValue::None.is_none());
        assert!(!FieldValue::None.is_missing());
    }

    #[test]
    fn test_missing_singleton() {
        assert_eq!(MISSING, MissingType);
        assert_eq!(MISSING.to_string(), "<MISSING>");
    }

    #[test]
    fn test_missing_field_ref() {
        let r: FieldRef<'_> = MISSING.into();
        assert!(matches!(r, FieldRef::Missing));
    }
}
