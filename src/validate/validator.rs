//! Field-level validation against a baked schema
//!
//! Validation semantics:
//! - Every declared field is readable on the record
//! - Required fields are present and non-null
//! - Host values match the field's target kind exactly (no coercion)
//! - Raw values parse into the field's target kind
//!
//! Violations are collected, not returned on the first failure. The
//! validator never mutates its input.

use serde_json::Value;
use uuid::Uuid;

use super::errors::{ValidationDetails, ValidationError};
use crate::error::{RecipeError, RecipeResult};
use crate::record::{join_path, Decimal, FieldRef, FieldValue, Record};
use crate::schema::{FieldSchemaTable, TargetKind};
use crate::serialization::text;

/// Path reported for the record itself
pub(crate) const ROOT_PATH: &str = "$root";

/// Accumulates violations across a whole record graph
#[derive(Debug, Default)]
pub struct Violations {
    details: Vec<ValidationDetails>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, detail: ValidationDetails) {
        self.details.push(detail);
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// `Ok` if nothing was collected, else one error listing everything
    pub fn finish(self, record: &'static str) -> Result<(), ValidationError> {
        if self.details.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(record, self.details))
        }
    }
}

/// Validates a record instance before dump.
///
/// # Errors
///
/// - `RecipeError::Validation` listing every field whose host value is
///   absent, null or of the wrong type
/// - `RecipeError::Schema` if a cyclic schema reference is no longer alive
pub fn validate_record(table: &FieldSchemaTable, record: &dyn Record) -> RecipeResult<()> {
    let mut violations = Violations::new();
    check_record(table, record, "", &mut violations)?;
    violations
        .finish(table.record().name())
        .map_err(RecipeError::Validation)
}

/// True if the host value has the variant the kind expects.
///
/// Shallow: containers and nested records are not descended into. Both
/// dump engines decide acceptance with this check.
pub(crate) fn host_matches(kind: &TargetKind, value: &FieldRef<'_>) -> bool {
    matches!(
        (kind, value),
        (TargetKind::String, FieldRef::Str(_))
            | (TargetKind::Integer { .. }, FieldRef::Int(_))
            | (TargetKind::Float, FieldRef::Float(_))
            | (TargetKind::Boolean, FieldRef::Bool(_))
            | (TargetKind::Decimal { .. }, FieldRef::Decimal(_))
            | (TargetKind::DateTime, FieldRef::DateTime(_))
            | (TargetKind::Date, FieldRef::Date(_))
            | (TargetKind::Uuid, FieldRef::Uuid(_))
            | (TargetKind::Record(_), FieldRef::Record(_))
            | (TargetKind::List(_), FieldRef::List(_))
            | (TargetKind::Map(_), FieldRef::Map(_))
    )
}

/// Reports an absent value in a field that requires one
fn absent_detail(path: &str, value: &FieldRef<'_>) -> ValidationDetails {
    match value {
        FieldRef::Missing => ValidationDetails::missing_field(path),
        _ => ValidationDetails::null_value(path),
    }
}

fn check_record(
    table: &FieldSchemaTable,
    record: &dyn Record,
    path: &str,
    out: &mut Violations,
) -> RecipeResult<()> {
    if !table.record().is_instance(record) {
        let at = if path.is_empty() { ROOT_PATH } else { path };
        out.push(ValidationDetails::type_mismatch(
            at,
            table.record().name(),
            record.record_name(),
        ));
        return Ok(());
    }

    for field in table.fields() {
        let field_path = join_path(path, field.declared_name);
        match record.read_field(field.declared_name) {
            None => out.push(ValidationDetails::new(
                field_path,
                "readable attribute",
                "absent attribute",
            )),
            Some(value) if value.is_absent() => {
                if !field.optional {
                    out.push(absent_detail(&field_path, &value));
                }
            }
            Some(value) => check_value(&field.kind, &value, &field_path, out)?,
        }
    }

    Ok(())
}

fn check_value(
    kind: &TargetKind,
    value: &FieldRef<'_>,
    path: &str,
    out: &mut Violations,
) -> RecipeResult<()> {
    if !host_matches(kind, value) {
        out.push(ValidationDetails::type_mismatch(path, kind.name(), value.type_name()));
        return Ok(());
    }

    match (kind, value) {
        (TargetKind::Record(schema), FieldRef::Record(nested)) => {
            let nested_table = schema.resolve()?;
            check_record(&nested_table, *nested, path, out)?;
        }
        (TargetKind::List(inner), FieldRef::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                let item_path = join_path(path, &format!("[{}]", i));
                if item.is_absent() {
                    out.push(absent_detail(&item_path, item));
                } else {
                    check_value(inner, item, &item_path, out)?;
                }
            }
        }
        (TargetKind::Map(inner), FieldRef::Map(entries)) => {
            for (key, entry) in entries {
                let entry_path = join_path(path, key);
                if entry.is_absent() {
                    out.push(absent_detail(&entry_path, entry));
                } else {
                    check_value(inner, entry, &entry_path, out)?;
                }
            }
        }
        _ => {}
    }

    Ok(())
}

/// Parses a raw scalar into the host value for `kind`.
///
/// Containers and records are handled by the loader, which calls this for
/// leaves only.
pub(crate) fn parse_scalar(kind: &TargetKind, value: &Value, path: &str) -> Result<FieldValue, ValidationDetails> {
    let mismatch = || ValidationDetails::type_mismatch(path, kind.name(), json_type_name(value));

    match kind {
        TargetKind::String => value
            .as_str()
            .map(|s| FieldValue::Str(s.to_string()))
            .ok_or_else(mismatch),
        TargetKind::Integer { min, max } => {
            let n = match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => n,
                _ => return Err(mismatch()),
            };
            let out_of_range = || {
                let expected = match kind.integer_bounds() {
                    Some((min, max)) => format!("integer in [{}, {}]", min, max),
                    None => "integer in 64-bit signed range".to_string(),
                };
                ValidationDetails::new(path, expected, n.to_string())
            };
            match n.as_i64() {
                Some(i) if (*min..=*max).contains(&i) => Ok(FieldValue::Int(i)),
                _ => Err(out_of_range()),
            }
        }
        TargetKind::Float => value.as_f64().map(FieldValue::Float).ok_or_else(mismatch),
        TargetKind::Boolean => value.as_bool().map(FieldValue::Bool).ok_or_else(mismatch),
        TargetKind::Decimal { places } => {
            let raw = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return Err(mismatch()),
            };
            let parsed: Decimal = raw
                .parse()
                .map_err(|_| ValidationDetails::new(path, "decimal string", raw.as_str()))?;
            if !parsed.is_finite() {
                return Err(ValidationDetails::new(path, "finite decimal", raw));
            }
            parsed
                .quantize(*places)
                .map(|d| FieldValue::Decimal(Decimal::Finite(d)))
                .ok_or_else(|| {
                    ValidationDetails::new(path, format!("decimal with {} places", places), raw)
                })
        }
        TargetKind::DateTime => {
            let s = value.as_str().ok_or_else(mismatch)?;
            text::parse_datetime(s)
                .map(FieldValue::DateTime)
                .ok_or_else(|| ValidationDetails::new(path, "ISO 8601 datetime", s))
        }
        TargetKind::Date => {
            let s = value.as_str().ok_or_else(mismatch)?;
            text::parse_date(s)
                .map(FieldValue::Date)
                .ok_or_else(|| ValidationDetails::new(path, "ISO 8601 date", s))
        }
        TargetKind::Uuid => {
            let s = value.as_str().ok_or_else(mismatch)?;
            Uuid::parse_str(s)
                .map(FieldValue::Uuid)
                .map_err(|_| ValidationDetails::new(path, "uuid", s))
        }
        TargetKind::Record(_) | TargetKind::List(_) | TargetKind::Map(_) => Err(mismatch()),
    }
}

/// Returns the JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_integer_is_strict() {
        assert!(matches!(
            parse_scalar(&TargetKind::INTEGER, &json!(3), "n"),
            Ok(FieldValue::Int(3))
        ));

        let err = parse_scalar(&TargetKind::INTEGER, &json!(3.5), "n").unwrap_err();
        assert_eq!(err.expected, "integer");
        assert_eq!(err.actual, "float");

        let err = parse_scalar(&TargetKind::INTEGER, &json!(u64::MAX), "n").unwrap_err();
        assert_eq!(err.expected, "integer in 64-bit signed range");
    }

    #[test]
    fn test_parse_integer_checks_bounds() {
        let kind = TargetKind::Integer { min: 0, max: 255 };
        assert!(matches!(
            parse_scalar(&kind, &json!(255), "b"),
            Ok(FieldValue::Int(255))
        ));

        let err = parse_scalar(&kind, &json!(-1), "b").unwrap_err();
        assert_eq!(err.field, "b");
        assert_eq!(err.expected, "integer in [0, 255]");
        assert_eq!(err.actual, "-1");

        let err = parse_scalar(&kind, &json!(u64::MAX), "b").unwrap_err();
        assert_eq!(err.expected, "integer in [0, 255]");

        // Type mismatch wins over range
        let err = parse_scalar(&kind, &json!("7"), "b").unwrap_err();
        assert_eq!(err.expected, "integer");
    }

    #[test]
    fn test_parse_float_accepts_integers() {
        assert!(matches!(
            parse_scalar(&TargetKind::Float, &json!(2), "x"),
            Ok(FieldValue::Float(f)) if f == 2.0
        ));
    }

    #[test]
    fn test_parse_decimal_quantizes() {
        let kind = TargetKind::Decimal { places: 2 };
        match parse_scalar(&kind, &json!("1.005"), "amount") {
            Ok(FieldValue::Decimal(d)) => assert_eq!(d.to_string(), "1.00"),
            other => panic!("unexpected {:?}", other),
        }
        match parse_scalar(&kind, &json!(7), "amount") {
            Ok(FieldValue::Decimal(d)) => assert_eq!(d.to_string(), "7.00"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_decimal_rejects_nan_and_garbage() {
        let kind = TargetKind::Decimal { places: 2 };
        let err = parse_scalar(&kind, &json!("NaN"), "amount").unwrap_err();
        assert_eq!(err.expected, "finite decimal");

        let err = parse_scalar(&kind, &json!("abc"), "amount").unwrap_err();
        assert_eq!(err.expected, "decimal string");

        let err = parse_scalar(&kind, &json!(true), "amount").unwrap_err();
        assert_eq!(err.actual, "boolean");
    }

    #[test]
    fn test_parse_temporal_and_uuid() {
        assert!(matches!(
            parse_scalar(&TargetKind::DateTime, &json!("2024-01-02T03:04:05+00:00"), "t"),
            Ok(FieldValue::DateTime(_))
        ));
        assert!(parse_scalar(&TargetKind::DateTime, &json!("yesterday"), "t").is_err());
        assert!(matches!(
            parse_scalar(&TargetKind::Date, &json!("2024-02-29"), "d"),
            Ok(FieldValue::Date(_))
        ));
        assert!(parse_scalar(&TargetKind::Date, &json!("2023-02-29"), "d").is_err());

        let err = parse_scalar(&TargetKind::Uuid, &json!("not-a-uuid"), "id").unwrap_err();
        assert_eq!(err.field, "id");
        assert_eq!(err.expected, "uuid");
    }

    #[test]
    fn test_host_matches_is_strict() {
        assert!(host_matches(&TargetKind::Float, &FieldRef::Float(1.0)));
        assert!(!host_matches(&TargetKind::Float, &FieldRef::Int(1)));
        assert!(!host_matches(&TargetKind::String, &FieldRef::Int(1)));
    }

    #[test]
    fn test_violations_finish() {
        assert!(Violations::new().finish("X").is_ok());

        let mut violations = Violations::new();
        violations.push(ValidationDetails::missing_field("a"));
        violations.push(ValidationDetails::null_value("b"));
        let err = violations.finish("X").unwrap_err();
        assert_eq!(err.fields(), vec!["a", "b"]);
    }

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!(1)), "integer");
        assert_eq!(json_type_name(&json!(1.5)), "float");
        assert_eq!(json_type_name(&json!([])), "list");
        assert_eq!(json_type_name(&json!({})), "map");
    }
}
