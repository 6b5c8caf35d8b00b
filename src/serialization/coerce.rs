//! Dump-side coercion shared by every engine
//!
//! Each step here is the single definition of one dump rule: which host
//! value a kind accepts, how absent values are treated, and the text form
//! of every leaf. The tree walker below and the streaming encoder in
//! `bytes` are both built from these steps, so they cannot disagree.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Number, Value};

use super::text;
use crate::error::{RecipeError, RecipeResult, TypeMismatch, ValueError};
use crate::record::{Decimal, FieldRef, Record};
use crate::schema::{FieldSchema, FieldSchemaTable, TargetKind};
use crate::validate::{host_matches, ROOT_PATH};

/// Position of a value inside the record being dumped.
///
/// Rendered to a string only when an error is reported.
#[derive(Clone, Copy)]
pub(crate) enum Path<'p> {
    Root,
    Field(&'p Path<'p>, &'p str),
    Index(&'p Path<'p>, usize),
}

impl Path<'_> {
    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        if out.is_empty() {
            out.push_str(ROOT_PATH);
        }
        out
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Path::Root => {}
            Path::Field(parent, name) => {
                parent.render_into(out);
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Path::Index(parent, index) => {
                parent.render_into(out);
                out.push_str(&format!("[{}]", index));
            }
        }
    }
}

/// An accepted value: either a finished leaf or a container to descend into
pub(crate) enum Shape<'k, 'v, 'a> {
    Leaf(Value),
    Record(Arc<FieldSchemaTable>, &'a dyn Record),
    List(&'k TargetKind, &'v [FieldRef<'a>]),
    Map(&'k TargetKind, &'v [(&'a str, FieldRef<'a>)]),
}

pub(crate) fn mismatch(
    root: &'static str,
    path: &Path<'_>,
    expected: impl fmt::Display,
    actual: impl Into<String>,
) -> RecipeError {
    RecipeError::Type(TypeMismatch {
        record: root,
        field: path.render(),
        expected: expected.to_string(),
        actual: actual.into(),
    })
}

fn invalid_value(root: &'static str, path: &Path<'_>, reason: String) -> RecipeError {
    RecipeError::Value(ValueError {
        record: root,
        field: path.render(),
        reason,
    })
}

/// Fails unless `record` is an instance of the table's record type
pub(crate) fn check_instance(
    table: &FieldSchemaTable,
    record: &dyn Record,
    root: &'static str,
    path: &Path<'_>,
) -> RecipeResult<()> {
    if table.record().is_instance(record) {
        Ok(())
    } else {
        Err(mismatch(root, path, table.record().name(), record.record_name()))
    }
}

/// Reads a field's value; `None` means an absent optional value to omit
pub(crate) fn read_present<'a>(
    record: &'a dyn Record,
    field: &FieldSchema,
    root: &'static str,
    path: &Path<'_>,
) -> RecipeResult<Option<FieldRef<'a>>> {
    match record.read_field(field.declared_name) {
        None => Err(mismatch(root, path, &field.kind, "absent attribute")),
        Some(value) if value.is_absent() => {
            if field.optional {
                Ok(None)
            } else {
                Err(mismatch(root, path, &field.kind, value.type_name()))
            }
        }
        Some(value) => Ok(Some(value)),
    }
}

/// Container elements are never optional
pub(crate) fn require_element(
    kind: &TargetKind,
    item: &FieldRef<'_>,
    root: &'static str,
    path: &Path<'_>,
) -> RecipeResult<()> {
    if item.is_absent() {
        Err(mismatch(root, path, kind, item.type_name()))
    } else {
        Ok(())
    }
}

/// Type-checks one value and coerces it if it is a leaf
pub(crate) fn shape<'k, 'v, 'a>(
    kind: &'k TargetKind,
    value: &'v FieldRef<'a>,
    root: &'static str,
    path: &Path<'_>,
) -> RecipeResult<Shape<'k, 'v, 'a>> {
    if !host_matches(kind, value) {
        return Err(mismatch(root, path, kind, value.type_name()));
    }

    let leaf = match (kind, value) {
        (TargetKind::String, FieldRef::Str(s)) => Value::String((*s).to_string()),
        (TargetKind::Integer { .. }, FieldRef::Int(i)) => Value::from(*i),
        (TargetKind::Float, FieldRef::Float(f)) => match Number::from_f64(*f) {
            Some(n) => Value::Number(n),
            None => return Err(invalid_value(root, path, format!("non-finite float {} cannot be dumped", f))),
        },
        (TargetKind::Boolean, FieldRef::Bool(b)) => Value::Bool(*b),
        (TargetKind::Decimal { places }, FieldRef::Decimal(d)) => {
            Value::String(fixed_decimal(d, *places, root, path)?)
        }
        (TargetKind::DateTime, FieldRef::DateTime(dt)) => Value::String(text::format_datetime(dt)),
        (TargetKind::Date, FieldRef::Date(d)) => Value::String(text::format_date(d)),
        (TargetKind::Uuid, FieldRef::Uuid(u)) => Value::String(u.hyphenated().to_string()),
        (TargetKind::Record(schema), FieldRef::Record(nested)) => {
            let table = schema.resolve()?;
            check_instance(&table, *nested, root, path)?;
            return Ok(Shape::Record(table, *nested));
        }
        (TargetKind::List(inner), FieldRef::List(items)) => return Ok(Shape::List(inner.as_ref(), items)),
        (TargetKind::Map(inner), FieldRef::Map(entries)) => return Ok(Shape::Map(inner.as_ref(), entries)),
        _ => return Err(mismatch(root, path, kind, value.type_name())),
    };

    Ok(Shape::Leaf(leaf))
}

fn fixed_decimal(
    value: &Decimal,
    places: u32,
    root: &'static str,
    path: &Path<'_>,
) -> RecipeResult<String> {
    if !value.is_finite() {
        return Err(invalid_value(root, path, format!("{} decimal cannot be dumped", value)));
    }
    value.to_fixed_string(places).ok_or_else(|| {
        invalid_value(
            root,
            path,
            format!("{} does not fit {} decimal places", value, places),
        )
    })
}

/// Dumps a record into an ordered mapping
pub(crate) fn dump_record(
    table: &FieldSchemaTable,
    record: &dyn Record,
    root: &'static str,
    path: &Path<'_>,
) -> RecipeResult<Map<String, Value>> {
    check_instance(table, record, root, path)?;

    let mut out = Map::new();
    for field in table.fields() {
        let field_path = Path::Field(path, field.declared_name);
        if let Some(value) = read_present(record, field, root, &field_path)? {
            let dumped = dump_value(&field.kind, &value, root, &field_path)?;
            out.insert(field.serialized_name.clone(), dumped);
        }
    }
    Ok(out)
}

fn dump_value(
    kind: &TargetKind,
    value: &FieldRef<'_>,
    root: &'static str,
    path: &Path<'_>,
) -> RecipeResult<Value> {
    match shape(kind, value, root, path)? {
        Shape::Leaf(leaf) => Ok(leaf),
        Shape::Record(table, nested) => dump_record(&table, nested, root, path).map(Value::Object),
        Shape::List(inner, items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = Path::Index(path, i);
                require_element(inner, item, root, &item_path)?;
                out.push(dump_value(inner, item, root, &item_path)?);
            }
            Ok(Value::Array(out))
        }
        Shape::Map(inner, entries) => {
            let mut out = Map::new();
            for (key, entry) in entries {
                let entry_path = Path::Field(path, key);
                require_element(inner, entry, root, &entry_path)?;
                out.insert((*key).to_string(), dump_value(inner, entry, root, &entry_path)?);
            }
            Ok(Value::Object(out))
        }
    }
}
