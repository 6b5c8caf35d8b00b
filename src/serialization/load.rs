//! Load: raw mapping -> record
//!
//! Per record (top-level or nested) the order is fixed:
//! 1. run the type's pre-load hooks on its raw mapping
//! 2. validate and parse every declared field, collecting violations
//! 3. construct the record if nothing was violated
//!
//! A hook error aborts the load at once and is returned as is.

use serde_json::Value;

use crate::config::UnknownFields;
use crate::error::{RecipeError, RecipeResult};
use crate::hooks::{run_hooks, HookRegistry, RawMapping};
use crate::record::{join_path, FieldError, FieldValue, LoadedFields, RecordType};
use crate::schema::{FieldSchemaTable, TargetKind};
use crate::validate::{json_type_name, parse_scalar, ValidationDetails, ValidationError, Violations, ROOT_PATH};

/// Loads raw values against baked tables
pub struct Loader<'a> {
    hooks: &'a HookRegistry,
    unknown_fields: UnknownFields,
}

impl<'a> Loader<'a> {
    pub fn new(hooks: &'a HookRegistry, unknown_fields: UnknownFields) -> Self {
        Self { hooks, unknown_fields }
    }

    /// Loads one record of type `T` from `table`.
    ///
    /// # Errors
    ///
    /// - `RecipeError::Hook` if a pre-load hook fails
    /// - `RecipeError::Validation` listing every violation, including a
    ///   constructor rejection
    pub fn load<T: RecordType>(&self, table: &FieldSchemaTable, data: Value) -> RecipeResult<T> {
        let fields = self.load_fields(table, data)?;
        T::construct(fields).map_err(|err| {
            RecipeError::Validation(ValidationError::new(
                T::NAME,
                vec![constructor_detail(err, "")],
            ))
        })
    }

    /// Runs hooks, validates and parses, stopping short of construction
    pub fn load_fields(&self, table: &FieldSchemaTable, data: Value) -> RecipeResult<LoadedFields> {
        let mut violations = Violations::new();

        let fields = match data {
            Value::Object(raw) => self.load_mapping(table, raw, "", &mut violations)?,
            other => {
                violations.push(ValidationDetails::type_mismatch(
                    ROOT_PATH,
                    "map",
                    json_type_name(&other),
                ));
                None
            }
        };

        violations.finish(table.record().name())?;
        fields.ok_or_else(|| RecipeError::Internal("load produced no fields without violations".into()))
    }

    /// `None` if this mapping produced violations
    fn load_mapping(
        &self,
        table: &FieldSchemaTable,
        raw: RawMapping,
        path: &str,
        out: &mut Violations,
    ) -> RecipeResult<Option<LoadedFields>> {
        let hooks = self.hooks.hooks_for(&table.record())?;
        let mut raw = run_hooks(&hooks, raw)?;
        let before = out.len();

        if self.unknown_fields == UnknownFields::Raise {
            for key in raw.keys() {
                if table.field_by_serialized(key).is_none() {
                    out.push(ValidationDetails::extra_field(join_path(path, key)));
                }
            }
        }

        let mut fields = LoadedFields::new();
        for field in table.fields() {
            let field_path = join_path(path, &field.serialized_name);
            match raw.remove(&field.serialized_name) {
                None if field.optional => fields.insert(field.declared_name, FieldValue::Missing),
                None => out.push(ValidationDetails::missing_field(field_path)),
                Some(Value::Null) if field.optional => fields.insert(field.declared_name, FieldValue::None),
                Some(Value::Null) => out.push(ValidationDetails::null_value(field_path)),
                Some(value) => {
                    if let Some(loaded) = self.load_value(&field.kind, value, &field_path, out)? {
                        fields.insert(field.declared_name, loaded);
                    }
                }
            }
        }

        Ok((out.len() == before).then_some(fields))
    }

    fn load_value(
        &self,
        kind: &TargetKind,
        value: Value,
        path: &str,
        out: &mut Violations,
    ) -> RecipeResult<Option<FieldValue>> {
        match (kind, value) {
            (TargetKind::Record(schema), Value::Object(raw)) => {
                let table = schema.resolve()?;
                let fields = match self.load_mapping(&table, raw, path, out)? {
                    Some(fields) => fields,
                    None => return Ok(None),
                };
                match table.record().construct(fields) {
                    Ok(record) => Ok(Some(FieldValue::Record(record))),
                    Err(err) => {
                        out.push(constructor_detail(err, path));
                        Ok(None)
                    }
                }
            }
            (TargetKind::List(inner), Value::Array(items)) => {
                let before = out.len();
                let mut loaded = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    let item_path = join_path(path, &format!("[{}]", i));
                    if item.is_null() {
                        out.push(ValidationDetails::null_value(item_path));
                    } else if let Some(value) = self.load_value(inner, item, &item_path, out)? {
                        loaded.push(value);
                    }
                }
                Ok((out.len() == before).then_some(FieldValue::List(loaded)))
            }
            (TargetKind::Map(inner), Value::Object(entries)) => {
                let before = out.len();
                let mut loaded = Vec::with_capacity(entries.len());
                for (key, entry) in entries {
                    let entry_path = join_path(path, &key);
                    if entry.is_null() {
                        out.push(ValidationDetails::null_value(entry_path));
                    } else if let Some(value) = self.load_value(inner, entry, &entry_path, out)? {
                        loaded.push((key, value));
                    }
                }
                Ok((out.len() == before).then_some(FieldValue::Map(loaded)))
            }
            (TargetKind::Record(_) | TargetKind::List(_) | TargetKind::Map(_), other) => {
                out.push(ValidationDetails::type_mismatch(path, kind.name(), json_type_name(&other)));
                Ok(None)
            }
            (scalar, value) => match parse_scalar(scalar, &value, path) {
                Ok(parsed) => Ok(Some(parsed)),
                Err(detail) => {
                    out.push(detail);
                    Ok(None)
                }
            },
        }
    }
}

/// A constructor rejection reported at the record's path
fn constructor_detail(err: FieldError, prefix: &str) -> ValidationDetails {
    let field = join_path(prefix, err.field());
    match err {
        FieldError::Missing { .. } => ValidationDetails::missing_field(field),
        FieldError::Type { expected, actual, .. } => ValidationDetails::type_mismatch(field, expected, actual),
        FieldError::Invalid { reason, .. } => ValidationDetails::new(field, reason, "rejected value"),
    }
}
