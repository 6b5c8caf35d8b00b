//! Validated engine: full validation before every dump
//!
//! Dump never emits a partial tree. Validation runs over the whole record
//! graph first and every violation is reported together; only a record that
//! validates is walked.

use serde_json::Value;

use super::coerce::{dump_record, Path};
use super::load::Loader;
use crate::error::{RecipeError, RecipeResult};
use crate::record::{Record, RecordType};
use crate::schema::FieldSchemaTable;
use crate::validate::validate_record;

/// Validates and dumps one record.
///
/// # Errors
///
/// - `RecipeError::Validation` with every violation in the record graph
/// - `RecipeError::Value` for a NaN or infinite decimal or float
pub fn dump(table: &FieldSchemaTable, record: &dyn Record) -> RecipeResult<Value> {
    validate_record(table, record)?;
    dump_record(table, record, table.record().name(), &Path::Root).map(Value::Object)
}

/// Dumps a batch; the first failing element aborts it with its index
pub fn dump_many<R: Record>(table: &FieldSchemaTable, records: &[R]) -> RecipeResult<Vec<Value>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| dump(table, record).map_err(|err| RecipeError::element(index, err)))
        .collect()
}

/// Loads a batch; the first failing element aborts it with its index
pub fn load_many<T: RecordType>(
    loader: &Loader<'_>,
    table: &FieldSchemaTable,
    data: Vec<Value>,
) -> RecipeResult<Vec<T>> {
    data.into_iter()
        .enumerate()
        .map(|(index, item)| loader.load(table, item).map_err(|err| RecipeError::element(index, err)))
        .collect()
}
