//! Fast engine: dump without the validation pass
//!
//! Type checks happen inline while walking, so the first bad value aborts
//! with a `RecipeError::Type` naming its path. For valid records the output
//! is identical to the validated engine's.

use serde_json::Value;

use super::bytes::encode_batch;
use super::coerce::{dump_record, Path};
use crate::error::{RecipeError, RecipeResult};
use crate::record::Record;
use crate::schema::FieldSchemaTable;

/// Dumps one record without validating it first
pub fn fast_dump_one(table: &FieldSchemaTable, record: &dyn Record) -> RecipeResult<Value> {
    dump_record(table, record, table.record().name(), &Path::Root).map(Value::Object)
}

/// Dumps a batch in input order.
///
/// # Errors
///
/// `RecipeError::Element` wrapping the first failure; nothing is returned
/// for the elements that did succeed.
pub fn fast_dump<R: Record>(table: &FieldSchemaTable, records: &[R]) -> RecipeResult<Vec<Value>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| fast_dump_one(table, record).map_err(|err| RecipeError::element(index, err)))
        .collect()
}

/// Encodes a batch straight to JSON bytes.
///
/// The bytes are the JSON array encoding of what [`fast_dump`] returns.
pub fn fast_dump_bytes<R: Record>(table: &FieldSchemaTable, records: &[R]) -> RecipeResult<Vec<u8>> {
    encode_batch(table, records)
}
