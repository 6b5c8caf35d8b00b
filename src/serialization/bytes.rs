//! Streaming JSON encoder for the fast path
//!
//! Writes a batch straight to bytes through serde without building the
//! intermediate tree. Leaves come from the same `shape` step the tree
//! walker uses, so the bytes equal the encoding of `fast_dump`'s output.
//!
//! serde errors are strings; the structured error is kept in a [`Stash`]
//! and recovered once the encoder returns.

use std::cell::RefCell;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use super::coerce::{check_instance, read_present, require_element, shape, Path, Shape};
use crate::error::{RecipeError, RecipeResult};
use crate::record::{FieldRef, Record};
use crate::schema::{FieldSchemaTable, TargetKind};

#[derive(Default)]
struct Stash(RefCell<Option<RecipeError>>);

impl Stash {
    fn fail<E: serde::ser::Error>(&self, err: RecipeError) -> E {
        let message = err.to_string();
        *self.0.borrow_mut() = Some(err);
        E::custom(message)
    }

    fn annotate(&self, index: usize) {
        let mut slot = self.0.borrow_mut();
        if let Some(err) = slot.take() {
            *slot = Some(RecipeError::element(index, err));
        }
    }

    fn take(&self) -> Option<RecipeError> {
        self.0.borrow_mut().take()
    }
}

struct Batch<'s, R> {
    table: &'s FieldSchemaTable,
    records: &'s [R],
    stash: &'s Stash,
}

impl<R: Record> Serialize for Batch<'_, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let root = self.table.record().name();
        let mut seq = serializer.serialize_seq(Some(self.records.len()))?;
        for (index, record) in self.records.iter().enumerate() {
            let body = RecordBody {
                table: self.table,
                record,
                root,
                path: &Path::Root,
                stash: self.stash,
            };
            if let Err(err) = seq.serialize_element(&body) {
                self.stash.annotate(index);
                return Err(err);
            }
        }
        seq.end()
    }
}

struct RecordBody<'s> {
    table: &'s FieldSchemaTable,
    record: &'s dyn Record,
    root: &'static str,
    path: &'s Path<'s>,
    stash: &'s Stash,
}

impl Serialize for RecordBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Err(err) = check_instance(self.table, self.record, self.root, self.path) {
            return Err(self.stash.fail(err));
        }

        let mut map = serializer.serialize_map(None)?;
        for field in self.table.fields() {
            let field_path = Path::Field(self.path, field.declared_name);
            let value = match read_present(self.record, field, self.root, &field_path) {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(err) => return Err(self.stash.fail(err)),
            };
            map.serialize_entry(
                &field.serialized_name,
                &ValueBody {
                    kind: &field.kind,
                    value: &value,
                    root: self.root,
                    path: &field_path,
                    stash: self.stash,
                },
            )?;
        }
        map.end()
    }
}

struct ValueBody<'s, 'a> {
    kind: &'s TargetKind,
    value: &'s FieldRef<'a>,
    root: &'static str,
    path: &'s Path<'s>,
    stash: &'s Stash,
}

impl ValueBody<'_, '_> {
    fn element<'e, 'b>(&'e self, kind: &'e TargetKind, value: &'e FieldRef<'b>, path: &'e Path<'e>) -> ValueBody<'e, 'b> {
        ValueBody {
            kind,
            value,
            root: self.root,
            path,
            stash: self.stash,
        }
    }
}

impl Serialize for ValueBody<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let shaped = match shape(self.kind, self.value, self.root, self.path) {
            Ok(shaped) => shaped,
            Err(err) => return Err(self.stash.fail(err)),
        };

        match shaped {
            Shape::Leaf(leaf) => leaf.serialize(serializer),
            Shape::Record(table, nested) => RecordBody {
                table: &table,
                record: nested,
                root: self.root,
                path: self.path,
                stash: self.stash,
            }
            .serialize(serializer),
            Shape::List(inner, items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for (i, item) in items.iter().enumerate() {
                    let item_path = Path::Index(self.path, i);
                    if let Err(err) = require_element(inner, item, self.root, &item_path) {
                        return Err(self.stash.fail(err));
                    }
                    seq.serialize_element(&self.element(inner, item, &item_path))?;
                }
                seq.end()
            }
            Shape::Map(inner, entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, entry) in entries {
                    let entry_path = Path::Field(self.path, key);
                    if let Err(err) = require_element(inner, entry, self.root, &entry_path) {
                        return Err(self.stash.fail(err));
                    }
                    map.serialize_entry(key, &self.element(inner, entry, &entry_path))?;
                }
                map.end()
            }
        }
    }
}

/// Encodes a batch as a JSON array, equal to encoding the tree `fast_dump` builds
pub(crate) fn encode_batch<R: Record>(
    table: &FieldSchemaTable,
    records: &[R],
) -> RecipeResult<Vec<u8>> {
    let stash = Stash::default();
    let batch = Batch {
        table,
        records,
        stash: &stash,
    };

    let mut out = Vec::with_capacity(records.len() * 64);
    match serde_json::to_writer(&mut out, &batch) {
        Ok(()) => Ok(out),
        Err(err) => Err(stash.take().unwrap_or(RecipeError::Encode(err))),
    }
}
