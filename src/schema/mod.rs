//! Schema compiler subsystem
//!
//! Compiles a record type's declaration into an immutable
//! [`FieldSchemaTable`] once per naming strategy and caches it.
//!
//! # Design Principles
//!
//! - Field order is declaration order, end to end
//! - Serialized names are unique within a table
//! - Decimal fields carry their places from compile time on
//! - A failed bake caches nothing
//! - Cyclic record graphs compile to back-edges, never to infinite recursion

mod bake;
mod cache;
mod errors;
mod types;

pub use cache::SchemaCache;
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use types::{FieldSchema, FieldSchemaTable, SchemaRef, TargetKind};
