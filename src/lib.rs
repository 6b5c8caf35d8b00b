//! record_recipe - Schema-baked dump/load of typed records
//!
//! A record type is compiled once into a field schema table (`bake`).
//! Tables drive three engines over the same coercion rules:
//! - `dump` / `load`: validated, with every violation reported together
//! - `fast_dump`: inline type checks only, same output for valid input
//! - `fast_dump_bytes`: `fast_dump` encoded straight to JSON bytes

pub mod config;
pub mod error;
pub mod hooks;
pub mod missing;
pub mod naming;
pub mod observability;
pub mod recipe;
pub mod record;
pub mod schema;
pub mod serialization;
pub mod validate;

pub use config::{RecipeConfig, UnknownFields};
pub use error::{RecipeError, RecipeResult, TypeMismatch, ValueError};
pub use hooks::{HookError, HookRegistry, HookResult, PreLoadHook, RawMapping};
pub use missing::{MissingType, MISSING};
pub use naming::{
    camel_case, camel_case_factory, capital_camel_case, capital_camel_case_factory, NamingCase,
    NamingStrategy,
};
pub use recipe::{
    bake, dump, dump_many, fast_dump, fast_dump_bytes, get_field_for, get_hooks, load, load_many,
    register_hook, Recipe,
};
pub use record::{
    AsField, Declared, DeclaredType, Decimal, FieldError, FieldMeta, FieldRef, FieldValue,
    FromField, LoadedFields, Record, RecordDecl, RecordType, RecordTypeInfo,
};
pub use schema::{FieldSchema, FieldSchemaTable, SchemaError, SchemaErrorCode, TargetKind};
pub use validate::{ValidationDetails, ValidationError};
