//! Host field values and the traits that move them in and out of records
//!
//! - [`FieldRef`]: borrowed view of an attribute, read during dump
//! - [`FieldValue`]: owned value handed to a record constructor on load
//! - [`Declared`]: static type description consumed by the schema compiler

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::decimal::Decimal;
use super::{Record, RecordTypeInfo};
use crate::missing::MissingType;

/// Borrowed view of one record attribute
#[derive(Clone)]
pub enum FieldRef<'a> {
    /// The missing sentinel
    Missing,
    /// Explicit no-value
    None,
    Str(&'a str),
    Int(i64),
    Float(f64),
    Bool(bool),
    Decimal(Decimal),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Uuid(Uuid),
    /// A nested record instance
    Record(&'a dyn Record),
    List(Vec<FieldRef<'a>>),
    /// String-keyed entries in iteration order
    Map(Vec<(&'a str, FieldRef<'a>)>),
}

impl FieldRef<'_> {
    /// Host type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldRef::Missing => "missing",
            FieldRef::None => "none",
            FieldRef::Str(_) => "string",
            FieldRef::Int(_) => "integer",
            FieldRef::Float(_) => "float",
            FieldRef::Bool(_) => "boolean",
            FieldRef::Decimal(_) => "decimal",
            FieldRef::DateTime(_) => "datetime",
            FieldRef::Date(_) => "date",
            FieldRef::Uuid(_) => "uuid",
            FieldRef::Record(_) => "record",
            FieldRef::List(_) => "list",
            FieldRef::Map(_) => "map",
        }
    }

    /// True for `None` and `MISSING`, the states an optional field omits
    pub fn is_absent(&self) -> bool {
        matches!(self, FieldRef::Missing | FieldRef::None)
    }
}

impl fmt::Debug for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Missing => write!(f, "Missing"),
            FieldRef::None => write!(f, "None"),
            FieldRef::Str(s) => f.debug_tuple("Str").field(s).finish(),
            FieldRef::Int(i) => f.debug_tuple("Int").field(i).finish(),
            FieldRef::Float(x) => f.debug_tuple("Float").field(x).finish(),
            FieldRef::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            FieldRef::Decimal(d) => f.debug_tuple("Decimal").field(d).finish(),
            FieldRef::DateTime(dt) => f.debug_tuple("DateTime").field(dt).finish(),
            FieldRef::Date(d) => f.debug_tuple("Date").field(d).finish(),
            FieldRef::Uuid(u) => f.debug_tuple("Uuid").field(u).finish(),
            FieldRef::Record(r) => f.debug_tuple("Record").field(&r.record_name()).finish(),
            FieldRef::List(items) => f.debug_tuple("List").field(items).finish(),
            FieldRef::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
        }
    }
}

/// Owned field value produced by load
pub enum FieldValue {
    /// Key was not supplied
    Missing,
    /// Explicit null
    None,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Decimal(Decimal),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Uuid(Uuid),
    Record(Box<dyn Record>),
    List(Vec<FieldValue>),
    Map(Vec<(String, FieldValue)>),
}

impl FieldValue {
    /// Host type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Missing => "missing",
            FieldValue::None => "none",
            FieldValue::Str(_) => "string",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::Date(_) => "date",
            FieldValue::Uuid(_) => "uuid",
            FieldValue::Record(_) => "record",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) => "map",
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, FieldValue::None)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Missing => write!(f, "Missing"),
            FieldValue::None => write!(f, "None"),
            FieldValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            FieldValue::Int(i) => f.debug_tuple("Int").field(i).finish(),
            FieldValue::Float(x) => f.debug_tuple("Float").field(x).finish(),
            FieldValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            FieldValue::Decimal(d) => f.debug_tuple("Decimal").field(d).finish(),
            FieldValue::DateTime(dt) => f.debug_tuple("DateTime").field(dt).finish(),
            FieldValue::Date(d) => f.debug_tuple("Date").field(d).finish(),
            FieldValue::Uuid(u) => f.debug_tuple("Uuid").field(u).finish(),
            FieldValue::Record(r) => f.debug_tuple("Record").field(&r.record_name()).finish(),
            FieldValue::List(items) => f.debug_tuple("List").field(items).finish(),
            FieldValue::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
        }
    }
}

/// Failure to build a host value from a loaded [`FieldValue`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field '{field}' is missing")]
    Missing { field: String },

    #[error("field '{field}': expected {expected}, got {actual}")]
    Type {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("field '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

impl FieldError {
    /// Builds a mismatch error, or `Missing` when nothing was supplied
    pub fn mismatch(expected: &'static str, actual: &FieldValue) -> Self {
        if actual.is_missing() {
            FieldError::Missing { field: String::new() }
        } else {
            FieldError::Type {
                field: String::new(),
                expected,
                actual: actual.type_name(),
            }
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        FieldError::Invalid {
            field: String::new(),
            reason: reason.into(),
        }
    }

    /// Path of the offending field
    pub fn field(&self) -> &str {
        match self {
            FieldError::Missing { field }
            | FieldError::Type { field, .. }
            | FieldError::Invalid { field, .. } => field,
        }
    }

    /// Prefixes the error path with `segment`
    pub fn at(mut self, segment: &str) -> Self {
        let path = match &mut self {
            FieldError::Missing { field }
            | FieldError::Type { field, .. }
            | FieldError::Invalid { field, .. } => field,
        };
        *path = join_path(segment, path);
        self
    }
}

/// Joins a parent path and a child segment (`a` + `b` -> `a.b`, `a` + `[1]` -> `a[1]`).
pub(crate) fn join_path(prefix: &str, child: &str) -> String {
    if prefix.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        prefix.to_string()
    } else if child.starts_with('[') {
        format!("{}{}", prefix, child)
    } else {
        format!("{}.{}", prefix, child)
    }
}

/// Types a record field may be declared as
#[derive(Debug, Clone)]
pub enum DeclaredType {
    String,
    /// Whole number accepted only within `min..=max`
    Integer { min: i64, max: i64 },
    Float,
    Boolean,
    Decimal,
    DateTime,
    Date,
    Uuid,
    /// Explicitly nullable / missable
    Optional(Box<DeclaredType>),
    List(Box<DeclaredType>),
    /// Mapping with string keys
    Map(Box<DeclaredType>),
    Record(RecordTypeInfo),
    /// A type with no mapping to any target kind
    Opaque(&'static str),
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::String => write!(f, "String"),
            DeclaredType::Integer { min, max } if (*min, *max) == (i64::MIN, i64::MAX) => {
                write!(f, "Integer")
            }
            DeclaredType::Integer { min, max } => write!(f, "Integer[{}, {}]", min, max),
            DeclaredType::Float => write!(f, "Float"),
            DeclaredType::Boolean => write!(f, "Boolean"),
            DeclaredType::Decimal => write!(f, "Decimal"),
            DeclaredType::DateTime => write!(f, "DateTime"),
            DeclaredType::Date => write!(f, "Date"),
            DeclaredType::Uuid => write!(f, "Uuid"),
            DeclaredType::Optional(inner) => write!(f, "Option<{}>", inner),
            DeclaredType::List(inner) => write!(f, "List<{}>", inner),
            DeclaredType::Map(inner) => write!(f, "Map<String, {}>", inner),
            DeclaredType::Record(info) => write!(f, "{}", info.name()),
            DeclaredType::Opaque(name) => write!(f, "{}", name),
        }
    }
}

impl DeclaredType {
    /// Integer over the full 64-bit signed range
    pub const INTEGER: DeclaredType = DeclaredType::Integer {
        min: i64::MIN,
        max: i64::MAX,
    };
}

/// Static description of a field's host type
pub trait Declared {
    fn declared_type() -> DeclaredType;
}

/// Read access to a host value as a [`FieldRef`]
pub trait AsField {
    fn as_field(&self) -> FieldRef<'_>;
}

/// Construction of a host value from a loaded [`FieldValue`]
pub trait FromField: Sized {
    fn from_field(value: FieldValue) -> Result<Self, FieldError>;
}

macro_rules! scalar_field {
    ($ty:ty, $declared:expr, $variant:ident, $name:literal) => {
        impl Declared for $ty {
            fn declared_type() -> DeclaredType {
                $declared
            }
        }

        impl AsField for $ty {
            fn as_field(&self) -> FieldRef<'_> {
                FieldRef::$variant(*self)
            }
        }

        impl FromField for $ty {
            fn from_field(value: FieldValue) -> Result<Self, FieldError> {
                match value {
                    FieldValue::$variant(v) => Ok(v),
                    other => Err(FieldError::mismatch($name, &other)),
                }
            }
        }
    };
}

scalar_field!(i64, DeclaredType::INTEGER, Int, "integer");
scalar_field!(f64, DeclaredType::Float, Float, "float");
scalar_field!(bool, DeclaredType::Boolean, Bool, "boolean");
scalar_field!(Decimal, DeclaredType::Decimal, Decimal, "decimal");
scalar_field!(DateTime<Utc>, DeclaredType::DateTime, DateTime, "datetime");
scalar_field!(NaiveDate, DeclaredType::Date, Date, "date");
scalar_field!(Uuid, DeclaredType::Uuid, Uuid, "uuid");

macro_rules! narrow_int_field {
    ($ty:ty) => {
        impl Declared for $ty {
            fn declared_type() -> DeclaredType {
                DeclaredType::Integer {
                    min: i64::from(<$ty>::MIN),
                    max: i64::from(<$ty>::MAX),
                }
            }
        }

        impl AsField for $ty {
            fn as_field(&self) -> FieldRef<'_> {
                FieldRef::Int(i64::from(*self))
            }
        }

        impl FromField for $ty {
            fn from_field(value: FieldValue) -> Result<Self, FieldError> {
                match value {
                    FieldValue::Int(v) => <$ty>::try_from(v).map_err(|_| {
                        FieldError::invalid(format!(
                            "{} is out of range for {}",
                            v,
                            stringify!($ty)
                        ))
                    }),
                    other => Err(FieldError::mismatch("integer", &other)),
                }
            }
        }
    };
}

narrow_int_field!(i32);
narrow_int_field!(u32);

impl Declared for String {
    fn declared_type() -> DeclaredType {
        DeclaredType::String
    }
}

impl AsField for String {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Str(self)
    }
}

impl FromField for String {
    fn from_field(value: FieldValue) -> Result<Self, FieldError> {
        match value {
            FieldValue::Str(s) => Ok(s),
            other => Err(FieldError::mismatch("string", &other)),
        }
    }
}

impl Declared for rust_decimal::Decimal {
    fn declared_type() -> DeclaredType {
        DeclaredType::Decimal
    }
}

impl AsField for rust_decimal::Decimal {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Decimal(Decimal::Finite(*self))
    }
}

impl FromField for rust_decimal::Decimal {
    fn from_field(value: FieldValue) -> Result<Self, FieldError> {
        match value {
            FieldValue::Decimal(d) => d
                .as_finite()
                .ok_or_else(|| FieldError::invalid(format!("{} is not a finite decimal", d))),
            other => Err(FieldError::mismatch("decimal", &other)),
        }
    }
}

impl AsField for MissingType {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::Missing
    }
}

impl<T: Declared> Declared for Option<T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::Optional(Box::new(T::declared_type()))
    }
}

impl<T: AsField> AsField for Option<T> {
    fn as_field(&self) -> FieldRef<'_> {
        match self {
            Some(v) => v.as_field(),
            None => FieldRef::None,
        }
    }
}

impl<T: FromField> FromField for Option<T> {
    fn from_field(value: FieldValue) -> Result<Self, FieldError> {
        match value {
            FieldValue::Missing | FieldValue::None => Ok(None),
            other => T::from_field(other).map(Some),
        }
    }
}

impl<T: Declared> Declared for Box<T> {
    fn declared_type() -> DeclaredType {
        T::declared_type()
    }
}

impl<T: AsField> AsField for Box<T> {
    fn as_field(&self) -> FieldRef<'_> {
        (**self).as_field()
    }
}

impl<T: FromField> FromField for Box<T> {
    fn from_field(value: FieldValue) -> Result<Self, FieldError> {
        T::from_field(value).map(Box::new)
    }
}

impl<T: Declared> Declared for Vec<T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::List(Box::new(T::declared_type()))
    }
}

impl<T: AsField> AsField for Vec<T> {
    fn as_field(&self) -> FieldRef<'_> {
        FieldRef::List(self.iter().map(AsField::as_field).collect())
    }
}

impl<T: FromField> FromField for Vec<T> {
    fn from_field(value: FieldValue) -> Result<Self, FieldError> {
        match value {
            FieldValue::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_field(item).map_err(|e| e.at(&format!("[{}]", i))))
                .collect(),
            other => Err(FieldError::mismatch("list", &other)),
        }
    }
}

macro_rules! map_field {
    ($map:ident) => {
        impl<T: Declared> Declared for $map<String, T> {
            fn declared_type() -> DeclaredType {
                DeclaredType::Map(Box::new(T::declared_type()))
            }
        }

        impl<T: AsField> AsField for $map<String, T> {
            fn as_field(&self) -> FieldRef<'_> {
                FieldRef::Map(self.iter().map(|(k, v)| (k.as_str(), v.as_field())).collect())
            }
        }

        impl<T: FromField> FromField for $map<String, T> {
            fn from_field(value: FieldValue) -> Result<Self, FieldError> {
                match value {
                    FieldValue::Map(entries) => entries
                        .into_iter()
                        .map(|(k, v)| match T::from_field(v) {
                            Ok(v) => Ok((k, v)),
                            Err(e) => Err(e.at(&k)),
                        })
                        .collect(),
                    other => Err(FieldError::mismatch("map", &other)),
                }
            }
        }
    };
}

map_field!(BTreeMap);
map_field!(HashMap);

/// Coerced field values handed to [`RecordType::construct`](super::RecordType::construct)
#[derive(Debug, Default)]
pub struct LoadedFields {
    values: HashMap<&'static str, FieldValue>,
}

impl LoadedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the value for a declared field name
    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.values.insert(name, value);
    }

    /// Removes and converts a field. Absent fields convert from `Missing`.
    pub fn take<T: FromField>(&mut self, name: &str) -> Result<T, FieldError> {
        let value = self.take_raw(name);
        T::from_field(value).map_err(|e| e.at(name))
    }

    /// Removes a field without conversion
    pub fn take_raw(&mut self, name: &str) -> FieldValue {
        self.values.remove(name).unwrap_or(FieldValue::Missing)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
