//! Record types and instances
//!
//! A record type is declared once, as an ordered list of typed fields with
//! optional per-field metadata. Instances are read attribute by attribute
//! on dump and constructed from coerced field values on load.
//!
//! Implement [`Record`] and [`RecordType`] by hand, or let the
//! [`record!`](crate::record!) macro generate them for an existing struct:
//!
//! ```ignore
//! struct Transaction {
//!     id: Uuid,
//!     amount: Decimal,
//!     processed_at: Option<DateTime<Utc>>,
//! }
//!
//! record! {
//!     Transaction {
//!         id: Uuid,
//!         amount: Decimal => FieldMeta::decimal(4),
//!         processed_at: Option<DateTime<Utc>>,
//!     }
//! }
//! ```

mod decimal;
mod decl;
mod field;
mod macros;

pub use decimal::{Decimal, DecimalParseError, MAX_PLACES};
pub use decl::{FieldDecl, FieldMeta, RecordDecl};
pub use field::{
    AsField, Declared, DeclaredType, FieldError, FieldRef, FieldValue, FromField, LoadedFields,
};

pub(crate) use field::join_path;

use std::any::{Any, TypeId};
use std::fmt;

/// Upcast helpers so record trait objects can be inspected and downcast
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Read access to a record instance
pub trait Record: AsAny + Send + Sync {
    /// Reads the attribute with the given declared name.
    ///
    /// Returns `None` when the record has no such attribute.
    fn read_field(&self, name: &str) -> Option<FieldRef<'_>>;

    /// Type name used in logs and errors
    fn record_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// The static side of a record type: its declaration and constructor
pub trait RecordType: Record + Sized {
    /// Record type name used in logs and errors
    const NAME: &'static str;

    /// Ordered field declarations and type-declared pre-load hooks
    fn declare() -> RecordDecl;

    /// Builds an instance from coerced field values
    fn construct(fields: LoadedFields) -> Result<Self, FieldError>;
}

/// Type-erased handle to a record type
#[derive(Clone, Copy)]
pub struct RecordTypeInfo {
    type_id: TypeId,
    name: &'static str,
    declare: fn() -> RecordDecl,
    construct: fn(LoadedFields) -> Result<Box<dyn Record>, FieldError>,
}

impl RecordTypeInfo {
    pub fn of<T: RecordType>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: T::NAME,
            declare: T::declare,
            construct: construct_boxed::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Reads the type's declaration
    pub fn declaration(&self) -> RecordDecl {
        (self.declare)()
    }

    /// Constructs a boxed instance
    pub fn construct(&self, fields: LoadedFields) -> Result<Box<dyn Record>, FieldError> {
        (self.construct)(fields)
    }

    /// True if `record` is an instance of this type
    pub fn is_instance(&self, record: &dyn Record) -> bool {
        AsAny::as_any(record).type_id() == self.type_id
    }
}

impl fmt::Debug for RecordTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordTypeInfo")
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for RecordTypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for RecordTypeInfo {}

fn construct_boxed<T: RecordType>(fields: LoadedFields) -> Result<Box<dyn Record>, FieldError> {
    T::construct(fields).map(|r| Box::new(r) as Box<dyn Record>)
}

/// Converts a loaded nested record back into its concrete type
pub fn downcast_record<T: RecordType>(value: FieldValue) -> Result<T, FieldError> {
    match value {
        FieldValue::Record(boxed) => AsAny::into_any(boxed)
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| FieldError::invalid(format!("expected record {}", T::NAME))),
        other => Err(FieldError::mismatch("record", &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl Record for Point {
        fn read_field(&self, name: &str) -> Option<FieldRef<'_>> {
            match name {
                "x" => Some(self.x.as_field()),
                "y" => Some(self.y.as_field()),
                _ => None,
            }
        }
    }

    impl RecordType for Point {
        const NAME: &'static str = "Point";

        fn declare() -> RecordDecl {
            RecordDecl::new().field::<i64>("x").field::<i64>("y")
        }

        fn construct(mut fields: LoadedFields) -> Result<Self, FieldError> {
            Ok(Point {
                x: fields.take("x")?,
                y: fields.take("y")?,
            })
        }
    }

    struct Other;

    impl Record for Other {
        fn read_field(&self, _name: &str) -> Option<FieldRef<'_>> {
            None
        }
    }

    #[test]
    fn test_type_info_identity() {
        let info = RecordTypeInfo::of::<Point>();
        assert_eq!(info.name(), "Point");
        assert_eq!(info, RecordTypeInfo::of::<Point>());
        assert!(info.is_instance(&Point { x: 1, y: 2 }));
        assert!(!info.is_instance(&Other));
    }

    #[test]
    fn test_construct_and_downcast() {
        let info = RecordTypeInfo::of::<Point>();
        let mut fields = LoadedFields::new();
        fields.insert("x", FieldValue::Int(1));
        fields.insert("y", FieldValue::Int(2));

        let boxed = info.construct(fields).unwrap();
        let point = downcast_record::<Point>(FieldValue::Record(boxed)).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
    }

    #[test]
    fn test_construct_reports_missing_field() {
        let mut fields = LoadedFields::new();
        fields.insert("x", FieldValue::Int(1));

        let err = Point::construct(fields).unwrap_err();
        assert_eq!(err, FieldError::Missing { field: "y".into() });
    }

    #[test]
    fn test_downcast_wrong_type() {
        let value = FieldValue::Record(Box::new(Other));
        assert!(downcast_record::<Point>(value).is_err());
    }

    #[test]
    fn test_default_record_name() {
        assert!(Other.record_name().ends_with("Other"));
    }
}
