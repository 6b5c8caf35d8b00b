//! Baked schema types
//!
//! A [`FieldSchemaTable`] is the compiled, immutable form of a record
//! declaration: one [`FieldSchema`] per declared field, in declaration
//! order. Nested record fields reference the nested type's table through a
//! shared [`SchemaRef`].

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use serde_json::{json, Value};

use super::errors::{SchemaError, SchemaResult};
use crate::naming::NamingStrategy;
use crate::record::RecordTypeInfo;

/// Primitive target kind of a field
#[derive(Debug, Clone, PartialEq)]
pub enum TargetKind {
    String,
    /// Whole number within `min..=max`
    Integer { min: i64, max: i64 },
    Float,
    Boolean,
    /// Fixed decimal rendered with exactly `places` fractional digits
    Decimal { places: u32 },
    /// UTC timestamp
    DateTime,
    Date,
    Uuid,
    /// Nested record
    Record(SchemaRef),
    List(Box<TargetKind>),
    /// String-keyed mapping
    Map(Box<TargetKind>),
}

impl TargetKind {
    /// Integer over the full 64-bit signed range
    pub const INTEGER: TargetKind = TargetKind::Integer {
        min: i64::MIN,
        max: i64::MAX,
    };

    /// Bounds of an integer kind narrower than 64-bit signed
    pub fn integer_bounds(&self) -> Option<(i64, i64)> {
        match self {
            TargetKind::Integer { min, max } if (*min, *max) != (i64::MIN, i64::MAX) => {
                Some((*min, *max))
            }
            _ => None,
        }
    }

    /// Kind name used in errors
    pub fn name(&self) -> &'static str {
        match self {
            TargetKind::String => "string",
            TargetKind::Integer { .. } => "integer",
            TargetKind::Float => "float",
            TargetKind::Boolean => "boolean",
            TargetKind::Decimal { .. } => "decimal",
            TargetKind::DateTime => "datetime",
            TargetKind::Date => "date",
            TargetKind::Uuid => "uuid",
            TargetKind::Record(_) => "record",
            TargetKind::List(_) => "list",
            TargetKind::Map(_) => "map",
        }
    }

    /// True if the kind is, or contains, a fixed decimal
    pub fn holds_decimal(&self) -> bool {
        match self {
            TargetKind::Decimal { .. } => true,
            TargetKind::List(inner) | TargetKind::Map(inner) => inner.holds_decimal(),
            _ => false,
        }
    }

    /// JSON description; nested records are named, not expanded
    pub fn describe(&self) -> Value {
        match self {
            TargetKind::Decimal { places } => json!({ "kind": "decimal", "places": places }),
            TargetKind::Integer { min, max } if self.integer_bounds().is_some() => {
                json!({ "kind": "integer", "min": min, "max": max })
            }
            TargetKind::Record(schema) => json!({ "kind": "record", "record": schema.record().name() }),
            TargetKind::List(inner) => json!({ "kind": "list", "items": inner.describe() }),
            TargetKind::Map(inner) => json!({ "kind": "map", "values": inner.describe() }),
            other => json!({ "kind": other.name() }),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Decimal { places } => write!(f, "decimal({})", places),
            TargetKind::Integer { min, max } if self.integer_bounds().is_some() => {
                write!(f, "integer[{}, {}]", min, max)
            }
            TargetKind::Record(schema) => write!(f, "record({})", schema.record().name()),
            TargetKind::List(inner) => write!(f, "list<{}>", inner),
            TargetKind::Map(inner) => write!(f, "map<{}>", inner),
            other => write!(f, "{}", other.name()),
        }
    }
}

#[derive(Clone)]
enum Link {
    /// Owning reference to an already-built table
    Strong(Arc<FieldSchemaTable>),
    /// Back-edge to a table that was still being built; filled in once it is
    Back(Arc<OnceLock<Weak<FieldSchemaTable>>>),
}

/// Shared reference to a nested record's table
#[derive(Clone)]
pub struct SchemaRef {
    record: RecordTypeInfo,
    link: Link,
}

impl SchemaRef {
    pub(crate) fn strong(table: Arc<FieldSchemaTable>) -> Self {
        Self {
            record: table.record,
            link: Link::Strong(table),
        }
    }

    pub(crate) fn back(record: RecordTypeInfo, slot: Arc<OnceLock<Weak<FieldSchemaTable>>>) -> Self {
        Self {
            record,
            link: Link::Back(slot),
        }
    }

    /// Record type the reference points at
    pub fn record(&self) -> RecordTypeInfo {
        self.record
    }

    /// True for the back-edge of a cyclic type graph
    pub fn is_cycle(&self) -> bool {
        matches!(self.link, Link::Back(_))
    }

    /// The referenced table
    pub fn resolve(&self) -> SchemaResult<Arc<FieldSchemaTable>> {
        match &self.link {
            Link::Strong(table) => Ok(Arc::clone(table)),
            Link::Back(slot) => slot
                .get()
                .and_then(Weak::upgrade)
                .ok_or_else(|| SchemaError::cycle_dropped(self.record.name())),
        }
    }
}

impl PartialEq for SchemaRef {
    /// Nested tables are shared per record type, so the type decides equality
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRef")
            .field("record", &self.record.name())
            .field("cycle", &self.is_cycle())
            .finish()
    }
}

/// Compiled description of one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// Attribute name on the record
    pub declared_name: &'static str,
    /// Key in the dumped mapping
    pub serialized_name: String,
    /// `None` / `MISSING` values are omitted on dump and tolerated on load
    pub optional: bool,
    pub kind: TargetKind,
}

impl FieldSchema {
    pub fn describe(&self) -> Value {
        let mut value = self.kind.describe();
        if let Value::Object(map) = &mut value {
            map.insert("name".into(), Value::String(self.declared_name.to_string()));
            map.insert("serialized_name".into(), Value::String(self.serialized_name.clone()));
            map.insert("optional".into(), Value::Bool(self.optional));
        }
        value
    }
}

/// Immutable, ordered field schemas of one record type under one naming strategy
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchemaTable {
    record: RecordTypeInfo,
    naming: NamingStrategy,
    fields: Vec<FieldSchema>,
}

impl FieldSchemaTable {
    pub(crate) fn new(record: RecordTypeInfo, naming: NamingStrategy, fields: Vec<FieldSchema>) -> Self {
        Self { record, naming, fields }
    }

    pub fn record(&self) -> RecordTypeInfo {
        self.record
    }

    pub fn naming(&self) -> &NamingStrategy {
        &self.naming
    }

    /// Field schemas in declaration order
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Looks up a field by its declared name
    pub fn field(&self, declared_name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.declared_name == declared_name)
    }

    /// Looks up a field by its serialized name
    pub fn field_by_serialized(&self, serialized_name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.serialized_name == serialized_name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON description of the table
    pub fn describe(&self) -> Value {
        json!({
            "record": self.record.name(),
            "naming": self.naming.to_string(),
            "fields": self.fields.iter().map(FieldSchema::describe).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holds_decimal_through_containers() {
        let kind = TargetKind::List(Box::new(TargetKind::Map(Box::new(TargetKind::Decimal {
            places: 2,
        }))));
        assert!(kind.holds_decimal());
        assert!(!TargetKind::List(Box::new(TargetKind::String)).holds_decimal());
    }

    #[test]
    fn test_kind_display() {
        let kind = TargetKind::Map(Box::new(TargetKind::Decimal { places: 4 }));
        assert_eq!(kind.to_string(), "map<decimal(4)>");
        assert_eq!(TargetKind::INTEGER.to_string(), "integer");
        assert_eq!(
            TargetKind::Integer { min: 0, max: 10 }.to_string(),
            "integer[0, 10]"
        );
    }

    #[test]
    fn test_integer_bounds_only_when_narrowed() {
        assert_eq!(TargetKind::INTEGER.integer_bounds(), None);
        assert_eq!(TargetKind::INTEGER.describe(), json!({ "kind": "integer" }));

        let narrow = TargetKind::Integer {
            min: i64::from(i32::MIN),
            max: i64::from(i32::MAX),
        };
        assert_eq!(
            narrow.integer_bounds(),
            Some((i64::from(i32::MIN), i64::from(i32::MAX)))
        );
        assert_eq!(narrow.describe()["max"], json!(i32::MAX));
    }

    #[test]
    fn test_field_describe() {
        let field = FieldSchema {
            declared_name: "amount",
            serialized_name: "Amount".into(),
            optional: true,
            kind: TargetKind::Decimal { places: 4 },
        };
        let described = field.describe();
        assert_eq!(described["kind"], "decimal");
        assert_eq!(described["places"], 4);
        assert_eq!(described["name"], "amount");
        assert_eq!(described["serialized_name"], "Amount");
        assert_eq!(described["optional"], true);
    }

    #[test]
    fn test_unfilled_back_edge_reports_cycle_dropped() {
        struct Node;
        impl crate::Record for Node {
            fn read_field(&self, _name: &str) -> Option<crate::FieldRef<'_>> {
                None
            }
        }
        impl crate::RecordType for Node {
            const NAME: &'static str = "Node";
            fn declare() -> crate::RecordDecl {
                crate::RecordDecl::new()
            }
            fn construct(_fields: crate::LoadedFields) -> Result<Self, crate::FieldError> {
                Ok(Node)
            }
        }

        let schema = SchemaRef::back(RecordTypeInfo::of::<Node>(), Arc::new(OnceLock::new()));
        assert!(schema.is_cycle());
        let err = schema.resolve().unwrap_err();
        assert_eq!(err.code(), super::super::SchemaErrorCode::CycleDropped);
    }
}
