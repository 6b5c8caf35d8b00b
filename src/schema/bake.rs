//! Schema compiler
//!
//! A bake session compiles one root record type and every nested record
//! type it reaches that is not cached yet. Types still being compiled are
//! tracked so a self-reference becomes a back-edge instead of recursing.
//! Nothing reaches the cache unless the whole session succeeds.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, Weak};

use super::cache::SchemaCache;
use super::errors::SchemaError;
use super::types::{FieldSchema, FieldSchemaTable, SchemaRef, TargetKind};
use crate::error::RecipeResult;
use crate::naming::NamingStrategy;
use crate::observability::{log_event_with_fields, Event};
use crate::record::{DeclaredType, FieldDecl, RecordTypeInfo, MAX_PLACES};

type Slot = Arc<OnceLock<Weak<FieldSchemaTable>>>;

pub(crate) struct BakeSession<'a> {
    cache: &'a SchemaCache,
    naming: &'a NamingStrategy,
    /// Types on the current compile path
    in_progress: HashMap<TypeId, Slot>,
    /// Tables finished in this session, in completion order
    finished: Vec<(TypeId, Arc<FieldSchemaTable>)>,
}

impl<'a> BakeSession<'a> {
    pub(crate) fn new(cache: &'a SchemaCache, naming: &'a NamingStrategy) -> Self {
        Self {
            cache,
            naming,
            in_progress: HashMap::new(),
            finished: Vec::new(),
        }
    }

    /// Compiles `root`; returns every table finished by the session
    pub(crate) fn bake_root(
        &mut self,
        root: &RecordTypeInfo,
    ) -> RecipeResult<Vec<(TypeId, Arc<FieldSchemaTable>)>> {
        self.bake_record(root)?;
        Ok(std::mem::take(&mut self.finished))
    }

    fn bake_record(&mut self, info: &RecordTypeInfo) -> RecipeResult<SchemaRef> {
        let type_id = info.type_id();

        if let Some(table) = self.cache.get(self.naming, type_id)? {
            return Ok(SchemaRef::strong(table));
        }
        if let Some((_, table)) = self.finished.iter().find(|(id, _)| *id == type_id) {
            return Ok(SchemaRef::strong(Arc::clone(table)));
        }
        if let Some(slot) = self.in_progress.get(&type_id) {
            log_event_with_fields(Event::SchemaCycleLinked, &[("record", info.name())]);
            return Ok(SchemaRef::back(*info, Arc::clone(slot)));
        }

        let slot: Slot = Arc::new(OnceLock::new());
        self.in_progress.insert(type_id, Arc::clone(&slot));

        let compiled = self.compile_fields(info);
        self.in_progress.remove(&type_id);

        let table = Arc::new(FieldSchemaTable::new(*info, self.naming.clone(), compiled?));
        // A fresh slot is only ever filled here
        let _ = slot.set(Arc::downgrade(&table));
        self.finished.push((type_id, Arc::clone(&table)));

        Ok(SchemaRef::strong(table))
    }

    fn compile_fields(&mut self, info: &RecordTypeInfo) -> RecipeResult<Vec<FieldSchema>> {
        let decl = info.declaration();
        let mut fields = Vec::with_capacity(decl.fields().len());
        let mut taken: HashMap<String, &'static str> = HashMap::new();
        let mut declared_names = HashSet::new();

        for field in decl.fields() {
            if !declared_names.insert(field.name) {
                return Err(SchemaError::duplicate_name(info.name(), field.name, field.name, field.name).into());
            }

            let schema = self.compile_field(info, field)?;
            if let Some(first) = taken.get(&schema.serialized_name) {
                return Err(SchemaError::duplicate_name(
                    info.name(),
                    &schema.serialized_name,
                    first,
                    field.name,
                )
                .into());
            }
            taken.insert(schema.serialized_name.clone(), field.name);
            fields.push(schema);
        }

        Ok(fields)
    }

    fn compile_field(&mut self, info: &RecordTypeInfo, field: &FieldDecl) -> RecipeResult<FieldSchema> {
        // One level of optionality only
        let (optional, inner) = match &field.declared {
            DeclaredType::Optional(inner) => (true, inner.as_ref()),
            other => (false, other),
        };

        let kind = self.resolve_kind(info, field, inner)?;

        if field.meta.places.is_some() && !kind.holds_decimal() {
            return Err(SchemaError::invalid_metadata(
                info.name(),
                field.name,
                format!("places given for non-decimal kind {}", kind),
            )
            .into());
        }

        let serialized_name = match &field.meta.name {
            Some(name) => name.clone(),
            None => self.naming.apply(field.name),
        };

        Ok(FieldSchema {
            declared_name: field.name,
            serialized_name,
            optional,
            kind,
        })
    }

    fn resolve_kind(
        &mut self,
        info: &RecordTypeInfo,
        field: &FieldDecl,
        declared: &DeclaredType,
    ) -> RecipeResult<TargetKind> {
        let kind = match declared {
            DeclaredType::String => TargetKind::String,
            DeclaredType::Integer { min, max } => TargetKind::Integer { min: *min, max: *max },
            DeclaredType::Float => TargetKind::Float,
            DeclaredType::Boolean => TargetKind::Boolean,
            DeclaredType::DateTime => TargetKind::DateTime,
            DeclaredType::Date => TargetKind::Date,
            DeclaredType::Uuid => TargetKind::Uuid,
            DeclaredType::Decimal => match field.meta.places {
                Some(places) if places <= MAX_PLACES => TargetKind::Decimal { places },
                Some(places) => {
                    return Err(SchemaError::invalid_metadata(
                        info.name(),
                        field.name,
                        format!("places {} exceeds the maximum of {}", places, MAX_PLACES),
                    )
                    .into())
                }
                None => return Err(SchemaError::missing_places(info.name(), field.name).into()),
            },
            DeclaredType::List(inner) => TargetKind::List(Box::new(self.resolve_kind(info, field, inner)?)),
            DeclaredType::Map(inner) => TargetKind::Map(Box::new(self.resolve_kind(info, field, inner)?)),
            DeclaredType::Record(nested) => TargetKind::Record(self.bake_record(nested)?),
            DeclaredType::Optional(_) | DeclaredType::Opaque(_) => {
                return Err(SchemaError::unsupported_type(info.name(), field.name, &field.declared).into())
            }
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldError, FieldMeta, FieldRef, LoadedFields, Record, RecordDecl, RecordType};
    use crate::schema::SchemaErrorCode;

    /// Record type that only carries a declaration
    macro_rules! declared_only {
        ($name:ident, $decl:expr) => {
            struct $name;

            impl Record for $name {
                fn read_field(&self, _name: &str) -> Option<FieldRef<'_>> {
                    None
                }
            }

            impl RecordType for $name {
                const NAME: &'static str = stringify!($name);

                fn declare() -> RecordDecl {
                    $decl
                }

                fn construct(_fields: LoadedFields) -> Result<Self, FieldError> {
                    Ok($name)
                }
            }
        };
    }

    declared_only!(
        Money,
        RecordDecl::new()
            .field_with::<crate::Decimal>("amount", FieldMeta::decimal(4))
            .field::<Option<String>>("currency_code")
    );
    declared_only!(NoPlaces, RecordDecl::new().field::<crate::Decimal>("amount"));
    declared_only!(
        TooManyPlaces,
        RecordDecl::new().field_with::<crate::Decimal>("amount", FieldMeta::decimal(29))
    );
    declared_only!(
        PlacesOnString,
        RecordDecl::new().field_with::<String>("label", FieldMeta::decimal(2))
    );
    declared_only!(
        Opaque,
        RecordDecl::new().declared_field("socket", DeclaredType::Opaque("TcpStream"), FieldMeta::default())
    );
    declared_only!(NestedOption, RecordDecl::new().field::<Option<Option<i64>>>("value"));
    declared_only!(
        Clash,
        RecordDecl::new().field::<String>("user_id").field::<String>("userId")
    );
    declared_only!(
        Renamed,
        RecordDecl::new()
            .field_with::<i64>("user_id", FieldMeta::named("uid"))
            .field::<i64>("count")
    );
    declared_only!(
        Wallet,
        RecordDecl::new()
            .declared_field("balance", DeclaredType::Record(RecordTypeInfo::of::<Money>()), FieldMeta::default())
            .declared_field(
                "history",
                DeclaredType::List(Box::new(DeclaredType::Record(RecordTypeInfo::of::<Money>()))),
                FieldMeta::default(),
            )
    );
    declared_only!(
        Node,
        RecordDecl::new().field::<i64>("value").declared_field(
            "next",
            DeclaredType::Optional(Box::new(DeclaredType::Record(RecordTypeInfo::of::<Node>()))),
            FieldMeta::default(),
        )
    );
    declared_only!(
        Broken,
        RecordDecl::new()
            .declared_field("money", DeclaredType::Record(RecordTypeInfo::of::<Money>()), FieldMeta::default())
            .field::<crate::Decimal>("fee")
    );

    fn bake(info: RecordTypeInfo, cache: &SchemaCache) -> RecipeResult<Arc<FieldSchemaTable>> {
        cache.bake_info(&info, &NamingStrategy::camel_case())
    }

    fn schema_code(result: RecipeResult<Arc<FieldSchemaTable>>) -> SchemaErrorCode {
        match result {
            Err(crate::RecipeError::Schema(err)) => err.code(),
            other => panic!("expected schema error, got {:?}", other.map(|t| t.record().name())),
        }
    }

    #[test]
    fn test_fields_in_declaration_order() {
        let cache = SchemaCache::new();
        let table = bake(RecordTypeInfo::of::<Money>(), &cache).unwrap();

        let names: Vec<&str> = table.fields().iter().map(|f| f.serialized_name.as_str()).collect();
        assert_eq!(names, vec!["amount", "currencyCode"]);
        assert_eq!(table.fields()[0].kind, TargetKind::Decimal { places: 4 });
        assert!(!table.fields()[0].optional);
        assert!(table.fields()[1].optional);
        assert_eq!(table.fields()[1].kind, TargetKind::String);
    }

    #[test]
    fn test_decimal_metadata_rules() {
        let cache = SchemaCache::new();
        assert_eq!(
            schema_code(bake(RecordTypeInfo::of::<NoPlaces>(), &cache)),
            SchemaErrorCode::MissingMetadata
        );
        assert_eq!(
            schema_code(bake(RecordTypeInfo::of::<TooManyPlaces>(), &cache)),
            SchemaErrorCode::InvalidMetadata
        );
        assert_eq!(
            schema_code(bake(RecordTypeInfo::of::<PlacesOnString>(), &cache)),
            SchemaErrorCode::InvalidMetadata
        );
    }

    #[test]
    fn test_unsupported_types() {
        let cache = SchemaCache::new();
        assert_eq!(
            schema_code(bake(RecordTypeInfo::of::<Opaque>(), &cache)),
            SchemaErrorCode::UnsupportedType
        );
        assert_eq!(
            schema_code(bake(RecordTypeInfo::of::<NestedOption>(), &cache)),
            SchemaErrorCode::UnsupportedType
        );
    }

    #[test]
    fn test_duplicate_serialized_name() {
        let cache = SchemaCache::new();
        assert_eq!(
            schema_code(bake(RecordTypeInfo::of::<Clash>(), &cache)),
            SchemaErrorCode::DuplicateName
        );
        // Under identity the names differ
        assert!(cache
            .bake_info(&RecordTypeInfo::of::<Clash>(), &NamingStrategy::identity())
            .is_ok());
    }

    #[test]
    fn test_explicit_name_bypasses_naming() {
        let cache = SchemaCache::new();
        let table = bake(RecordTypeInfo::of::<Renamed>(), &cache).unwrap();
        assert_eq!(table.fields()[0].serialized_name, "uid");
        assert_eq!(table.fields()[1].serialized_name, "count");
    }

    #[test]
    fn test_nested_tables_are_shared_and_cached() {
        let cache = SchemaCache::new();
        let wallet = bake(RecordTypeInfo::of::<Wallet>(), &cache).unwrap();
        assert_eq!(cache.len().unwrap(), 2);

        let balance = match &wallet.fields()[0].kind {
            TargetKind::Record(schema) => schema.resolve().unwrap(),
            other => panic!("unexpected kind {:?}", other),
        };
        let history = match &wallet.fields()[1].kind {
            TargetKind::List(inner) => match inner.as_ref() {
                TargetKind::Record(schema) => schema.resolve().unwrap(),
                other => panic!("unexpected kind {:?}", other),
            },
            other => panic!("unexpected kind {:?}", other),
        };
        assert!(Arc::ptr_eq(&balance, &history));

        let money = bake(RecordTypeInfo::of::<Money>(), &cache).unwrap();
        assert!(Arc::ptr_eq(&money, &balance));
    }

    #[test]
    fn test_self_reference_becomes_back_edge() {
        let cache = SchemaCache::new();
        let node = bake(RecordTypeInfo::of::<Node>(), &cache).unwrap();

        let next = &node.fields()[1];
        assert!(next.optional);
        match &next.kind {
            TargetKind::Record(schema) => {
                assert!(schema.is_cycle());
                assert!(Arc::ptr_eq(&schema.resolve().unwrap(), &node));
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_failed_bake_caches_nothing() {
        let cache = SchemaCache::new();
        assert_eq!(
            schema_code(bake(RecordTypeInfo::of::<Broken>(), &cache)),
            SchemaErrorCode::MissingMetadata
        );
        // Money compiled fine inside the failed session but was not published
        assert!(cache.is_empty().unwrap());
    }
}
