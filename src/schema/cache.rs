//! Compute-once cache of baked tables keyed by naming strategy and record type

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::bake::BakeSession;
use super::types::FieldSchemaTable;
use crate::error::{RecipeError, RecipeResult};
use crate::naming::NamingStrategy;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::record::{RecordType, RecordTypeInfo};

type TableMap = HashMap<TypeId, Arc<FieldSchemaTable>>;

/// Cache of baked schema tables
///
/// Concurrent first bakes of one type may both compile it; only the first
/// commit is published and every caller gets the published table.
#[derive(Default)]
pub struct SchemaCache {
    tables: RwLock<HashMap<NamingStrategy, TableMap>>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that counts bakes and hits
    pub fn with_metrics(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            metrics: Some(metrics),
        }
    }

    /// Bakes `T` under `naming`, or returns the cached table
    pub fn bake<T: RecordType>(&self, naming: &NamingStrategy) -> RecipeResult<Arc<FieldSchemaTable>> {
        self.bake_info(&RecordTypeInfo::of::<T>(), naming)
    }

    /// Bakes a type-erased record type, or returns the cached table
    pub fn bake_info(
        &self,
        info: &RecordTypeInfo,
        naming: &NamingStrategy,
    ) -> RecipeResult<Arc<FieldSchemaTable>> {
        if let Some(table) = self.get(naming, info.type_id())? {
            if let Some(metrics) = &self.metrics {
                metrics.increment_cache_hits();
            }
            log_event_with_fields(Event::SchemaCacheHit, &[("record", info.name())]);
            return Ok(table);
        }

        let mut session = BakeSession::new(self, naming);
        let baked = match session.bake_root(info) {
            Ok(baked) => baked,
            Err(err) => {
                if let Some(metrics) = &self.metrics {
                    metrics.increment_bake_failures();
                }
                let message = err.to_string();
                log_event_with_fields(
                    Event::SchemaBakeFailed,
                    &[("record", info.name()), ("error", message.as_str())],
                );
                return Err(err);
            }
        };

        let (table, published) = self.commit(naming, info.type_id(), baked)?;

        if published > 0 {
            if let Some(metrics) = &self.metrics {
                metrics.add_schemas_baked(published as u64);
            }
            let fields = table.len().to_string();
            let tables = published.to_string();
            let naming = naming.to_string();
            log_event_with_fields(
                Event::SchemaBaked,
                &[
                    ("record", info.name()),
                    ("fields", fields.as_str()),
                    ("tables", tables.as_str()),
                    ("naming", naming.as_str()),
                ],
            );
        }

        Ok(table)
    }

    /// Cached table, if any
    pub fn get(
        &self,
        naming: &NamingStrategy,
        type_id: TypeId,
    ) -> RecipeResult<Option<Arc<FieldSchemaTable>>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| RecipeError::Internal("Schema cache lock poisoned".into()))?;
        Ok(tables.get(naming).and_then(|by_type| by_type.get(&type_id)).cloned())
    }

    /// Number of cached tables across all naming strategies
    pub fn len(&self) -> RecipeResult<usize> {
        let tables = self
            .tables
            .read()
            .map_err(|_| RecipeError::Internal("Schema cache lock poisoned".into()))?;
        Ok(tables.values().map(HashMap::len).sum())
    }

    pub fn is_empty(&self) -> RecipeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Publishes the tables of one successful bake session.
    ///
    /// If another caller published the root first, the session is
    /// discarded whole so back-edges never point at an unpublished table.
    /// Returns the published root and how many tables this call added.
    fn commit(
        &self,
        naming: &NamingStrategy,
        root: TypeId,
        baked: Vec<(TypeId, Arc<FieldSchemaTable>)>,
    ) -> RecipeResult<(Arc<FieldSchemaTable>, usize)> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| RecipeError::Internal("Schema cache lock poisoned".into()))?;
        let by_type = tables.entry(naming.clone()).or_default();

        if let Some(existing) = by_type.get(&root) {
            return Ok((Arc::clone(existing), 0));
        }

        let mut published = 0;
        for (type_id, table) in baked {
            by_type.entry(type_id).or_insert_with(|| {
                published += 1;
                table
            });
        }

        by_type
            .get(&root)
            .cloned()
            .map(|table| (table, published))
            .ok_or_else(|| RecipeError::Internal("baked root table was not produced".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldError, FieldRef, LoadedFields, Record, RecordDecl};

    struct Flat {
        label: String,
    }

    impl Record for Flat {
        fn read_field(&self, name: &str) -> Option<FieldRef<'_>> {
            match name {
                "label" => Some(FieldRef::Str(&self.label)),
                _ => None,
            }
        }
    }

    impl RecordType for Flat {
        const NAME: &'static str = "Flat";

        fn declare() -> RecordDecl {
            RecordDecl::new().field::<String>("label")
        }

        fn construct(mut fields: LoadedFields) -> Result<Self, FieldError> {
            Ok(Flat {
                label: fields.take("label")?,
            })
        }
    }

    #[test]
    fn test_second_bake_hits_cache() {
        let metrics = Arc::new(MetricsRegistry::new());
        let cache = SchemaCache::with_metrics(Arc::clone(&metrics));
        let naming = NamingStrategy::identity();

        let first = cache.bake::<Flat>(&naming).unwrap();
        let second = cache.bake::<Flat>(&naming).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.schemas_baked, 1);
        assert_eq!(snapshot.cache_hits, 1);
    }

    #[test]
    fn test_cache_is_keyed_by_naming() {
        let cache = SchemaCache::new();
        cache.bake::<Flat>(&NamingStrategy::identity()).unwrap();
        cache.bake::<Flat>(&NamingStrategy::capital_camel_case()).unwrap();

        assert_eq!(cache.len().unwrap(), 2);
        let capital = cache
            .get(&NamingStrategy::capital_camel_case(), TypeId::of::<Flat>())
            .unwrap()
            .unwrap();
        assert_eq!(capital.fields()[0].serialized_name, "Label");
    }

    #[test]
    fn test_commit_keeps_first_publisher() {
        let cache = SchemaCache::new();
        let naming = NamingStrategy::identity();
        let published = cache.bake::<Flat>(&naming).unwrap();

        let late = Arc::new(FieldSchemaTable::new(
            RecordTypeInfo::of::<Flat>(),
            naming.clone(),
            Vec::new(),
        ));
        let (winner, added) = cache
            .commit(&naming, TypeId::of::<Flat>(), vec![(TypeId::of::<Flat>(), late)])
            .unwrap();

        assert!(Arc::ptr_eq(&winner, &published));
        assert_eq!(added, 0);
    }
}
