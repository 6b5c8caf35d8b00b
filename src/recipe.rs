//! Recipe: the engine that ties schema cache, hooks and config together
//!
//! An application either builds its own [`Recipe`] or uses the free
//! functions at the crate root, which all go through [`Recipe::global`].
//!
//! ```ignore
//! use record_recipe::{Recipe, RecipeConfig, NamingStrategy};
//!
//! let recipe = Recipe::new(RecipeConfig::default().with_naming(NamingStrategy::camel_case()));
//! let tree = recipe.dump(&order)?;
//! let back: Order = recipe.load(tree)?;
//! ```

use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::config::RecipeConfig;
use crate::error::{RecipeError, RecipeResult};
use crate::hooks::{HookRegistry, HookResult, PreLoadHook, RawMapping};
use crate::naming::NamingStrategy;
use crate::observability::{log_event_with_fields, Event, Logger, MetricsRegistry};
use crate::record::RecordType;
use crate::schema::{FieldSchema, FieldSchemaTable, SchemaCache};
use crate::serialization::{self, Loader};

static GLOBAL: OnceLock<Recipe> = OnceLock::new();

/// Schema cache, hook registry and configuration of one dump/load setup
pub struct Recipe {
    cache: SchemaCache,
    hooks: HookRegistry,
    config: RecipeConfig,
    metrics: Arc<MetricsRegistry>,
}

impl Recipe {
    /// Builds a recipe.
    ///
    /// A `log_level` in the config replaces the process-wide log threshold;
    /// it is not scoped to this recipe.
    pub fn new(config: RecipeConfig) -> Self {
        if let Some(level) = config.log_level {
            Logger::set_threshold(level);
        }

        let naming = config.naming.to_string();
        let unknown_fields = format!("{:?}", config.unknown_fields).to_lowercase();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("naming", naming.as_str()), ("unknown_fields", unknown_fields.as_str())],
        );

        let metrics = Arc::new(MetricsRegistry::new());
        Self {
            cache: SchemaCache::with_metrics(Arc::clone(&metrics)),
            hooks: HookRegistry::with_metrics(Arc::clone(&metrics)),
            config,
            metrics,
        }
    }

    /// Process-wide recipe with the default configuration
    pub fn global() -> &'static Recipe {
        GLOBAL.get_or_init(|| Recipe::new(RecipeConfig::default()))
    }

    pub fn config(&self) -> &RecipeConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Baked table for `T` under the configured naming strategy
    pub fn bake<T: RecordType>(&self) -> RecipeResult<Arc<FieldSchemaTable>> {
        self.cache.bake::<T>(&self.config.naming)
    }

    /// Baked table for `T` under an explicit naming strategy
    pub fn bake_with<T: RecordType>(&self, naming: &NamingStrategy) -> RecipeResult<Arc<FieldSchemaTable>> {
        self.cache.bake::<T>(naming)
    }

    /// Validates and dumps one record
    pub fn dump<T: RecordType>(&self, record: &T) -> RecipeResult<Value> {
        let table = self.bake::<T>()?;
        match serialization::dump(&table, record) {
            Ok(tree) => {
                self.metrics.increment_records_dumped();
                Ok(tree)
            }
            Err(err) => {
                self.metrics.increment_dump_failures();
                Err(err)
            }
        }
    }

    pub fn dump_many<T: RecordType>(&self, records: &[T]) -> RecipeResult<Vec<Value>> {
        let table = self.bake::<T>()?;
        let trees = serialization::dump_many(&table, records)
            .map_err(|err| self.batch_failed("dump_many", T::NAME, err))?;
        for _ in &trees {
            self.metrics.increment_records_dumped();
        }
        Ok(trees)
    }

    /// Runs hooks, validates and constructs one record
    pub fn load<T: RecordType>(&self, data: Value) -> RecipeResult<T> {
        let table = self.bake::<T>()?;
        match self.loader().load(&table, data) {
            Ok(record) => {
                self.metrics.increment_records_loaded();
                Ok(record)
            }
            Err(err) => {
                self.metrics.increment_load_failures();
                Err(err)
            }
        }
    }

    pub fn load_many<T: RecordType>(&self, data: Vec<Value>) -> RecipeResult<Vec<T>> {
        let table = self.bake::<T>()?;
        let records = serialization::load_many(&self.loader(), &table, data)
            .map_err(|err| self.batch_failed("load_many", T::NAME, err))?;
        for _ in &records {
            self.metrics.increment_records_loaded();
        }
        Ok(records)
    }

    /// Dumps a batch with inline type checks only
    pub fn fast_dump<T: RecordType>(&self, records: &[T]) -> RecipeResult<Vec<Value>> {
        let table = self.bake::<T>()?;
        let trees = serialization::fast_dump(&table, records)
            .map_err(|err| self.batch_failed("fast_dump", T::NAME, err))?;
        self.metrics.add_records_fast_dumped(trees.len() as u64);
        Ok(trees)
    }

    /// Encodes a batch straight to JSON bytes
    pub fn fast_dump_bytes<T: RecordType>(&self, records: &[T]) -> RecipeResult<Vec<u8>> {
        let table = self.bake::<T>()?;
        let bytes = serialization::fast_dump_bytes(&table, records)
            .map_err(|err| self.batch_failed("fast_dump_bytes", T::NAME, err))?;
        self.metrics.add_records_fast_dumped(records.len() as u64);
        Ok(bytes)
    }

    /// Appends an external pre-load hook for `T`, after its declared hooks
    pub fn register_hook<T, F>(&self, hook: F) -> RecipeResult<()>
    where
        T: RecordType,
        F: Fn(RawMapping) -> HookResult + Send + Sync + 'static,
    {
        self.hooks.register_hook::<T>(PreLoadHook::new(hook))
    }

    /// Declared hooks then registered hooks for `T`, in run order
    pub fn get_hooks<T: RecordType>(&self) -> RecipeResult<Vec<PreLoadHook>> {
        self.hooks.get_hooks::<T>()
    }

    fn loader(&self) -> Loader<'_> {
        Loader::new(&self.hooks, self.config.unknown_fields)
    }

    fn batch_failed(&self, operation: &str, record: &str, err: RecipeError) -> RecipeError {
        match operation {
            "load_many" => self.metrics.increment_load_failures(),
            _ => self.metrics.increment_dump_failures(),
        }
        if let Some(index) = err.element_index() {
            let index = index.to_string();
            log_event_with_fields(
                Event::BatchAborted,
                &[("operation", operation), ("record", record), ("index", index.as_str())],
            );
        }
        err
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::new(RecipeConfig::default())
    }
}

/// Baked table for `T` under `naming`, from the global cache
pub fn bake<T: RecordType>(naming: &NamingStrategy) -> RecipeResult<Arc<FieldSchemaTable>> {
    Recipe::global().bake_with::<T>(naming)
}

pub fn dump<T: RecordType>(record: &T) -> RecipeResult<Value> {
    Recipe::global().dump(record)
}

pub fn dump_many<T: RecordType>(records: &[T]) -> RecipeResult<Vec<Value>> {
    Recipe::global().dump_many(records)
}

pub fn load<T: RecordType>(data: Value) -> RecipeResult<T> {
    Recipe::global().load(data)
}

pub fn load_many<T: RecordType>(data: Vec<Value>) -> RecipeResult<Vec<T>> {
    Recipe::global().load_many(data)
}

pub fn fast_dump<T: RecordType>(records: &[T]) -> RecipeResult<Vec<Value>> {
    Recipe::global().fast_dump(records)
}

pub fn fast_dump_bytes<T: RecordType>(records: &[T]) -> RecipeResult<Vec<u8>> {
    Recipe::global().fast_dump_bytes(records)
}

/// Registers a process-wide pre-load hook for `T`
pub fn register_hook<T, F>(hook: F) -> RecipeResult<()>
where
    T: RecordType,
    F: Fn(RawMapping) -> HookResult + Send + Sync + 'static,
{
    Recipe::global().register_hook::<T, F>(hook)
}

pub fn get_hooks<T: RecordType>() -> RecipeResult<Vec<PreLoadHook>> {
    Recipe::global().get_hooks::<T>()
}

/// Field schema for a declared field name
pub fn get_field_for<'t>(table: &'t FieldSchemaTable, declared_name: &str) -> Option<&'t FieldSchema> {
    table.field(declared_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnknownFields;
    use crate::record;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Tag {
        label: String,
        weight: i64,
    }

    record!(Tag { label: String, weight: i64 });

    #[test]
    fn test_counts_dumps_and_loads() {
        let recipe = Recipe::default();
        let tag = Tag { label: "a".into(), weight: 2 };

        let tree = recipe.dump(&tag).unwrap();
        assert_eq!(tree, json!({"label": "a", "weight": 2}));
        let back: Tag = recipe.load(tree).unwrap();
        assert_eq!(back, tag);

        let snapshot = recipe.metrics().snapshot();
        assert_eq!(snapshot.records_dumped, 1);
        assert_eq!(snapshot.records_loaded, 1);
        assert_eq!(snapshot.schemas_baked, 1);
        assert_eq!(snapshot.cache_hits, 1);
    }

    #[test]
    fn test_failed_load_counted() {
        let recipe = Recipe::default();
        assert!(recipe.load::<Tag>(json!({"label": "a"})).is_err());
        assert_eq!(recipe.metrics().snapshot().load_failures, 1);
    }

    #[test]
    fn test_batch_failure_keeps_index() {
        let recipe = Recipe::default();
        let err = recipe
            .load_many::<Tag>(vec![json!({"label": "a", "weight": 1}), json!({"label": "b"})])
            .unwrap_err();
        assert_eq!(err.element_index(), Some(1));
        assert_eq!(recipe.metrics().snapshot().records_loaded, 0);
    }

    #[test]
    fn test_unknown_fields_from_config() {
        let recipe = Recipe::new(RecipeConfig::default().with_unknown_fields(UnknownFields::Raise));
        let err = recipe
            .load::<Tag>(json!({"label": "a", "weight": 1, "colour": "red"}))
            .unwrap_err();
        let validation = err.as_validation().unwrap();
        assert_eq!(validation.fields(), vec!["colour"]);
    }

    #[test]
    fn test_get_field_for() {
        let recipe = Recipe::new(RecipeConfig::default().with_naming(NamingStrategy::capital_camel_case()));
        let table = recipe.bake::<Tag>().unwrap();
        assert_eq!(get_field_for(&table, "weight").unwrap().serialized_name, "Weight");
        assert!(get_field_for(&table, "Weight").is_none());
    }
}
