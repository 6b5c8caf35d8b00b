//! Pre-load hook registry
//!
//! A pre-load hook rewrites the raw mapping of a record before it is
//! validated. Hooks for a record type come from two places, and
//! [`HookRegistry::get_hooks`] always returns them in this order:
//!
//! 1. hooks declared on the type itself, in declaration order
//! 2. hooks registered later with [`HookRegistry::register_hook`], in
//!    registration order
//!
//! The registry is append-only. Declared hooks are read from the type's
//! declaration once, on first lookup.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};

use crate::error::{RecipeError, RecipeResult};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::record::{RecordType, RecordTypeInfo};

/// The raw mapping a hook receives and returns
pub type RawMapping = Map<String, Value>;

/// Error raised by a hook; propagated to the caller of `load` unchanged
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Result of running one hook
pub type HookResult = Result<RawMapping, HookError>;

/// A pre-load hook
#[derive(Clone)]
pub struct PreLoadHook(Arc<dyn Fn(RawMapping) -> HookResult + Send + Sync>);

impl PreLoadHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(RawMapping) -> HookResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Runs the hook
    pub fn apply(&self, data: RawMapping) -> HookResult {
        (self.0)(data)
    }

    /// True if both handles refer to the same hook function
    pub fn ptr_eq(&self, other: &PreLoadHook) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PreLoadHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PreLoadHook({:p})", Arc::as_ptr(&self.0))
    }
}

#[derive(Default)]
struct HookEntry {
    declared: Option<Vec<PreLoadHook>>,
    registered: Vec<PreLoadHook>,
}

/// Registry of pre-load hooks keyed by record type
#[derive(Default)]
pub struct HookRegistry {
    entries: RwLock<HashMap<TypeId, HookEntry>>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl HookRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that counts registrations
    pub fn with_metrics(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            metrics: Some(metrics),
        }
    }

    /// Appends an externally registered hook for `T`
    pub fn register_hook<T: RecordType>(&self, hook: PreLoadHook) -> RecipeResult<()> {
        self.register_for(&RecordTypeInfo::of::<T>(), hook)
    }

    /// Appends an externally registered hook for a type-erased record type
    pub fn register_for(&self, info: &RecordTypeInfo, hook: PreLoadHook) -> RecipeResult<()> {
        let count = {
            let mut entries = self
                .entries
                .write()
                .map_err(|_| RecipeError::Internal("Hook registry lock poisoned".into()))?;
            let entry = entries.entry(info.type_id()).or_default();
            entry.registered.push(hook);
            entry.registered.len()
        };

        if let Some(metrics) = &self.metrics {
            metrics.increment_hooks_registered();
        }
        let count = count.to_string();
        log_event_with_fields(
            Event::HookRegistered,
            &[("record", info.name()), ("registered", count.as_str())],
        );

        Ok(())
    }

    /// Declared hooks followed by registered hooks for `T`
    pub fn get_hooks<T: RecordType>(&self) -> RecipeResult<Vec<PreLoadHook>> {
        self.hooks_for(&RecordTypeInfo::of::<T>())
    }

    /// Declared hooks followed by registered hooks for a type-erased record type
    pub fn hooks_for(&self, info: &RecordTypeInfo) -> RecipeResult<Vec<PreLoadHook>> {
        {
            let entries = self
                .entries
                .read()
                .map_err(|_| RecipeError::Internal("Hook registry lock poisoned".into()))?;
            if let Some(entry) = entries.get(&info.type_id()) {
                if let Some(declared) = &entry.declared {
                    return Ok(merged(declared, &entry.registered));
                }
            }
        }

        // Read the declaration outside the lock; a concurrent first lookup
        // computes the same list and the first writer wins.
        let declared = info.declaration().into_pre_loads();

        let mut entries = self
            .entries
            .write()
            .map_err(|_| RecipeError::Internal("Hook registry lock poisoned".into()))?;
        let entry = entries.entry(info.type_id()).or_default();
        let declared = entry.declared.get_or_insert(declared);
        Ok(merged(declared, &entry.registered))
    }
}

fn merged(declared: &[PreLoadHook], registered: &[PreLoadHook]) -> Vec<PreLoadHook> {
    declared.iter().chain(registered).cloned().collect()
}

/// Apply hooks in order; the first hook error aborts
pub(crate) fn run_hooks(hooks: &[PreLoadHook], mut data: RawMapping) -> RecipeResult<RawMapping> {
    for hook in hooks {
        data = hook.apply(data).map_err(RecipeError::Hook)?;
    }
    Ok(data)
}
