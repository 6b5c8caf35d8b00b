//! Observable events
//!
//! Events are explicit and typed. Each carries the severity it is logged at.

use std::fmt;

use super::Severity;

/// Observable events in the dump/load pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Schema compilation
    /// A field schema table was compiled and cached
    SchemaBaked,
    /// Compilation failed; nothing was cached
    SchemaBakeFailed,
    /// A cached table was reused
    SchemaCacheHit,
    /// A self-referencing field was compiled as a back-edge
    SchemaCycleLinked,

    // Hooks
    /// An external pre-load hook was registered
    HookRegistered,

    // Batches
    /// A batch dump or load stopped at a failing element
    BatchAborted,

    // Configuration
    /// Configuration applied to a recipe instance
    ConfigLoaded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaBaked => "SCHEMA_BAKED",
            Event::SchemaBakeFailed => "SCHEMA_BAKE_FAILED",
            Event::SchemaCacheHit => "SCHEMA_CACHE_HIT",
            Event::SchemaCycleLinked => "SCHEMA_CYCLE_LINKED",
            Event::HookRegistered => "PRE_LOAD_HOOK_REGISTERED",
            Event::BatchAborted => "BATCH_ABORTED",
            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::SchemaCacheHit | Event::SchemaCycleLinked => Severity::Trace,
            Event::SchemaBaked | Event::HookRegistered | Event::ConfigLoaded => Severity::Info,
            Event::SchemaBakeFailed | Event::BatchAborted => Severity::Warn,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
