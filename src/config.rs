//! Recipe configuration
//!
//! Serializable so it can live in an application's own config file:
//!
//! ```json
//! { "naming": { "case": "camel_case", "capitalize_words": ["id"] },
//!   "unknown_fields": "raise",
//!   "log_level": "info" }
//! ```
//!
//! Every key is optional.

use serde::{Deserialize, Serialize};

use crate::naming::NamingStrategy;
use crate::observability::Severity;

/// What `load` does with keys that match no declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFields {
    /// Ignore them
    #[default]
    Exclude,
    /// Report each one as a violation
    Raise,
}

/// Configuration for a [`Recipe`](crate::Recipe)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeConfig {
    /// Naming strategy used for every bake
    #[serde(default)]
    pub naming: NamingStrategy,
    #[serde(default)]
    pub unknown_fields: UnknownFields,
    /// Log threshold set when the recipe is built. The logger is
    /// process-wide, so this changes logging for every recipe in the
    /// process, the global one included. `None` keeps the current setting
    /// (`RECIPE_LOG`, default WARN).
    #[serde(default)]
    pub log_level: Option<Severity>,
}

impl RecipeConfig {
    pub fn with_naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_unknown_fields(mut self, unknown_fields: UnknownFields) -> Self {
        self.unknown_fields = unknown_fields;
        self
    }

    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Parse a JSON configuration document
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingCase;

    #[test]
    fn test_config_default() {
        let config = RecipeConfig::default();
        assert_eq!(config.naming, NamingStrategy::identity());
        assert_eq!(config.unknown_fields, UnknownFields::Exclude);
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_config_from_json() {
        let config = RecipeConfig::from_json(
            r#"{"naming": {"case": "capital_camel_case", "capitalize_words": ["ID"]},
                "unknown_fields": "raise",
                "log_level": "trace"}"#,
        )
        .unwrap();

        assert_eq!(config.naming.case, NamingCase::CapitalCamelCase);
        assert_eq!(config.naming.apply("user_id"), "UserID");
        assert_eq!(config.unknown_fields, UnknownFields::Raise);
        assert_eq!(config.log_level, Some(Severity::Trace));
    }

    #[test]
    fn test_config_empty_document_uses_defaults() {
        assert_eq!(RecipeConfig::from_json("{}").unwrap(), RecipeConfig::default());
    }

    #[test]
    fn test_config_builders() {
        let config = RecipeConfig::default()
            .with_naming(NamingStrategy::camel_case())
            .with_unknown_fields(UnknownFields::Raise)
            .with_log_level(Severity::Info);
        assert_eq!(config.naming.apply("created_at"), "createdAt");
        assert_eq!(config.unknown_fields, UnknownFields::Raise);
        assert_eq!(config.log_level, Some(Severity::Info));
    }
}
