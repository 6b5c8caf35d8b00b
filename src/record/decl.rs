//! Record declarations: the ordered field list the schema compiler reads

use super::field::{Declared, DeclaredType};
use crate::hooks::{HookResult, PreLoadHook, RawMapping};

/// Per-field coercion metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMeta {
    /// Fixed number of fractional digits for decimal fields
    pub places: Option<u32>,
    /// Serialized name overriding the naming strategy
    pub name: Option<String>,
}

impl FieldMeta {
    /// Metadata for a fixed-decimal field
    pub fn decimal(places: u32) -> Self {
        Self {
            places: Some(places),
            name: None,
        }
    }

    /// Metadata carrying an explicit serialized name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            places: None,
            name: Some(name.into()),
        }
    }

    pub fn with_places(mut self, places: u32) -> Self {
        self.places = Some(places);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One declared field
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Attribute name on the record
    pub name: &'static str,
    /// Declared host type
    pub declared: DeclaredType,
    pub meta: FieldMeta,
}

/// Ordered field declarations and type-declared pre-load hooks
#[derive(Debug, Clone, Default)]
pub struct RecordDecl {
    fields: Vec<FieldDecl>,
    pre_loads: Vec<PreLoadHook>,
}

impl RecordDecl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field typed `F`
    pub fn field<F: Declared>(self, name: &'static str) -> Self {
        self.field_with::<F>(name, FieldMeta::default())
    }

    /// Declares a field typed `F` with metadata
    pub fn field_with<F: Declared>(self, name: &'static str, meta: FieldMeta) -> Self {
        self.declared_field(name, F::declared_type(), meta)
    }

    /// Declares a field from an explicit type description
    pub fn declared_field(mut self, name: &'static str, declared: DeclaredType, meta: FieldMeta) -> Self {
        self.fields.push(FieldDecl { name, declared, meta });
        self
    }

    /// Declares a pre-load hook on the type
    pub fn pre_load<F>(self, hook: F) -> Self
    where
        F: Fn(RawMapping) -> HookResult + Send + Sync + 'static,
    {
        self.pre_load_hook(PreLoadHook::new(hook))
    }

    /// Declares an already-built pre-load hook on the type
    pub fn pre_load_hook(mut self, hook: PreLoadHook) -> Self {
        self.pre_loads.push(hook);
        self
    }

    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn pre_loads(&self) -> &[PreLoadHook] {
        &self.pre_loads
    }

    pub(crate) fn into_pre_loads(self) -> Vec<PreLoadHook> {
        self.pre_loads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    #[test]
    fn test_fields_keep_declaration_order() {
        let decl = RecordDecl::new()
            .field::<String>("b")
            .field::<i64>("a")
            .field_with::<Option<DateTime<Utc>>>("c", FieldMeta::named("C"));

        let names: Vec<&str> = decl.fields().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(decl.fields()[2].meta.name.as_deref(), Some("C"));
        assert!(matches!(decl.fields()[2].declared, DeclaredType::Optional(_)));
    }

    #[test]
    fn test_meta_builders() {
        let meta = FieldMeta::decimal(4).with_name("amt");
        assert_eq!(meta.places, Some(4));
        assert_eq!(meta.name.as_deref(), Some("amt"));
        assert_eq!(FieldMeta::named("x").with_places(2), meta_with(2, "x"));
    }

    fn meta_with(places: u32, name: &str) -> FieldMeta {
        FieldMeta {
            places: Some(places),
            name: Some(name.to_string()),
        }
    }

    #[test]
    fn test_pre_loads_in_order() {
        let decl = RecordDecl::new()
            .pre_load(|data| Ok(data))
            .pre_load(|mut data| {
                data.clear();
                Ok(data)
            });
        assert_eq!(decl.pre_loads().len(), 2);
    }
}
