//! Naming strategies for serialized field names
//!
//! A naming strategy is a pure `&str -> String` mapping from a field's
//! declared name to the key used in dumped output. Declared names are
//! `_`-separated words; camel-case strategies join them back together.
//!
//! Strategies are plain values (hashable, comparable) so that a baked
//! schema can be cached per `(record type, strategy)` pair.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Supported naming cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingCase {
    /// Declared name is used as-is
    #[default]
    Identity,
    /// `created_at` -> `createdAt`
    CamelCase,
    /// `created_at` -> `CreatedAt`
    CapitalCamelCase,
}

impl NamingCase {
    /// Returns the case name for logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingCase::Identity => "identity",
            NamingCase::CamelCase => "camel_case",
            NamingCase::CapitalCamelCase => "capital_camel_case",
        }
    }
}

impl fmt::Display for NamingCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bound naming strategy: a case plus its acronym configuration.
///
/// Words listed in `capitalize_words` are upper-cased wholesale instead of
/// being capitalized, so `user_id` with `{"id"}` becomes `userID`. The
/// first word of a lower camel-case name is never upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NamingStrategy {
    /// Target case
    #[serde(default)]
    pub case: NamingCase,
    /// Lower-cased words rendered fully upper-case
    #[serde(default, deserialize_with = "lowercase_words")]
    pub capitalize_words: BTreeSet<String>,
}

fn lowercase_words<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
    let words = BTreeSet::<String>::deserialize(deserializer)?;
    Ok(words.into_iter().map(|w| w.to_lowercase()).collect())
}

impl NamingStrategy {
    /// The identity strategy
    pub fn identity() -> Self {
        Self::default()
    }

    /// Lower camel case without acronyms
    pub fn camel_case() -> Self {
        Self::with_case(NamingCase::CamelCase)
    }

    /// Upper camel case without acronyms
    pub fn capital_camel_case() -> Self {
        Self::with_case(NamingCase::CapitalCamelCase)
    }

    /// A strategy for the given case without acronyms
    pub fn with_case(case: NamingCase) -> Self {
        Self {
            case,
            capitalize_words: BTreeSet::new(),
        }
    }

    /// Adds acronym words. Matching is case-insensitive.
    pub fn capitalizing<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.capitalize_words
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    /// Maps a declared name to its serialized name. Total: never fails.
    pub fn apply(&self, name: &str) -> String {
        match self.case {
            NamingCase::Identity => name.to_string(),
            NamingCase::CamelCase => join_words(name, &self.capitalize_words, false),
            NamingCase::CapitalCamelCase => join_words(name, &self.capitalize_words, true),
        }
    }
}

impl fmt::Display for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.case)?;
        if !self.capitalize_words.is_empty() {
            let words: Vec<&str> = self.capitalize_words.iter().map(String::as_str).collect();
            write!(f, "[{}]", words.join(","))?;
        }
        Ok(())
    }
}

/// `created_at` -> `createdAt`
pub fn camel_case(name: &str) -> String {
    join_words(name, &BTreeSet::new(), false)
}

/// `created_at` -> `CreatedAt`
pub fn capital_camel_case(name: &str) -> String {
    join_words(name, &BTreeSet::new(), true)
}

/// Builds a lower camel-case strategy with acronym handling.
pub fn camel_case_factory<I, S>(capitalize_words: I) -> NamingStrategy
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    NamingStrategy::camel_case().capitalizing(capitalize_words)
}

/// Builds an upper camel-case strategy with acronym handling.
pub fn capital_camel_case_factory<I, S>(capitalize_words: I) -> NamingStrategy
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    NamingStrategy::capital_camel_case().capitalizing(capitalize_words)
}

fn join_words(name: &str, acronyms: &BTreeSet<String>, capitalize_first: bool) -> String {
    let mut out = String::with_capacity(name.len());

    for (i, word) in name.split('_').filter(|w| !w.is_empty()).enumerate() {
        if i == 0 && !capitalize_first {
            out.push_str(word);
        } else if acronyms.contains(&word.to_lowercase()) {
            out.push_str(&word.to_uppercase());
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let strategy = NamingStrategy::identity();
        assert_eq!(strategy.apply("created_at"), "created_at");
        assert_eq!(strategy.apply(""), "");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("created_at"), "createdAt");
        assert_eq!(camel_case("id"), "id");
        assert_eq!(camel_case("transaction_amount_usd"), "transactionAmountUsd");
    }

    #[test]
    fn test_capital_camel_case() {
        assert_eq!(capital_camel_case("created_at"), "CreatedAt");
        assert_eq!(capital_camel_case("id"), "Id");
    }

    #[test]
    fn test_empty_and_degenerate_input() {
        assert_eq!(camel_case(""), "");
        assert_eq!(capital_camel_case(""), "");
        assert_eq!(camel_case("___"), "");
        assert_eq!(camel_case("_private_field"), "privateField");
        assert_eq!(camel_case("double__underscore"), "doubleUnderscore");
    }

    #[test]
    fn test_acronyms() {
        let strategy = camel_case_factory(["id", "URL"]);
        assert_eq!(strategy.apply("user_id"), "userID");
        assert_eq!(strategy.apply("callback_url"), "callbackURL");
        // first word keeps its casing in lower camel case
        assert_eq!(strategy.apply("id"), "id");

        let strategy = capital_camel_case_factory(["id"]);
        assert_eq!(strategy.apply("id"), "ID");
        assert_eq!(strategy.apply("user_id"), "UserID");
    }

    #[test]
    fn test_non_ascii() {
        assert_eq!(camel_case("größe_äpfel"), "größeÄpfel");
    }

    #[test]
    fn test_strategies_are_hashable_keys() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(NamingStrategy::camel_case());
        set.insert(camel_case_factory(Vec::<String>::new()));
        set.insert(camel_case_factory(["id"]));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_config_roundtrip() {
        let strategy = capital_camel_case_factory(["id"]);
        let json = serde_json::to_string(&strategy).unwrap();
        let back: NamingStrategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, strategy);

        let parsed: NamingStrategy = serde_json::from_str(r#"{"case":"camel_case"}"#).unwrap();
        assert_eq!(parsed, NamingStrategy::camel_case());
    }
}
