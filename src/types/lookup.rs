use std::collections::HashMap;

use super::feature::{lookup_field, Feature};
use super::Value;

/// Maps a field name (or alias) used in a style to the canonical attribute key
/// carried by features. Keys are matched case-insensitively.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AliasLookup {
    aliases: HashMap<String, String>,
}

impl AliasLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` as another name for the feature key `canonical`.
    #[must_use]
    pub fn with(mut self, alias: &str, canonical: &str) -> Self {
        self.insert(alias, canonical);
        self
    }

    pub fn insert(&mut self, alias: &str, canonical: &str) {
        self.aliases
            .insert(alias.to_lowercase(), canonical.to_owned());
    }

    #[must_use]
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.aliases
            .get(&name.to_lowercase())
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
                    .map(|(_, canonical)| canonical)
            })
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// One entry of a coded-value domain.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodedValue {
    pub code: Value,
    pub name: String,
}

/// A lookup table between stored codes and human-readable labels.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodedValueDomain {
    #[cfg_attr(feature = "serde", serde(rename = "codedValues"))]
    pub values: Vec<CodedValue>,
}

impl CodedValueDomain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, code: impl Into<Value>, name: &str) -> Self {
        self.values.push(CodedValue {
            code: code.into(),
            name: name.to_owned(),
        });
        self
    }

    /// Label for a stored code.
    #[must_use]
    pub fn label_for(&self, code: &Value) -> Option<&str> {
        self.values
            .iter()
            .find(|entry| entry.code.loose_eq(code))
            .map(|entry| entry.name.as_str())
    }

    /// Stored code for a label.
    #[must_use]
    pub fn code_for(&self, label: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|entry| entry.name == label)
            .map(|entry| &entry.code)
    }
}

/// Coded-value domains keyed by field name (case-insensitive).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DomainsLookup {
    domains: HashMap<String, CodedValueDomain>,
}

impl DomainsLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: &str, domain: CodedValueDomain) -> Self {
        self.insert(field, domain);
        self
    }

    pub fn insert(&mut self, field: &str, domain: CodedValueDomain) {
        self.domains.insert(field.to_lowercase(), domain);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&CodedValueDomain> {
        self.domains.get(&field.to_lowercase()).or_else(|| {
            self.domains
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(field))
                .map(|(_, domain)| domain)
        })
    }
}

/// Service metadata consulted while matching rules.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldLookups {
    #[cfg_attr(feature = "serde", serde(default))]
    pub aliases: AliasLookup,
    #[cfg_attr(feature = "serde", serde(default))]
    pub domains: DomainsLookup,
}

/// Resolve a style field on a feature: exact name, then case-insensitive,
/// then through the alias table.
pub fn resolve_field<'f, F: Feature + ?Sized>(
    feature: &'f F,
    name: &str,
    aliases: &AliasLookup,
) -> Option<&'f Value> {
    lookup_field(feature, name).or_else(|| {
        let canonical = aliases.canonical(name)?;
        lookup_field(feature, canonical)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureRecord;

    #[test]
    fn alias_lookup_is_case_insensitive() {
        let aliases = AliasLookup::new().with("Province Name", "PROV_NAME");
        assert_eq!(aliases.canonical("province name"), Some("PROV_NAME"));
        assert_eq!(aliases.canonical("other"), None);
    }

    #[test]
    fn resolve_prefers_direct_match() {
        let feature = FeatureRecord::new().set("TYPE", "A").set("KIND", "B");
        let aliases = AliasLookup::new().with("type", "KIND");
        assert_eq!(resolve_field(&feature, "type", &aliases), Some(&Value::from("A")));
    }

    #[test]
    fn resolve_falls_back_to_alias() {
        let feature = FeatureRecord::new().set("PROV_NAME", "Ontario");
        let aliases = AliasLookup::new().with("Province", "prov_name");
        assert_eq!(
            resolve_field(&feature, "Province", &aliases),
            Some(&Value::from("Ontario"))
        );
        assert_eq!(resolve_field(&feature, "Missing", &aliases), None);
    }

    #[test]
    fn domain_decodes_both_ways() {
        let domain = CodedValueDomain::new().with(1_i64, "Paved").with(2_i64, "Gravel");
        assert_eq!(domain.label_for(&Value::from(2_i64)), Some("Gravel"));
        assert_eq!(domain.label_for(&Value::from("1")), Some("Paved"));
        assert_eq!(domain.label_for(&Value::from(3_i64)), None);
        assert_eq!(domain.code_for("Paved"), Some(&Value::from(1_i64)));
        assert_eq!(domain.code_for("Dirt"), None);
    }

    #[test]
    fn domains_keyed_case_insensitively() {
        let domains = DomainsLookup::new().with("Surface", CodedValueDomain::new().with(1_i64, "Paved"));
        assert!(domains.get("SURFACE").is_some());
        assert!(domains.get("other").is_none());
    }
}
