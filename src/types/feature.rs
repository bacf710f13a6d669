use std::collections::HashMap;

use super::Value;

/// Broad geometry family of a feature. Multi-part geometries report the
/// family of their parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
    #[default]
    Unknown,
}

/// Read-only view of a map feature's attributes.
///
/// The engine never mutates a feature; every evaluation borrows it.
pub trait Feature {
    /// Exact (case-sensitive) attribute lookup.
    fn get_field(&self, name: &str) -> Option<&Value>;

    /// Names of every attribute carried by the feature.
    fn field_names(&self) -> Vec<&str>;

    fn geometry_kind(&self) -> GeometryKind {
        GeometryKind::Unknown
    }
}

/// Look up an attribute by exact name, falling back to a case-insensitive match.
pub fn lookup_field<'f, F: Feature + ?Sized>(feature: &'f F, name: &str) -> Option<&'f Value> {
    if let Some(value) = feature.get_field(name) {
        return Some(value);
    }
    let key = feature
        .field_names()
        .into_iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(name))?;
    feature.get_field(key)
}

/// In-memory feature: an attribute map plus a geometry kind.
#[derive(Debug, Clone, Default)]
pub struct FeatureRecord {
    fields: HashMap<String, Value>,
    geometry: GeometryKind,
}

impl FeatureRecord {
    /// Create a feature with no attributes and an unknown geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value.
    #[must_use]
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: GeometryKind) -> Self {
        self.geometry = geometry;
        self
    }

    /// Insert an attribute (mutable reference version).
    pub fn insert(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_owned(), value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Feature for FeatureRecord {
    fn get_field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    fn geometry_kind(&self) -> GeometryKind {
        self.geometry
    }
}

impl Feature for HashMap<String, Value> {
    fn get_field(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }

    fn field_names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }
}
