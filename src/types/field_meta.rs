use super::Value;

/// Attribute type as reported by service metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum FieldType {
    String,
    Number,
    Date,
}

impl FieldType {
    /// Best guess for a field without metadata.
    #[must_use]
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Number(_) => FieldType::Number,
            _ => FieldType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FieldMeta {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldMeta {
    #[must_use]
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_owned(),
            field_type,
        }
    }

    #[must_use]
    pub fn string(name: &str) -> Self {
        Self::new(name, FieldType::String)
    }

    #[must_use]
    pub fn number(name: &str) -> Self {
        Self::new(name, FieldType::Number)
    }

    #[must_use]
    pub fn date(name: &str) -> Self {
        Self::new(name, FieldType::Date)
    }
}

/// Type of `name` among `fields` (case-insensitive).
#[must_use]
pub fn field_type_of(fields: &[FieldMeta], name: &str) -> Option<FieldType> {
    fields
        .iter()
        .find(|meta| meta.name.eq_ignore_ascii_case(name))
        .map(|meta| meta.field_type)
}
