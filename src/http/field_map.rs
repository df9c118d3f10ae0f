//! Multi-valued field map shared by headers and query parameters.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Value stored under a field name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    Multi(Vec<String>),
}

impl FieldValue {
    /// Iterate the values in the order they were seen.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Self::Scalar(value) => core::slice::from_ref(value),
            Self::Multi(values) => values,
        };
        values.iter().map(String::as_str)
    }

    /// The first value seen for the field.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.iter().next()
    }
}

/// Ordered, case-sensitive mapping from field name to one or more values.
///
/// The first insertion of a name stores a scalar; the second promotes it to a
/// list, which keeps accumulating from then on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, FieldValue)>,
}

impl FieldMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let Some((_, existing)) = self.entries.iter_mut().find(|(n, _)| *n == name) else {
            self.entries.push((name, FieldValue::Scalar(value)));
            return;
        };
        match existing {
            FieldValue::Multi(values) => values.push(value),
            FieldValue::Scalar(first) => {
                let first = core::mem::take(first);
                *existing = FieldValue::Multi(vec![first, value]);
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find_map(|(n, value)| (n == name).then_some(value))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// True when `name` holds `value`, either as its scalar or as a list member.
    #[must_use]
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.get(name).is_some_and(|values| values.iter().any(|v| v == value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
