//! Search result entries and attribute extraction.

use serde::{Deserialize, Serialize};

use crate::client::{RawEntry, RawValue};

/// One `(name, value)` pair of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    /// Attribute description.
    pub name: String,
    /// Value decoded as text.
    pub value: String,
}

impl AttributeValue {
    /// Creates a pair.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A matched directory object as an ordered list of attribute values.
///
/// Multi-valued attributes contribute one pair per value, sharing the name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry {
    values: Vec<AttributeValue>,
}

impl Entry {
    /// Returns the pairs in directory order.
    #[must_use]
    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }

    /// Returns the first value of an attribute, matched case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .map(|v| v.value.as_str())
    }

    /// Returns every value of an attribute, matched case-insensitively.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .iter()
            .filter(move |v| v.name.eq_ignore_ascii_case(name))
            .map(|v| v.value.as_str())
    }

    /// Returns the number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when the entry has no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<AttributeValue> for Entry {
    fn from_iter<T: IntoIterator<Item = AttributeValue>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Entry {
    type Item = AttributeValue;
    type IntoIter = std::vec::IntoIter<AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Entries in the order they were received, across all pages.
pub type SearchResult = Vec<Entry>;

/// Flattens a raw entry into `(name, value)` pairs.
///
/// Binary values are decoded as lossy UTF-8. Returns `None` when nothing is
/// left, e.g. when access control hid every requested attribute.
#[must_use]
pub fn extract_entry(raw: RawEntry) -> Option<Entry> {
    let entry: Entry = raw
        .attributes
        .into_iter()
        .flat_map(|attribute| {
            let name = attribute.name;
            attribute.values.into_iter().map(move |value| {
                let value = match value {
                    RawValue::Text(text) => text,
                    RawValue::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                };
                AttributeValue::new(name.clone(), value)
            })
        })
        .collect();

    (!entry.is_empty()).then_some(entry)
}
