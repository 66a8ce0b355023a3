//! Value types for the Intermediate Representation

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;

/// Raw delimiter tree for a single field.
///
/// `Repeated` only appears at field level. A `Composite` directly under the field
/// (or under one repetition) holds components; a `Composite` inside a component
/// holds subcomponents. Nothing nests deeper than that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueNode {
    /// Plain text with no further structure
    Leaf(String),
    /// Ordered components or subcomponents
    Composite(Vec<ValueNode>),
    /// Field repetitions
    Repeated(Vec<ValueNode>),
}

impl ValueNode {
    /// Create a leaf node
    pub fn leaf(text: impl Into<String>) -> Self {
        Self::Leaf(text.into())
    }

    /// The empty leaf, used for absent or empty raw text
    #[must_use]
    pub fn empty() -> Self {
        Self::Leaf(String::new())
    }

    /// Leaf text, if this node is a leaf
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Leaf(text) => Some(text),
            _ => None,
        }
    }

    /// Child nodes; a leaf has none
    #[must_use]
    pub fn children(&self) -> &[ValueNode] {
        match self {
            Self::Leaf(_) => &[],
            Self::Composite(children) | Self::Repeated(children) => children,
        }
    }
}

/// A decoded, named field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Absent field, or an empty field whose descriptor expects structure
    #[default]
    Null,
    /// Scalar text
    Text(String),
    /// Named components
    Record(Record),
    /// Field repetitions
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Create a text value
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a named component of a record value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.as_record().and_then(|record| record.get(name))
    }

    /// Index into a list value
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&FieldValue> {
        self.as_list().and_then(|items| items.get(index))
    }

    /// Short name of the variant, used in diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Record(_) => "record",
            Self::List(_) => "list",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Record> for FieldValue {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        Self::List(items)
    }
}

/// One named entry in a [`Record`]
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub value: FieldValue,
}

/// Named values keyed by their 1-based wire position.
///
/// Iteration always follows position order, independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: BTreeMap<usize, Entry>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value at a position, returning the entry it replaced
    pub fn insert(
        &mut self,
        position: usize,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<Entry> {
        self.entries.insert(
            position,
            Entry {
                name: name.into(),
                value: value.into(),
            },
        )
    }

    /// Builder form of [`Record::insert`]
    #[must_use]
    pub fn with(
        mut self,
        position: usize,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.insert(position, name, value);
        self
    }

    /// Value of the entry with this name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .values()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.value)
    }

    /// Entry stored at a position
    #[must_use]
    pub fn get_at(&self, position: usize) -> Option<&Entry> {
        self.entries.get(&position)
    }

    /// Position of the entry with this name
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(position, _)| *position)
    }

    /// Entries in position order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Entry)> {
        self.entries.iter().map(|(position, entry)| (*position, entry))
    }

    /// Lowest populated position
    #[must_use]
    pub fn first_position(&self) -> Option<usize> {
        self.entries.keys().next().copied()
    }

    /// Highest populated position
    #[must_use]
    pub fn last_position(&self) -> Option<usize> {
        self.entries.keys().next_back().copied()
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

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in self.entries.values() {
            map.serialize_entry(&entry.name, &entry.value)?;
        }
        map.end()
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Record(record) => record.serialize(serializer),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}
