//! Segment records

use crate::node::{FieldValue, Record};
use serde::ser::{Serialize, Serializer};

/// Type code of the header segment
pub const HEADER_SEGMENT: &str = "MSH";

/// One decoded segment: its type code and a position-keyed record of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    code: String,
    fields: Record,
}

impl Segment {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            fields: Record::new(),
        }
    }

    pub fn with_fields(code: impl Into<String>, fields: Record) -> Self {
        Self {
            code: code.into(),
            fields,
        }
    }

    /// Builder that sets the field at a position
    #[must_use]
    pub fn with_field(
        mut self,
        position: usize,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        self.fields.insert(position, name, value);
        self
    }

    /// Set the field at a position
    pub fn set(
        &mut self,
        position: usize,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> &mut Self {
        self.fields.insert(position, name, value);
        self
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn fields(&self) -> &Record {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Record {
        &mut self.fields
    }

    /// Field value by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Field value by 1-based position
    #[must_use]
    pub fn field_at(&self, position: usize) -> Option<&FieldValue> {
        self.fields.get_at(position).map(|entry| &entry.value)
    }

    #[must_use]
    pub fn is_header(&self) -> bool {
        self.code == HEADER_SEGMENT
    }
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_field_access() {
        let segment = Segment::new("PID")
            .with_field(3, "PatientIdentifierList", "12345")
            .with_field(1, "SetID", "1");

        assert_eq!(segment.code(), "PID");
        assert!(!segment.is_header());
        assert_eq!(segment.get("SetID").and_then(FieldValue::as_text), Some("1"));
        assert_eq!(
            segment.field_at(3).and_then(FieldValue::as_text),
            Some("12345")
        );
        assert!(segment.field_at(2).is_none());
    }

    #[test]
    fn test_set_replaces_value() {
        let mut segment = Segment::new("MSH");
        segment.set(10, "MessageControlID", "A").set(10, "MessageControlID", "B");
        assert!(segment.is_header());
        assert_eq!(segment.fields().len(), 1);
        assert_eq!(
            segment.get("MessageControlID").and_then(FieldValue::as_text),
            Some("B")
        );
    }
}
