//! Path navigation over decoded messages
//!
//! Paths are `/`-separated steps. The first step names a segment type with an
//! optional occurrence index (`OBX[2]`); later steps name fields or components,
//! each optionally indexing into a repetition list (`PatientName[0]`). A bare
//! `[n]` step indexes the current list.
//!
//! ```text
//! PID/PatientName[0]/FamilyName
//! OBX[1]/ObservationValue[0]
//! NK1/NK1.2/NK1.2.1
//! ```

use crate::message::Message;
use crate::node::{FieldValue, Record};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy)]
enum Location<'a> {
    Fields(&'a Record),
    Value(&'a FieldValue),
}

/// A cursor for navigating a decoded message
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    at: Location<'a>,

    /// Path to the current location (for error reporting)
    path: Vec<String>,
}

impl<'a> Cursor<'a> {
    /// Cursor on the fields of one occurrence of a segment type
    pub fn segment(message: &'a Message, code: &str, occurrence: usize) -> Result<Self> {
        let segment = message
            .segments()
            .iter()
            .filter(|s| s.code() == code)
            .nth(occurrence)
            .ok_or_else(|| Error::node_not_found(format!("{code}[{occurrence}]")))?;
        Ok(Self {
            at: Location::Fields(segment.fields()),
            path: vec![format!("{code}[{occurrence}]")],
        })
    }

    /// Cursor on a free-standing value
    pub fn new(value: &'a FieldValue, name: impl Into<String>) -> Self {
        Self {
            at: Location::Value(value),
            path: vec![name.into()],
        }
    }

    /// Resolve an absolute path starting at a segment type
    pub fn resolve(message: &'a Message, path: &str) -> Result<Self> {
        let mut steps = path.split('/').filter(|s| !s.is_empty());
        let first = steps
            .next()
            .ok_or_else(|| Error::invalid_path(path, "empty path"))?;
        let (code, index) = parse_step(path, first)?;
        if code.is_empty() {
            return Err(Error::invalid_path(path, "path must start with a segment type"));
        }
        let mut cursor = Self::segment(message, code, index.unwrap_or(0))?;
        for step in steps {
            cursor = cursor.step(path, step)?;
        }
        Ok(cursor)
    }

    /// Current value; `None` while positioned on a segment itself
    #[must_use]
    pub fn value(&self) -> Option<&'a FieldValue> {
        match self.at {
            Location::Fields(_) => None,
            Location::Value(value) => Some(value),
        }
    }

    /// Current location as a record, if it is one
    #[must_use]
    pub fn record(&self) -> Option<&'a Record> {
        match self.at {
            Location::Fields(record) => Some(record),
            Location::Value(FieldValue::Record(record)) => Some(record),
            Location::Value(_) => None,
        }
    }

    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Navigate to a named field or component
    pub fn child(&self, name: &str) -> Result<Cursor<'a>> {
        let record = match self.at {
            Location::Fields(record) => record,
            Location::Value(FieldValue::Record(record)) => record,
            Location::Value(other) => {
                return Err(Error::type_mismatch(
                    self.path.join("/"),
                    "record",
                    other.kind(),
                ));
            }
        };
        let value = record
            .get(name)
            .ok_or_else(|| Error::node_not_found(format!("{}/{}", self.path.join("/"), name)))?;
        let mut path = self.path.clone();
        path.push(name.to_string());
        Ok(Cursor {
            at: Location::Value(value),
            path,
        })
    }

    /// Navigate to one repetition of a list value
    pub fn child_at(&self, index: usize) -> Result<Cursor<'a>> {
        let items = match self.at {
            Location::Value(FieldValue::List(items)) => items,
            Location::Value(other) => {
                return Err(Error::type_mismatch(self.path.join("/"), "list", other.kind()));
            }
            Location::Fields(_) => {
                return Err(Error::type_mismatch(self.path.join("/"), "list", "segment"));
            }
        };
        let value = items
            .get(index)
            .ok_or_else(|| Error::node_not_found(format!("{}[{}]", self.path.join("/"), index)))?;
        let mut path = self.path.clone();
        path.push(format!("[{index}]"));
        Ok(Cursor {
            at: Location::Value(value),
            path,
        })
    }

    /// Navigate using a relative path (e.g., "PatientName[0]/FamilyName")
    pub fn navigate(&self, path: &str) -> Result<Cursor<'a>> {
        let mut cursor = self.clone();
        for step in path.split('/').filter(|s| !s.is_empty()) {
            cursor = cursor.step(path, step)?;
        }
        Ok(cursor)
    }

    fn step(&self, full_path: &str, step: &str) -> Result<Cursor<'a>> {
        let (name, index) = parse_step(full_path, step)?;
        let cursor = if name.is_empty() {
            self.clone()
        } else {
            self.child(name)?
        };
        match index {
            Some(index) => cursor.child_at(index),
            None => Ok(cursor),
        }
    }
}

impl Message {
    /// Value at an absolute path such as `PID/PatientName[0]/FamilyName`
    pub fn lookup(&self, path: &str) -> Result<&FieldValue> {
        let cursor = Cursor::resolve(self, path)?;
        cursor
            .value()
            .ok_or_else(|| Error::invalid_path(path, "path names a segment, not a value"))
    }
}

/// Split `name[index]` into its name and optional index
fn parse_step<'p>(path: &str, step: &'p str) -> Result<(&'p str, Option<usize>)> {
    let Some(open) = step.find('[') else {
        return Ok((step, None));
    };
    let close = step
        .find(']')
        .ok_or_else(|| Error::invalid_path(path, format!("unclosed bracket in '{step}'")))?;
    if close < open || close != step.len() - 1 {
        return Err(Error::invalid_path(
            path,
            format!("malformed index in '{step}'"),
        ));
    }
    let index = step[open + 1..close]
        .parse()
        .map_err(|_| Error::invalid_path(path, format!("invalid index in '{step}'")))?;
    Ok((&step[..open], Some(index)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;

    fn sample() -> Message {
        let name = Record::new()
            .with(1, "FamilyName", "EVERYMAN")
            .with(2, "GivenName", "ADAM");
        let pid = Segment::new("PID")
            .with_field(1, "SetID", "1")
            .with_field(5, "PatientName", vec![FieldValue::Record(name)]);
        let obx1 = Segment::new("OBX").with_field(5, "ObservationValue", vec![FieldValue::text("182")]);
        let obx2 = Segment::new("OBX").with_field(5, "ObservationValue", vec![FieldValue::text("190")]);
        Message::from_segments(vec![Segment::new("MSH"), pid, obx1, obx2])
    }

    #[test]
    fn test_lookup_nested_value() {
        let message = sample();
        let family = message.lookup("PID/PatientName[0]/FamilyName").unwrap();
        assert_eq!(family.as_text(), Some("EVERYMAN"));
    }

    #[test]
    fn test_lookup_occurrence() {
        let message = sample();
        let value = message.lookup("OBX[1]/ObservationValue[0]").unwrap();
        assert_eq!(value.as_text(), Some("190"));
    }

    #[test]
    fn test_relative_navigation() {
        let message = sample();
        let cursor = Cursor::segment(&message, "PID", 0).unwrap();
        assert!(cursor.value().is_none());
        assert!(cursor.record().is_some());

        let given = cursor.navigate("PatientName/[0]/GivenName").unwrap();
        assert_eq!(given.value().and_then(FieldValue::as_text), Some("ADAM"));
        assert_eq!(given.path().join("/"), "PID[0]/PatientName/[0]/GivenName");
    }

    #[test]
    fn test_missing_node() {
        let message = sample();
        match message.lookup("PID/PatientName[3]") {
            Err(Error::NodeNotFound { path }) => assert!(path.contains("[3]")),
            other => panic!("Expected NodeNotFound, got {other:?}"),
        }
        match message.lookup("PV1/PatientClass") {
            Err(Error::NodeNotFound { .. }) => (),
            other => panic!("Expected NodeNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_type_mismatch() {
        let message = sample();
        match message.lookup("PID/SetID/Component") {
            Err(Error::TypeMismatch { expected, found, .. }) => {
                assert_eq!(expected, "record");
                assert_eq!(found, "text");
            }
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_paths() {
        let message = sample();
        assert!(matches!(message.lookup(""), Err(Error::InvalidPath { .. })));
        assert!(matches!(message.lookup("PID[x]"), Err(Error::InvalidPath { .. })));
        assert!(matches!(message.lookup("PID[0"), Err(Error::InvalidPath { .. })));
        assert!(matches!(message.lookup("PID"), Err(Error::InvalidPath { .. })));
    }
}
