//! Import of the JSON message view
//!
//! The JSON produced by serializing a [`Message`] maps each segment type to an
//! object (one occurrence) or an array of objects (several). Importing it resolves
//! every name back to its position through the [`FieldCatalog`], so the result can
//! be encoded again. Segment types come out grouped, in the order of the JSON keys.

use crate::segment::positional_index;
use crate::{Error, Result};
use hl7_ir::{FieldValue, HEADER_SEGMENT, Message, Record, Segment};
use hl7_schema::{CompositeSchema, FieldCatalog, is_segment_code};
use serde_json::{Map, Value};

/// Parse JSON text into a message
pub fn message_from_str(json: &str, catalog: &FieldCatalog) -> Result<Message> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| Error::Json(format!("parse error: {e}")))?;
    message_from_json(&value, catalog)
}

/// Convert a JSON value into a message
pub fn message_from_json(value: &Value, catalog: &FieldCatalog) -> Result<Message> {
    let Value::Object(groups) = value else {
        return Err(Error::Json("top level must be an object of segments".to_string()));
    };

    let mut message = Message::new();
    for (code, entry) in groups {
        if !is_segment_code(code) {
            return Err(Error::Json(format!("invalid segment type {code:?}")));
        }
        match entry {
            Value::Object(fields) => message.push(segment_from_json(code, fields, catalog)?),
            Value::Array(items) => {
                for item in items {
                    let Value::Object(fields) = item else {
                        return Err(Error::Json(format!(
                            "{code} occurrences must be objects"
                        )));
                    };
                    message.push(segment_from_json(code, fields, catalog)?);
                }
            }
            _ => {
                return Err(Error::Json(format!(
                    "{code} must be an object or an array of objects"
                )));
            }
        }
    }
    Ok(message)
}

/// Convert one JSON object into a segment of type `code`
pub fn segment_from_json(
    code: &str,
    fields: &Map<String, Value>,
    catalog: &FieldCatalog,
) -> Result<Segment> {
    let definition = catalog.segment(code);
    let mut segment = Segment::new(code);

    for (name, json) in fields {
        let position = definition
            .and_then(|d| d.position_of(name))
            .or_else(|| positional_index(code, name))
            .ok_or_else(|| Error::unknown_field(code, name.as_str()))?;

        let value = if code == HEADER_SEGMENT && position <= 2 {
            match json {
                Value::String(text) => FieldValue::text(text.as_str()),
                Value::Null => FieldValue::Null,
                _ => {
                    return Err(Error::Json(format!("{code}.{name} must be a string")));
                }
            }
        } else {
            let structure = definition
                .and_then(|d| d.field(position))
                .and_then(|descriptor| catalog.structure_of(descriptor));
            let importer = Importer { code, catalog };
            importer.value(name, &format!("{code}.{position}"), json, structure)?
        };
        segment.set(position, name.as_str(), value);
    }
    Ok(segment)
}

struct Importer<'a> {
    code: &'a str,
    catalog: &'a FieldCatalog,
}

impl Importer<'_> {
    /// `path` names the value in errors; `label` is its positional label
    fn value(
        &self,
        path: &str,
        label: &str,
        json: &Value,
        structure: Option<&CompositeSchema>,
    ) -> Result<FieldValue> {
        match json {
            Value::Null => Ok(FieldValue::Null),
            Value::String(text) => Ok(FieldValue::text(text.as_str())),
            Value::Number(n) => Ok(FieldValue::text(n.to_string())),
            Value::Bool(b) => Ok(FieldValue::text(b.to_string())),
            Value::Array(items) => items
                .iter()
                .map(|item| self.value(path, label, item, structure))
                .collect::<Result<Vec<_>>>()
                .map(FieldValue::List),
            Value::Object(entries) => {
                let mut record = Record::new();
                for (key, child) in entries {
                    let position = structure
                        .and_then(|s| s.position_of(key))
                        .or_else(|| positional_index(label, key))
                        .ok_or_else(|| Error::unknown_field(self.code, format!("{path}.{key}")))?;
                    let child_structure = structure
                        .and_then(|s| s.component(position))
                        .and_then(|descriptor| self.catalog.structure_of(descriptor));
                    let value = self.value(
                        &format!("{path}.{key}"),
                        &format!("{label}.{position}"),
                        child,
                        child_structure,
                    )?;
                    record.insert(position, key.as_str(), value);
                }
                Ok(FieldValue::Record(record))
            }
        }
    }
}
