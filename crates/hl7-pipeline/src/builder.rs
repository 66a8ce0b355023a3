//! Incremental message assembly

use crate::Result;
use hl7_codec::{DelimiterSet, SegmentCodec};
use hl7_ir::{FieldValue, HEADER_SEGMENT, Message, Record, Segment};
use hl7_schema::FieldCatalog;

/// Collects segments into a pending message.
///
/// Segments keep the order they are added in. Named fields are resolved to
/// positions through the field catalog, so fields may be given in any order.
#[derive(Debug, Clone)]
pub struct MessageBuilder<'p> {
    codec: SegmentCodec<'p>,
    segments: Vec<Segment>,
}

impl<'p> MessageBuilder<'p> {
    #[must_use]
    pub fn new(catalog: &'p FieldCatalog) -> Self {
        Self {
            codec: SegmentCodec::new(catalog),
            segments: Vec::new(),
        }
    }

    /// Append a segment as is
    #[must_use]
    pub fn add_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Append a segment built from `(name, value)` pairs
    pub fn add_fields<I, S, V>(mut self, code: &str, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<FieldValue>,
    {
        let segment = self
            .codec
            .build(code, fields.into_iter().map(|(name, value)| (name, value.into())))?;
        self.segments.push(segment);
        Ok(self)
    }

    /// Append an `MSH` segment with default delimiters and the given message type
    pub fn add_header(self, message_code: &str, trigger_event: &str) -> Result<Self> {
        let delimiters = DelimiterSet::default();
        let message_type = Record::new()
            .with(1, "MessageCode", message_code)
            .with(2, "TriggerEvent", trigger_event);
        self.add_fields(
            HEADER_SEGMENT,
            [
                ("FieldSeparator", FieldValue::text(delimiters.field.to_string())),
                (
                    "EncodingCharacters",
                    FieldValue::text(delimiters.encoding_characters()),
                ),
                ("MessageType", FieldValue::Record(message_type)),
            ],
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Finish the pending message
    #[must_use]
    pub fn build(self) -> Message {
        Message::from_segments(self.segments)
    }
}
