//! HL7 message serializer

use crate::segment::SegmentCodec;
use crate::syntax::DelimiterSet;
use crate::{Error, Result};
use hl7_ir::{FieldValue, Message, Segment};
use hl7_schema::FieldCatalog;
use serde::Deserialize;
use tracing::{debug, warn};

/// Order in which segments are written
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentOrder {
    /// Exactly the order the segments were added or parsed
    #[default]
    AsReceived,
    /// Types in order of first appearance, all occurrences of a type together
    Grouped,
    /// Types in the listed order; every present type must be listed exactly once
    Explicit(Vec<String>),
}

/// Segment terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    #[default]
    Cr,
    Lf,
    CrLf,
}

impl LineTerminator {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cr => "\r",
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Options for [`MessageSerializer`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    pub line_terminator: LineTerminator,
    pub order: SegmentOrder,
}

impl EncodeOptions {
    #[must_use]
    pub fn with_order(mut self, order: SegmentOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn with_line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.line_terminator = terminator;
        self
    }
}

/// Serializer for complete HL7 messages
#[derive(Debug, Clone)]
pub struct MessageSerializer<'c> {
    codec: SegmentCodec<'c>,
    options: EncodeOptions,
}

impl<'c> MessageSerializer<'c> {
    #[must_use]
    pub fn new(catalog: &'c FieldCatalog) -> Self {
        Self::with_options(catalog, EncodeOptions::default())
    }

    #[must_use]
    pub fn with_options(catalog: &'c FieldCatalog, options: EncodeOptions) -> Self {
        Self {
            codec: SegmentCodec::new(catalog),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encode every segment and join them with the line terminator.
    ///
    /// Every segment is attempted; if any fail, all failures come back together
    /// as [`Error::Aggregate`].
    pub fn serialize(&self, message: &Message) -> Result<String> {
        let ds = delimiters_of(message)?;
        let segments = self.ordered(message)?;

        let mut lines = Vec::with_capacity(segments.len());
        let mut errors = Vec::new();
        for segment in segments {
            match self.codec.encode(segment, &ds) {
                Ok(line) => lines.push(line),
                Err(e) => {
                    warn!("Failed to encode {} segment: {}", segment.code(), e);
                    errors.push(e);
                }
            }
        }
        if !errors.is_empty() {
            return Err(Error::Aggregate(errors));
        }

        debug!("Serialized {} segments", lines.len());
        Ok(lines.join(self.options.line_terminator.as_str()))
    }

    fn ordered<'m>(&self, message: &'m Message) -> Result<Vec<&'m Segment>> {
        match &self.options.order {
            SegmentOrder::AsReceived => Ok(message.segments().iter().collect()),
            SegmentOrder::Grouped => Ok(message
                .groups()
                .into_iter()
                .flat_map(|(_, entry)| entry.segments())
                .collect()),
            SegmentOrder::Explicit(order) => {
                let mut errors: Vec<Error> = message
                    .segment_types()
                    .into_iter()
                    .filter(|code| !order.iter().any(|listed| listed.as_str() == *code))
                    .map(|code| Error::encode(code, 0, "segment type missing from explicit order"))
                    .collect();
                // One error per repeated type, at its second listing
                for (index, code) in order.iter().enumerate() {
                    if order[..index].iter().filter(|listed| *listed == code).count() == 1 {
                        errors.push(Error::encode(code.as_str(), 0, "listed more than once"));
                    }
                }
                if !errors.is_empty() {
                    return Err(Error::Aggregate(errors));
                }
                Ok(order
                    .iter()
                    .filter_map(|code| message.get(code))
                    .flat_map(|entry| entry.segments())
                    .collect())
            }
        }
    }
}

/// Delimiters declared by the header's first two fields, defaults otherwise
pub fn delimiters_of(message: &Message) -> Result<DelimiterSet> {
    let Some(header) = message.header() else {
        return Ok(DelimiterSet::default());
    };
    let defaults = DelimiterSet::default();
    let field = match header.field_at(1) {
        Some(FieldValue::Text(text)) if !text.is_empty() => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(Error::malformed_header(format!(
                        "field separator must be one character, found {text:?}"
                    )));
                }
            }
        }
        _ => defaults.field,
    };
    match header.field_at(2) {
        Some(FieldValue::Text(text)) if !text.is_empty() => DelimiterSet::from_parts(field, text),
        _ => DelimiterSet::new(
            field,
            defaults.component,
            defaults.repetition,
            defaults.escape,
            defaults.subcomponent,
        ),
    }
}
