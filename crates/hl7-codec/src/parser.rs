//! HL7 message parser

use crate::segment::SegmentCodec;
use crate::syntax::DelimiterSet;
use crate::{Error, Result};
use hl7_ir::{HEADER_SEGMENT, Message};
use hl7_schema::FieldCatalog;
use tracing::{debug, trace};

/// Parser for complete HL7 messages
#[derive(Debug, Clone, Copy)]
pub struct MessageParser<'c> {
    codec: SegmentCodec<'c>,
}

impl<'c> MessageParser<'c> {
    /// Create a parser that names fields from `catalog`
    #[must_use]
    pub fn new(catalog: &'c FieldCatalog) -> Self {
        Self {
            codec: SegmentCodec::new(catalog),
        }
    }

    /// Parse wire text into a message.
    ///
    /// Segments may be terminated by `\r`, `\n` or `\r\n`; blank lines are skipped.
    /// The first line starting with `MSH` declares the delimiters for every line.
    pub fn parse(&self, text: &str) -> Result<Message> {
        let lines = split_lines(text);

        let (header_line, header) = lines
            .iter()
            .find(|(_, line)| is_header_line(line))
            .ok_or_else(|| Error::malformed_header(format!("no {HEADER_SEGMENT} segment found")))?;
        let ds = DelimiterSet::from_header(header).map_err(|e| match e {
            Error::MalformedHeader { reason } => {
                Error::malformed_header(format!("line {header_line}: {reason}"))
            }
            other => other,
        })?;
        debug!(
            "Detected delimiters on line {}: field {:?}, encoding {:?}",
            header_line,
            ds.field,
            ds.encoding_characters()
        );

        let mut message = Message::new();
        for (number, line) in &lines {
            let mut parts = line.split(ds.field);
            let code = parts.next().unwrap_or_default();
            if !hl7_schema::is_segment_code(code) {
                return Err(Error::malformed_segment(
                    *number,
                    format!("invalid segment type {code:?}"),
                ));
            }
            let raw_fields: Vec<&str> = parts.collect();
            trace!("Line {}: {} with {} fields", number, code, raw_fields.len());
            message.push(self.codec.decode(code, &raw_fields, &ds));
        }

        debug!(
            "Parsed message with {} segments ({} types)",
            message.len(),
            message.segment_types().len()
        );
        Ok(message)
    }
}

/// True if the line's type code is exactly `MSH`; the field separator is not known yet
fn is_header_line(line: &str) -> bool {
    line.strip_prefix(HEADER_SEGMENT)
        .is_some_and(|rest| rest.chars().next().is_none_or(|c| !c.is_ascii_alphanumeric()))
}

/// Non-blank lines with their 1-based line numbers
fn split_lines(text: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    let mut number = 0;
    let mut rest = text;
    while !rest.is_empty() {
        number += 1;
        let (line, next) = match rest.find(['\r', '\n']) {
            Some(end) => {
                let skip = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                (&rest[..end], &rest[end + skip..])
            }
            None => (rest, ""),
        };
        if !line.trim().is_empty() {
            lines.push((number, line));
        }
        rest = next;
    }
    lines
}
