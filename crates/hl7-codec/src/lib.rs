#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # hl7-codec
//!
//! HL7 v2 wire codec.
//!
//! Layers, bottom up:
//! - [`syntax`]: the delimiter set declared by the `MSH` header
//! - [`hierarchy`]: one field's text to and from a [`hl7_ir::ValueNode`] tree
//! - [`segment`]: one segment line to and from a named [`hl7_ir::Segment`]
//! - [`parser`] / [`serializer`]: whole messages
//! - [`json`]: the JSON view of a message back into a [`hl7_ir::Message`]
//!
//! Escape sequences (`\F\`, `\S\`, ...) are passed through untouched; a value that
//! contains a delimiter character is rejected on encode rather than escaped.

pub mod hierarchy;
pub mod json;
pub mod parser;
pub mod segment;
pub mod serializer;
pub mod syntax;

pub use parser::MessageParser;
pub use segment::SegmentCodec;
pub use serializer::{EncodeOptions, LineTerminator, MessageSerializer, SegmentOrder};
pub use syntax::DelimiterSet;

use thiserror::Error;

/// Errors that can occur when parsing/serializing HL7
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Malformed header: {reason}")]
    MalformedHeader { reason: String },

    #[error("Malformed segment at line {line}: {reason}")]
    MalformedSegment { line: usize, reason: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Cannot encode {segment}-{position}: {reason}")]
    Encode {
        segment: String,
        position: usize,
        reason: String,
    },

    #[error("Unknown field '{field}' for segment {segment}")]
    UnknownField { segment: String, field: String },

    #[error("Invalid JSON input: {0}")]
    Json(String),

    #[error("{} encoding error(s): {}", .0.len(), join_errors(.0))]
    Aggregate(Vec<Error>),
}

impl Error {
    pub fn malformed_header(reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            reason: reason.into(),
        }
    }

    pub fn malformed_segment(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedSegment {
            line,
            reason: reason.into(),
        }
    }

    pub fn encode(segment: impl Into<String>, position: usize, reason: impl Into<String>) -> Self {
        Self::Encode {
            segment: segment.into(),
            position,
            reason: reason.into(),
        }
    }

    pub fn unknown_field(segment: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            segment: segment.into(),
            field: field.into(),
        }
    }

    /// The individual errors, flattening an aggregate
    #[must_use]
    pub fn into_errors(self) -> Vec<Error> {
        match self {
            Self::Aggregate(errors) => errors,
            other => vec![other],
        }
    }
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
