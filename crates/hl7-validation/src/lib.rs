#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # hl7-validation
//!
//! Structural validation of decoded HL7 v2 messages.
//!
//! A message is checked against the [`MessageSchema`](hl7_schema::MessageSchema) of
//! its type for three kinds of problems: required segments that are missing, segment
//! types the schema does not allow, and segment counts outside their occurrence
//! bounds. Every finding is collected into one [`ValidationReport`].
//!
//! ## Example Usage
//!
//! ```rust
//! use hl7_ir::{Message, Segment};
//! use hl7_schema::{MessageSchema, Occurs, SchemaElement};
//! use hl7_validation::ValidationEngine;
//!
//! let schema = MessageSchema::new(
//!     "ADT_A01",
//!     vec![
//!         SchemaElement::segment("MSH", Occurs::required()),
//!         SchemaElement::segment("PID", Occurs::required()),
//!     ],
//! );
//! let message = Message::from_segments(vec![Segment::new("MSH")]);
//!
//! let report = ValidationEngine::new().validate(&message, &schema);
//! assert!(!report.is_valid());
//! assert_eq!(report.missing_segments(), vec!["PID"]);
//! ```

pub mod engine;
pub mod reporter;

pub use engine::{BoundCombination, ValidationConfig, ValidationEngine};
pub use reporter::{ValidationReport, Violation};

use thiserror::Error;

/// Errors that stop validation before any check runs
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot determine message type: {0}")]
    MessageType(String),

    #[error("Schema error: {0}")]
    Schema(#[from] hl7_schema::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Validate a message against a schema with default settings
#[must_use]
pub fn validate(
    message: &hl7_ir::Message,
    schema: &hl7_schema::MessageSchema,
) -> ValidationReport {
    ValidationEngine::new().validate(message, schema)
}
