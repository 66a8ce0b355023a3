#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # hl7-pipeline
//!
//! The public operations on HL7 v2 messages: parse wire text, build a message
//! from named fields, validate it against the schema of its type, and generate
//! wire text from it.
//!
//! ```rust
//! use hl7_pipeline::Pipeline;
//!
//! let pipeline = Pipeline::with_defaults().unwrap();
//! let message = pipeline
//!     .parse_message("MSH|^~\\&|APP|FAC|||20240101||ADT^A04|1|P|2.5\rEVN|A04\rPID|1\rPV1|1|O")
//!     .unwrap();
//! assert_eq!(message.message_type().as_deref(), Some("ADT_A04"));
//!
//! let text = pipeline.generate_message(&message).unwrap();
//! assert!(text.starts_with("MSH|^~\\&|APP|FAC"));
//! ```

pub mod builder;
pub mod config;
pub mod pipeline;

pub use builder::MessageBuilder;
pub use config::PipelineConfig;
pub use pipeline::Pipeline;

use hl7_validation::Violation;
use std::fmt;
use thiserror::Error;

/// One reason a message could not be generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// Structural problem found by the validator
    Structure(Violation),
    /// A segment that could not be encoded
    Encode(hl7_codec::Error),
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structure(violation) => violation.fmt(f),
            Self::Encode(error) => error.fmt(f),
        }
    }
}

/// Errors that can occur in the pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error(transparent)]
    Codec(#[from] hl7_codec::Error),

    #[error(transparent)]
    Schema(#[from] hl7_schema::Error),

    #[error("Validation failed for {message_type}: {}", join_issues(.issues))]
    ValidationFailed {
        message_type: String,
        issues: Vec<Issue>,
    },

    #[error("Config error for '{path}': {message}")]
    Config { path: String, message: String },
}

impl Error {
    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Issues of a `ValidationFailed` error; empty for every other kind
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        match self {
            Self::ValidationFailed { issues, .. } => issues,
            _ => &[],
        }
    }
}

fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
