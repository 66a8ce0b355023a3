#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # hl7-ir
//!
//! Intermediate Representation structures and traversal APIs for HL7 v2 messages.
//!
//! Two trees live here. [`ValueNode`] is the raw delimiter tree the hierarchy
//! codec produces from a single field (leaf, composite, repetition). [`FieldValue`]
//! and [`Record`] are the named view the segment codec builds on top of it, where
//! every entry carries its wire position so that output order never depends on
//! how a record was assembled.

/// Message container and the per-type grouping view.
pub mod message;
/// Raw value trees and named, position-keyed records.
pub mod node;
/// Segment records.
pub mod segment;
/// Path-based navigation over decoded messages.
pub mod traversal;

pub use message::{Message, SegmentEntry};
pub use node::{Entry, FieldValue, Record, ValueNode};
pub use segment::{HEADER_SEGMENT, Segment};
pub use traversal::Cursor;

use thiserror::Error;

/// Errors that can occur when working with the IR
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Node not found at path: {path}")]
    NodeNotFound { path: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },
}

impl Error {
    /// Build a node-not-found error with path context.
    pub fn node_not_found(path: impl Into<String>) -> Self {
        Self::NodeNotFound { path: path.into() }
    }

    /// Build an invalid-path error with input path and parsing reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a type-mismatch error for a value reached while navigating.
    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Crate-local result type for IR operations.
pub type Result<T> = std::result::Result<T, Error>;
