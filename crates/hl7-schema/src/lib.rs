//! # hl7-schema
//!
//! Schema model, loader, and registry for HL7 v2.
//!
//! Two kinds of schema data live here:
//! - the [`FieldCatalog`], which names every field and component position of the
//!   recognized segment types, and
//! - one [`MessageSchema`] per message type, a tree of segments and groups with
//!   occurrence bounds.
//!
//! Both ship embedded in the crate; message schemas can also be read from
//! configured directories through the [`SchemaLoader`].

pub mod builtin;
pub mod catalog;
pub mod groups;
pub mod loader;
pub mod model;
pub mod registry;

pub use catalog::is_segment_code;
pub use loader::SchemaLoader;
pub use model::{
    Arity, CompositeSchema, FieldCatalog, FieldDescriptor, MaxOccurs, MessageSchema, Occurs,
    SchemaElement, SegmentDefinition,
};
pub use registry::ConcurrentSchemaRegistry;

use thiserror::Error;

/// Errors that can occur when working with schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error("Schema not found: {0}")]
    NotFound(String),

    #[error("Malformed schema: {0}")]
    MalformedSchema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    pub fn not_found(message_type: impl Into<String>) -> Self {
        Self::NotFound(message_type.into())
    }

    pub fn malformed_schema(reason: impl Into<String>) -> Self {
        Self::MalformedSchema(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
