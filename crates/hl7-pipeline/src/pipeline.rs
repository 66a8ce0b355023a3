//! Pipeline orchestration
//!
//! [`Pipeline`] owns everything the public operations share: the field catalog,
//! the schema loader with its cache, and the validation and encoding settings.

use crate::builder::MessageBuilder;
use crate::config::PipelineConfig;
use crate::{Error, Issue, Result};
use hl7_codec::json;
use hl7_codec::{MessageParser, MessageSerializer};
use hl7_ir::Message;
use hl7_schema::{ConcurrentSchemaRegistry, FieldCatalog, SchemaLoader};
use hl7_validation::{ValidationEngine, ValidationReport};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parses, validates and generates HL7 v2 messages
pub struct Pipeline {
    config: PipelineConfig,
    catalog: FieldCatalog,
    loader: SchemaLoader,
    engine: ValidationEngine,
}

impl Pipeline {
    /// Create a pipeline with its own schema cache.
    ///
    /// Catalog overlays named in the configuration are applied here.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::with_registry(config, Arc::new(ConcurrentSchemaRegistry::new()))
    }

    /// Create a pipeline with the built-in catalog and schemas only
    pub fn with_defaults() -> Result<Self> {
        Self::new(PipelineConfig::default())
    }

    /// Create a pipeline that shares a schema cache with others
    pub fn with_registry(
        config: PipelineConfig,
        registry: Arc<ConcurrentSchemaRegistry>,
    ) -> Result<Self> {
        let mut catalog = FieldCatalog::builtin()?;
        for path in &config.catalog_paths {
            debug!("Applying field catalog overlay {:?}", path);
            catalog.extend_from_file(path)?;
        }
        let loader = SchemaLoader::with_registry(registry, config.schema_paths.clone());
        let engine = ValidationEngine::with_config(config.validation);
        Ok(Self {
            config,
            catalog,
            loader,
            engine,
        })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn loader(&self) -> &SchemaLoader {
        &self.loader
    }

    /// Decode wire text
    pub fn parse_message(&self, text: &str) -> Result<Message> {
        let message = MessageParser::new(&self.catalog).parse(text)?;
        debug!(
            "Parsed {} segments ({})",
            message.len(),
            message.message_type().as_deref().unwrap_or("unknown type")
        );
        Ok(message)
    }

    /// Convert the JSON view of a message back into a message
    pub fn message_from_json(&self, value: &serde_json::Value) -> Result<Message> {
        Ok(json::message_from_json(value, &self.catalog)?)
    }

    /// Start assembling a message from segments or named fields
    #[must_use]
    pub fn builder(&self) -> MessageBuilder<'_> {
        MessageBuilder::new(&self.catalog)
    }

    /// Check a message against the schema of its type without encoding it
    pub fn validate_message(&self, message: &Message) -> Result<ValidationReport> {
        let message_type = message_type_of(message)?;
        let schema = self.loader.load(&message_type)?;
        Ok(self.engine.validate(message, &schema))
    }

    /// Validate and encode a message.
    ///
    /// The schema is loaded (once per type) from the header's message type. Every
    /// structural violation and every segment that fails to encode is reported
    /// together in [`Error::ValidationFailed`].
    pub fn generate_message(&self, message: &Message) -> Result<String> {
        let message_type = message_type_of(message)?;
        let schema = self.loader.load(&message_type)?;
        let report = self.engine.validate(message, &schema);

        let mut issues: Vec<Issue> = report
            .into_violations()
            .into_iter()
            .map(Issue::Structure)
            .collect();

        let serializer = MessageSerializer::with_options(&self.catalog, self.config.encode.clone());
        let encoded = match serializer.serialize(message) {
            Ok(text) => Some(text),
            Err(error) => {
                issues.extend(error.into_errors().into_iter().map(Issue::Encode));
                None
            }
        };

        match encoded {
            Some(text) if issues.is_empty() => {
                info!("Generated {} message ({} segments)", message_type, message.len());
                Ok(text)
            }
            _ => {
                warn!(
                    "Generation of {} message failed with {} issue(s)",
                    message_type,
                    issues.len()
                );
                Err(Error::ValidationFailed {
                    message_type,
                    issues,
                })
            }
        }
    }
}

fn message_type_of(message: &Message) -> Result<String> {
    if message.header().is_none() {
        return Err(Error::MalformedHeader("message has no MSH segment".to_string()));
    }
    message.message_type().ok_or_else(|| {
        Error::MalformedHeader("MSH-9 does not hold a message code and trigger event".to_string())
    })
}
