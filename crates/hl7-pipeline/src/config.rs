//! Pipeline configuration

use crate::{Error, Result};
use hl7_codec::EncodeOptions;
use hl7_validation::ValidationConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for the pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Structural validation settings
    pub validation: ValidationConfig,
    /// Line terminator and segment order for generated text
    pub encode: EncodeOptions,
    /// Directories searched for message schemas before the built-in ones
    pub schema_paths: Vec<PathBuf>,
    /// Field catalog overlays applied on top of the built-in catalog, in order
    pub catalog_paths: Vec<PathBuf>,
}

impl PipelineConfig {
    /// Read a configuration file; `.json` is parsed as JSON, anything else as YAML.
    ///
    /// Relative schema and catalog paths are taken relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let shown = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::config(&shown, e.to_string()))?;
        let mut config = if path.extension().is_some_and(|e| e == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
        .map_err(|e| match e {
            Error::Config { message, .. } => Error::config(&shown, message),
            other => other,
        })?;

        if let Some(base) = path.parent() {
            for dir in config
                .schema_paths
                .iter_mut()
                .chain(config.catalog_paths.iter_mut())
            {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
        debug!("Loaded pipeline config from {}", shown);
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::config("<yaml>", e.to_string()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config("<json>", e.to_string()))
    }

    /// Builder that appends a schema directory
    #[must_use]
    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_paths.push(path.into());
        self
    }
}
