//! Message schema loader

use crate::builtin;
use crate::catalog::is_segment_code;
use crate::groups::GroupGraph;
use crate::model::{MaxOccurs, MessageSchema, Occurs, SchemaElement};
use crate::registry::ConcurrentSchemaRegistry;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// One named definition (the message root or a group) in a schema file
#[derive(Debug, Deserialize)]
struct DefinitionFile {
    #[serde(default)]
    elements: Option<ElementsFile>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ElementsFile {
    List(Vec<ElementFile>),
    Other(serde::de::IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ElementFile {
    #[serde(default)]
    segment: Option<String>,
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    min_occurs: Option<OccursValue>,
    #[serde(default)]
    max_occurs: Option<OccursValue>,
}

/// Occurrence values appear both as strings ("1", "unbounded") and as numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OccursValue {
    Number(u64),
    Text(String),
}

impl OccursValue {
    fn to_min(&self, owner: &str) -> Result<u32> {
        match self.to_max(owner)? {
            MaxOccurs::Bounded(min) => Ok(min),
            MaxOccurs::Unbounded => Err(Error::malformed_schema(format!(
                "{owner}: minOccurs cannot be unbounded"
            ))),
        }
    }

    fn to_max(&self, owner: &str) -> Result<MaxOccurs> {
        let invalid = || Error::malformed_schema(format!("{owner}: invalid occurrence value {self:?}"));
        match self {
            Self::Number(n) => u32::try_from(*n).map(MaxOccurs::Bounded).map_err(|_| invalid()),
            Self::Text(text) if text.trim() == "unbounded" => Ok(MaxOccurs::Unbounded),
            Self::Text(text) => text
                .trim()
                .parse::<u32>()
                .map(MaxOccurs::Bounded)
                .map_err(|_| invalid()),
        }
    }
}

/// Loads message schemas by type, caching them in a shared registry.
///
/// Lookup order: registry, then each configured directory
/// (`<TYPE>.json`, `<TYPE>.yaml`, `<TYPE>.yml`), then the built-in schemas.
pub struct SchemaLoader {
    registry: Arc<ConcurrentSchemaRegistry>,
    schema_paths: Vec<PathBuf>,
}

impl SchemaLoader {
    /// Create a new schema loader with the given search paths
    #[must_use]
    pub fn new(schema_paths: Vec<PathBuf>) -> Self {
        Self {
            registry: Arc::new(ConcurrentSchemaRegistry::new()),
            schema_paths,
        }
    }

    /// Create a new schema loader with a pre-configured registry
    #[must_use]
    pub fn with_registry(
        registry: Arc<ConcurrentSchemaRegistry>,
        schema_paths: Vec<PathBuf>,
    ) -> Self {
        Self {
            registry,
            schema_paths,
        }
    }

    /// Load the schema for a message type such as `ADT_A01`
    pub fn load(&self, message_type: &str) -> Result<Arc<MessageSchema>> {
        if let Some(cached) = self.registry.get(message_type) {
            debug!("Cache hit for schema: {}", message_type);
            return Ok(cached);
        }

        trace!("Cache miss for schema: {}", message_type);
        self.registry
            .get_or_try_load(message_type, || self.load_uncached(message_type))
    }

    /// Load a schema from a specific file path
    pub fn load_from_file(&self, message_type: &str, path: &Path) -> Result<MessageSchema> {
        trace!("Loading schema from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            self.load_from_yaml(message_type, &content)
        } else {
            self.load_from_json(message_type, &content)
        }
    }

    /// Load a schema from a JSON document
    pub fn load_from_json(&self, message_type: &str, json: &str) -> Result<MessageSchema> {
        let definitions: BTreeMap<String, DefinitionFile> = serde_json::from_str(json)
            .map_err(|e| Error::Parse(format!("JSON parse error: {e}")))?;
        resolve(message_type, &definitions)
    }

    /// Load a schema from a YAML document
    pub fn load_from_yaml(&self, message_type: &str, yaml: &str) -> Result<MessageSchema> {
        let definitions: BTreeMap<String, DefinitionFile> = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Parse(format!("YAML parse error: {e}")))?;
        resolve(message_type, &definitions)
    }

    fn load_uncached(&self, message_type: &str) -> Result<MessageSchema> {
        if message_type.is_empty()
            || !message_type
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::not_found(message_type));
        }

        for dir in &self.schema_paths {
            for extension in ["json", "yaml", "yml"] {
                let file_path = dir.join(format!("{message_type}.{extension}"));
                if file_path.is_file() {
                    info!("Loading schema {} from {:?}", message_type, file_path);
                    return self.load_from_file(message_type, &file_path);
                }
            }
        }

        match builtin::source(message_type) {
            Some(json) => {
                info!("Loading built-in schema: {}", message_type);
                self.load_from_json(message_type, json)
            }
            None => Err(Error::NotFound(format!(
                "{message_type} (searched built-ins and {:?})",
                self.schema_paths
            ))),
        }
    }

    /// Add a search path for schema files
    pub fn add_path(&mut self, path: PathBuf) {
        self.schema_paths.push(path);
    }

    #[must_use]
    pub fn schema_paths(&self) -> &[PathBuf] {
        &self.schema_paths
    }

    /// Get the registry (for testing/debugging)
    #[must_use]
    pub fn registry(&self) -> &ConcurrentSchemaRegistry {
        &self.registry
    }
}

impl Default for SchemaLoader {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Turn the flat definition map into a group tree rooted at `message_type`
fn resolve(
    message_type: &str,
    definitions: &BTreeMap<String, DefinitionFile>,
) -> Result<MessageSchema> {
    let root = definitions.get(message_type).ok_or_else(|| {
        Error::malformed_schema(format!("document has no definition for {message_type}"))
    })?;
    let mut graph = GroupGraph::new();
    let elements = resolve_elements(message_type, root, definitions, &mut graph)?;
    debug!(
        "Resolved schema {} with {} root elements",
        message_type,
        elements.len()
    );
    Ok(MessageSchema::new(message_type, elements))
}

fn resolve_elements(
    owner: &str,
    definition: &DefinitionFile,
    definitions: &BTreeMap<String, DefinitionFile>,
    graph: &mut GroupGraph,
) -> Result<Vec<SchemaElement>> {
    let Some(ElementsFile::List(entries)) = &definition.elements else {
        return Err(Error::malformed_schema(format!(
            "{owner}: 'elements' must be an array"
        )));
    };

    let mut elements = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let location = format!("{owner}.elements[{index}]");
        let occurs = parse_occurs(&location, entry)?;

        match (&entry.segment, &entry.group) {
            (Some(segment), None) => {
                if !is_segment_code(segment) {
                    return Err(Error::malformed_schema(format!(
                        "{location}: invalid segment code '{segment}'"
                    )));
                }
                elements.push(SchemaElement::segment(segment.as_str(), occurs));
            }
            (None, Some(group)) => {
                if graph.would_create_cycle(owner, group) {
                    return Err(Error::malformed_schema(format!(
                        "circular group reference: {owner} -> {group}"
                    )));
                }
                graph.add_edge(owner, group.as_str());
                let child = definitions.get(group).ok_or_else(|| {
                    Error::malformed_schema(format!("{location}: unknown group '{group}'"))
                })?;
                let children = resolve_elements(group, child, definitions, graph)?;
                elements.push(SchemaElement::group(group.as_str(), occurs, children));
            }
            (Some(_), Some(_)) => {
                return Err(Error::malformed_schema(format!(
                    "{location}: element has both 'segment' and 'group'"
                )));
            }
            (None, None) => {
                return Err(Error::malformed_schema(format!(
                    "{location}: element has neither 'segment' nor 'group'"
                )));
            }
        }
    }
    Ok(elements)
}

/// Absent bounds default to exactly one
fn parse_occurs(location: &str, entry: &ElementFile) -> Result<Occurs> {
    let min = match &entry.min_occurs {
        Some(value) => value.to_min(location)?,
        None => 1,
    };
    let max = match &entry.max_occurs {
        Some(value) => value.to_max(location)?,
        None => MaxOccurs::Bounded(1),
    };
    if let MaxOccurs::Bounded(max) = max {
        if min > max {
            return Err(Error::malformed_schema(format!(
                "{location}: minOccurs {min} exceeds maxOccurs {max}"
            )));
        }
    }
    Ok(Occurs::new(min, max))
}
