//! Field catalog loading and validation

use crate::model::{Arity, CompositeSchema, FieldCatalog, FieldDescriptor, SegmentDefinition};
use crate::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Built-in catalog data
const BUILTIN_CATALOG: &str = include_str!("../data/fields.yaml");

/// Serializable catalog format for loading from files
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    composites: BTreeMap<String, Vec<EntryFile>>,
    #[serde(default)]
    segments: BTreeMap<String, Vec<EntryFile>>,
}

/// A field entry is either a bare name or a map with optional type and arity
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntryFile {
    Name(String),
    Detailed {
        name: String,
        #[serde(rename = "type", default)]
        structure: Option<String>,
        #[serde(default)]
        repeated: bool,
    },
}

impl From<EntryFile> for FieldDescriptor {
    fn from(entry: EntryFile) -> Self {
        match entry {
            EntryFile::Name(name) => FieldDescriptor::new(name),
            EntryFile::Detailed {
                name,
                structure,
                repeated,
            } => FieldDescriptor {
                name,
                arity: if repeated { Arity::Repeated } else { Arity::Single },
                structure,
            },
        }
    }
}

static SEGMENT_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9]{2}$").expect("segment code pattern compiles"));

/// True if `code` has the shape of a segment type code
#[must_use]
pub fn is_segment_code(code: &str) -> bool {
    SEGMENT_CODE_RE.is_match(code)
}

impl FieldCatalog {
    /// The catalog embedded in this crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Parse and validate a catalog from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let catalog = Self::from_file_format(parse_yaml(yaml)?)?;
        catalog.check_references()?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog = Self::from_file_format(parse_json(json)?)?;
        catalog.check_references()?;
        Ok(catalog)
    }

    /// Merge an overlay catalog file into this one.
    ///
    /// Definitions in the file replace existing ones with the same name, and the
    /// file may reference composite types defined here. `.json` is read as JSON,
    /// anything else as YAML.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<()> {
        trace!("Loading field catalog overlay from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let file = if path.extension().is_some_and(|e| e == "json") {
            parse_json(&content)?
        } else {
            parse_yaml(&content)?
        };
        self.extend(Self::from_file_format(file)?)
    }

    /// Add or replace the definitions of `other`.
    ///
    /// The merged catalog is checked before it replaces this one; on error this
    /// catalog is unchanged.
    pub fn extend(&mut self, other: FieldCatalog) -> Result<()> {
        let mut merged = self.clone();
        merged.composites.extend(other.composites);
        merged.segments.extend(other.segments);
        merged.check_references()?;
        *self = merged;
        Ok(())
    }

    fn from_file_format(file: CatalogFile) -> Result<Self> {
        let mut catalog = FieldCatalog::new();

        for (name, entries) in file.composites {
            let components: Vec<FieldDescriptor> = entries.into_iter().map(Into::into).collect();
            check_unique_names(&name, &components)?;
            catalog
                .composites
                .insert(name.clone(), CompositeSchema { name, components });
        }

        for (code, entries) in file.segments {
            if !is_segment_code(&code) {
                return Err(Error::malformed_schema(format!(
                    "invalid segment code '{code}' in field catalog"
                )));
            }
            let fields: Vec<FieldDescriptor> = entries.into_iter().map(Into::into).collect();
            check_unique_names(&code, &fields)?;
            catalog
                .segments
                .insert(code.clone(), SegmentDefinition { code, fields });
        }

        debug!(
            "Loaded field catalog: {} segments, {} composites",
            catalog.segments.len(),
            catalog.composites.len()
        );
        Ok(catalog)
    }

    fn check_references(&self) -> Result<()> {
        let owners = self
            .segments
            .values()
            .map(|s| (s.code.as_str(), s.fields.as_slice()))
            .chain(
                self.composites
                    .values()
                    .map(|c| (c.name.as_str(), c.components.as_slice())),
            );
        for (owner, descriptors) in owners {
            for descriptor in descriptors {
                if let Some(structure) = &descriptor.structure {
                    if !self.composites.contains_key(structure) {
                        return Err(Error::malformed_schema(format!(
                            "{owner}.{} references unknown composite type '{structure}'",
                            descriptor.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_yaml(yaml: &str) -> Result<CatalogFile> {
    serde_yaml::from_str(yaml).map_err(|e| Error::Parse(format!("YAML parse error: {e}")))
}

fn parse_json(json: &str) -> Result<CatalogFile> {
    serde_json::from_str(json).map_err(|e| Error::Parse(format!("JSON parse error: {e}")))
}

fn check_unique_names(owner: &str, descriptors: &[FieldDescriptor]) -> Result<()> {
    let mut seen = HashSet::new();
    for descriptor in descriptors {
        if descriptor.name.is_empty() {
            return Err(Error::malformed_schema(format!("{owner} has an unnamed entry")));
        }
        if !seen.insert(descriptor.name.as_str()) {
            return Err(Error::malformed_schema(format!(
                "{owner} declares '{}' more than once",
                descriptor.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = FieldCatalog::builtin().unwrap();

        let pid = catalog.segment("PID").unwrap();
        assert_eq!(pid.position_of("PatientName"), Some(5));
        let name = pid.field(5).unwrap();
        assert!(name.is_repeated());
        assert_eq!(name.structure.as_deref(), Some("XPN"));
        assert_eq!(
            catalog.composite("XPN").and_then(|c| c.position_of("FamilyName")),
            Some(1)
        );

        let msh = catalog.segment("MSH").unwrap();
        assert_eq!(msh.position_of("FieldSeparator"), Some(1));
        assert_eq!(msh.position_of("EncodingCharacters"), Some(2));
        assert_eq!(msh.position_of("MessageType"), Some(9));
        let msg = catalog.structure_of(msh.field(9).unwrap()).unwrap();
        assert_eq!(msg.position_of("TriggerEvent"), Some(2));

        assert!(catalog.segment("NK1").is_none());
    }

    #[test]
    fn test_builtin_catalog_covers_segments() {
        let catalog = FieldCatalog::builtin().unwrap();
        for code in [
            "MSH", "EVN", "PID", "PV1", "GT1", "IN1", "IN2", "IN3", "DG1", "SCH", "RGS", "AIG",
            "AIL", "AIP", "FT1", "PR1", "ROL", "QRD", "MSA", "MFI", "MFE", "STF", "PRA", "ORC",
            "OBR", "OBX",
        ] {
            assert!(catalog.segment(code).is_some(), "missing {code}");
        }
    }

    #[test]
    fn test_entry_forms() {
        let yaml = r"
composites:
  HD:
    - NamespaceID
    - UniversalID
segments:
  ZAB:
    - SetID
    - { name: Facility, type: HD, repeated: true }
";
        let catalog = FieldCatalog::from_yaml(yaml).unwrap();
        let zab = catalog.segment("ZAB").unwrap();
        assert_eq!(zab.field(1), Some(&FieldDescriptor::new("SetID")));
        assert_eq!(
            zab.field(2),
            Some(&FieldDescriptor::new("Facility").with_structure("HD").repeated())
        );
    }

    #[test]
    fn test_unknown_composite_reference() {
        let yaml = "segments:\n  ZAB:\n    - { name: Facility, type: NOPE }\n";
        match FieldCatalog::from_yaml(yaml) {
            Err(Error::MalformedSchema(msg)) => assert!(msg.contains("NOPE")),
            other => panic!("Expected MalformedSchema, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_segment_code() {
        let yaml = "segments:\n  zab1:\n    - SetID\n";
        assert!(matches!(
            FieldCatalog::from_yaml(yaml),
            Err(Error::MalformedSchema(_))
        ));
        assert!(is_segment_code("ZAB"));
        assert!(is_segment_code("PV1"));
        assert!(!is_segment_code("1AB"));
        assert!(!is_segment_code("MSHX"));
    }

    #[test]
    fn test_duplicate_names() {
        let yaml = "segments:\n  ZAB:\n    - SetID\n    - SetID\n";
        match FieldCatalog::from_yaml(yaml) {
            Err(Error::MalformedSchema(msg)) => assert!(msg.contains("more than once")),
            other => panic!("Expected MalformedSchema, got {other:?}"),
        }
    }

    #[test]
    fn test_overlay_file_uses_builtin_composites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nk1.yaml");
        std::fs::write(
            &path,
            "segments:\n  NK1:\n    - SetIDNK1\n    - { name: NKName, type: XPN, repeated: true }\n",
        )
        .unwrap();

        let mut catalog = FieldCatalog::builtin().unwrap();
        catalog.extend_from_file(&path).unwrap();
        let nk1 = catalog.segment("NK1").unwrap();
        assert_eq!(nk1.position_of("NKName"), Some(2));
        assert_eq!(nk1.field(2).and_then(|f| f.structure.as_deref()), Some("XPN"));

        // On its own the overlay does not resolve
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(matches!(
            FieldCatalog::from_yaml(&content),
            Err(Error::MalformedSchema(_))
        ));
    }

    #[test]
    fn test_failed_extend_leaves_catalog_unchanged() {
        let mut catalog = FieldCatalog::builtin().unwrap();
        let before = catalog.clone();

        let mut overlay = FieldCatalog::new();
        overlay.segments.insert(
            "PID".to_string(),
            SegmentDefinition {
                code: "PID".to_string(),
                fields: vec![FieldDescriptor::new("SetID").with_structure("NOPE")],
            },
        );
        overlay.segments.insert(
            "ZAB".to_string(),
            SegmentDefinition {
                code: "ZAB".to_string(),
                fields: vec![FieldDescriptor::new("SetID")],
            },
        );

        assert!(matches!(catalog.extend(overlay), Err(Error::MalformedSchema(_))));
        assert_eq!(catalog, before);
        assert!(catalog.segment("ZAB").is_none());
    }
}
