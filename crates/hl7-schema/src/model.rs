//! Schema model structures

use std::collections::BTreeMap;
use std::fmt;

/// Whether a field position holds one value or a repetition list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arity {
    #[default]
    Single,
    Repeated,
}

/// Descriptor for one field or component position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Semantic name (e.g., "PatientName")
    pub name: String,
    pub arity: Arity,
    /// Name of the composite type describing the components, if any
    pub structure: Option<String>,
}

impl FieldDescriptor {
    /// Single, unstructured field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arity: Arity::Single,
            structure: None,
        }
    }

    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.arity = Arity::Repeated;
        self
    }

    #[must_use]
    pub fn with_structure(mut self, composite: impl Into<String>) -> Self {
        self.structure = Some(composite.into());
        self
    }

    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.arity == Arity::Repeated
    }
}

/// Ordered component layout of a composite data type (e.g., XPN)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeSchema {
    pub name: String,
    pub components: Vec<FieldDescriptor>,
}

impl CompositeSchema {
    /// Descriptor at a 1-based component position
    #[must_use]
    pub fn component(&self, position: usize) -> Option<&FieldDescriptor> {
        position.checked_sub(1).and_then(|i| self.components.get(i))
    }

    /// 1-based position of a named component
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name == name).map(|i| i + 1)
    }
}

/// Field layout of one segment type; `fields[n - 1]` describes field n
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDefinition {
    pub code: String,
    pub fields: Vec<FieldDescriptor>,
}

impl SegmentDefinition {
    /// Descriptor at a 1-based field position
    #[must_use]
    pub fn field(&self, position: usize) -> Option<&FieldDescriptor> {
        position.checked_sub(1).and_then(|i| self.fields.get(i))
    }

    /// 1-based position of a named field
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name).map(|i| i + 1)
    }
}

/// Field-name tables for every recognized segment type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCatalog {
    pub segments: BTreeMap<String, SegmentDefinition>,
    pub composites: BTreeMap<String, CompositeSchema>,
}

impl FieldCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn segment(&self, code: &str) -> Option<&SegmentDefinition> {
        self.segments.get(code)
    }

    #[must_use]
    pub fn composite(&self, name: &str) -> Option<&CompositeSchema> {
        self.composites.get(name)
    }

    /// Composite layout referenced by a descriptor
    #[must_use]
    pub fn structure_of(&self, descriptor: &FieldDescriptor) -> Option<&CompositeSchema> {
        descriptor
            .structure
            .as_deref()
            .and_then(|name| self.composite(name))
    }
}

/// Upper occurrence bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    /// True if `count` does not exceed the bound
    #[must_use]
    pub fn allows(self, count: usize) -> bool {
        match self {
            Self::Bounded(max) => count <= max as usize,
            Self::Unbounded => true,
        }
    }

    /// The tighter of two bounds
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        match (self, other) {
            (Self::Bounded(a), Self::Bounded(b)) => Self::Bounded(a.min(b)),
            (Self::Bounded(a), Self::Unbounded) | (Self::Unbounded, Self::Bounded(a)) => {
                Self::Bounded(a)
            }
            (Self::Unbounded, Self::Unbounded) => Self::Unbounded,
        }
    }

    /// The looser of two bounds
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        match (self, other) {
            (Self::Bounded(a), Self::Bounded(b)) => Self::Bounded(a.max(b)),
            _ => Self::Unbounded,
        }
    }

    /// Product of two bounds; zero wins over unbounded
    #[must_use]
    pub fn times(self, other: Self) -> Self {
        match (self, other) {
            (Self::Bounded(0), _) | (_, Self::Bounded(0)) => Self::Bounded(0),
            (Self::Bounded(a), Self::Bounded(b)) => a
                .checked_mul(b)
                .map_or(Self::Unbounded, Self::Bounded),
            _ => Self::Unbounded,
        }
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(max) => write!(f, "{max}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Occurrence bounds of a schema element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurs {
    pub min: u32,
    pub max: MaxOccurs,
}

impl Occurs {
    #[must_use]
    pub fn new(min: u32, max: MaxOccurs) -> Self {
        Self { min, max }
    }

    /// Exactly once
    #[must_use]
    pub fn required() -> Self {
        Self::new(1, MaxOccurs::Bounded(1))
    }

    /// Zero or one
    #[must_use]
    pub fn optional() -> Self {
        Self::new(0, MaxOccurs::Bounded(1))
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.min >= 1
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.min, self.max)
    }
}

/// One node of a message structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaElement {
    Segment {
        name: String,
        occurs: Occurs,
    },
    Group {
        name: String,
        occurs: Occurs,
        elements: Vec<SchemaElement>,
    },
}

impl SchemaElement {
    pub fn segment(name: impl Into<String>, occurs: Occurs) -> Self {
        Self::Segment {
            name: name.into(),
            occurs,
        }
    }

    pub fn group(name: impl Into<String>, occurs: Occurs, elements: Vec<SchemaElement>) -> Self {
        Self::Group {
            name: name.into(),
            occurs,
            elements,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Segment { name, .. } | Self::Group { name, .. } => name,
        }
    }

    #[must_use]
    pub fn occurs(&self) -> Occurs {
        match self {
            Self::Segment { occurs, .. } | Self::Group { occurs, .. } => *occurs,
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }
}

/// Resolved structure of one message type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSchema {
    /// Type identifier, e.g. `ADT_A01`
    pub message_type: String,
    /// Root elements in declaration order
    pub elements: Vec<SchemaElement>,
}

impl MessageSchema {
    pub fn new(message_type: impl Into<String>, elements: Vec<SchemaElement>) -> Self {
        Self {
            message_type: message_type.into(),
            elements,
        }
    }

    /// Find a group anywhere in the tree by name
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&SchemaElement> {
        fn find<'a>(elements: &'a [SchemaElement], name: &str) -> Option<&'a SchemaElement> {
            elements.iter().find_map(|element| match element {
                SchemaElement::Group { name: group, elements, .. } => {
                    if group == name {
                        Some(element)
                    } else {
                        find(elements, name)
                    }
                }
                SchemaElement::Segment { .. } => None,
            })
        }
        find(&self.elements, name)
    }

    /// Every segment type referenced anywhere in the tree, in first-declaration order
    #[must_use]
    pub fn segment_names(&self) -> Vec<&str> {
        fn collect<'a>(elements: &'a [SchemaElement], names: &mut Vec<&'a str>) {
            for element in elements {
                match element {
                    SchemaElement::Segment { name, .. } => {
                        if !names.contains(&name.as_str()) {
                            names.push(name);
                        }
                    }
                    SchemaElement::Group { elements, .. } => collect(elements, names),
                }
            }
        }
        let mut names = Vec::new();
        collect(&self.elements, &mut names);
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_occurs_combinations() {
        let one = MaxOccurs::Bounded(1);
        let five = MaxOccurs::Bounded(5);
        let many = MaxOccurs::Unbounded;

        assert_eq!(one.min(many), one);
        assert_eq!(five.min(one), one);
        assert_eq!(one.max(many), many);
        assert_eq!(five.max(one), five);
        assert_eq!(five.times(MaxOccurs::Bounded(3)), MaxOccurs::Bounded(15));
        assert_eq!(one.times(many), many);
        assert_eq!(MaxOccurs::Bounded(0).times(many), MaxOccurs::Bounded(0));
        assert!(many.allows(10_000));
        assert!(!five.allows(6));
    }

    #[test]
    fn test_occurs_display() {
        assert_eq!(Occurs::required().to_string(), "[1..1]");
        assert_eq!(Occurs::new(0, MaxOccurs::Unbounded).to_string(), "[0..unbounded]");
    }

    #[test]
    fn test_segment_definition_positions() {
        let pid = SegmentDefinition {
            code: "PID".to_string(),
            fields: vec![
                FieldDescriptor::new("SetID"),
                FieldDescriptor::new("PatientID").with_structure("CX"),
            ],
        };
        assert_eq!(pid.position_of("PatientID"), Some(2));
        assert_eq!(pid.field(1).map(|f| f.name.as_str()), Some("SetID"));
        assert!(pid.field(0).is_none());
        assert!(pid.field(3).is_none());
    }

    #[test]
    fn test_message_schema_lookup() {
        let observation = SchemaElement::group(
            "ORU_R01.OBSERVATION",
            Occurs::new(0, MaxOccurs::Unbounded),
            vec![
                SchemaElement::segment("OBX", Occurs::required()),
                SchemaElement::segment("NTE", Occurs::new(0, MaxOccurs::Unbounded)),
            ],
        );
        let schema = MessageSchema::new(
            "ORU_R01",
            vec![
                SchemaElement::segment("MSH", Occurs::required()),
                SchemaElement::segment("NTE", Occurs::new(0, MaxOccurs::Unbounded)),
                observation,
            ],
        );

        assert_eq!(schema.segment_names(), vec!["MSH", "NTE", "OBX"]);
        assert!(schema.group("ORU_R01.OBSERVATION").is_some_and(SchemaElement::is_group));
        assert!(schema.group("ORU_R01.MISSING").is_none());
    }
}
