//! Validation engine

use crate::reporter::{ValidationReport, Violation};
use crate::{Error, Result};
use hl7_ir::Message;
use hl7_schema::{MaxOccurs, MessageSchema, Occurs, SchemaElement, SchemaLoader};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// How a segment's upper bound combines with the bounds of its enclosing groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundCombination {
    /// Tightest bound along the path: segment and every enclosing group
    #[default]
    Minimum,
    /// Product of the bounds along the path; counts are per message, so this is
    /// the most a full expansion of the groups can hold
    Product,
    /// Loosest enclosing group bound; the segment's own bound only applies at the
    /// message root
    Maximum,
}

impl BoundCombination {
    /// Effective upper bound of a segment nested in groups with `enclosing` bounds
    #[must_use]
    pub fn combine(self, segment: MaxOccurs, enclosing: &[MaxOccurs]) -> MaxOccurs {
        match self {
            Self::Minimum => enclosing.iter().fold(segment, |acc, max| acc.min(*max)),
            Self::Product => enclosing.iter().fold(segment, |acc, max| acc.times(*max)),
            Self::Maximum => match enclosing.split_first() {
                Some((first, rest)) => rest.iter().fold(*first, |acc, max| acc.max(*max)),
                None => segment,
            },
        }
    }
}

/// Validation configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub bound_combination: BoundCombination,
}

/// Where a segment type sits in a schema tree
struct Located<'s> {
    occurs: Occurs,
    /// Enclosing groups, outermost first
    groups: Vec<&'s SchemaElement>,
}

impl Located<'_> {
    fn path(&self, segment: &str) -> String {
        let mut parts: Vec<&str> = self.groups.iter().map(|g| g.name()).collect();
        parts.push(segment);
        parts.join("/")
    }
}

/// Checks decoded messages against message schemas
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    config: ValidationConfig,
}

impl ValidationEngine {
    /// Create a new validation engine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with specific configuration
    #[must_use]
    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Run every check and collect all findings.
    ///
    /// Violations are ordered by check: missing segments first, then unexpected
    /// segment types, then occurrence bounds.
    #[must_use]
    pub fn validate(&self, message: &Message, schema: &MessageSchema) -> ValidationReport {
        let mut report = ValidationReport::new(schema.message_type.as_str());
        let present = message.segment_types();

        let mut missing = Vec::new();
        collect_missing(&schema.elements, &present, &mut missing);
        for segment in missing {
            report.push(Violation::MissingRequiredSegment {
                segment: segment.to_string(),
            });
        }

        let mut located = Vec::with_capacity(present.len());
        for code in &present {
            match locate(&schema.elements, code) {
                Some(found) => located.push((*code, found)),
                None => report.push(Violation::UnexpectedSegment {
                    segment: (*code).to_string(),
                }),
            }
        }

        for (code, found) in located {
            let enclosing: Vec<MaxOccurs> = found.groups.iter().map(|g| g.occurs().max).collect();
            let expected = Occurs::new(
                found.occurs.min,
                self.config
                    .bound_combination
                    .combine(found.occurs.max, &enclosing),
            );
            let observed = message.count(code);
            trace!("{} occurs {} time(s), bounds {}", code, observed, expected);
            if observed < expected.min as usize || !expected.max.allows(observed) {
                report.push(Violation::OccurrenceViolation {
                    segment: code.to_string(),
                    path: found.path(code),
                    expected,
                    observed,
                });
            }
        }

        if report.is_valid() {
            debug!("{} message is structurally valid", schema.message_type);
        } else {
            debug!(
                "{} message has {} structural violation(s)",
                schema.message_type,
                report.len()
            );
        }
        report
    }

    /// Validate against the schema of the message's own type.
    ///
    /// # Errors
    ///
    /// Fails when the header does not name a message type or its schema cannot be
    /// loaded.
    pub fn validate_message(
        &self,
        message: &Message,
        loader: &SchemaLoader,
    ) -> Result<ValidationReport> {
        let message_type = message.message_type().ok_or_else(|| {
            Error::MessageType("MSH-9 does not hold a message code and trigger event".to_string())
        })?;
        let schema = loader.load(&message_type)?;
        Ok(self.validate(message, &schema))
    }
}

/// Required segments absent from `present`; groups are entered only when required
fn collect_missing<'s>(elements: &'s [SchemaElement], present: &[&str], missing: &mut Vec<&'s str>) {
    for element in elements {
        if !element.occurs().is_required() {
            continue;
        }
        match element {
            SchemaElement::Segment { name, .. } => {
                if !present.contains(&name.as_str()) && !missing.contains(&name.as_str()) {
                    missing.push(name);
                }
            }
            SchemaElement::Group { elements, .. } => collect_missing(elements, present, missing),
        }
    }
}

/// First declaration of `code`, depth first in declaration order
fn locate<'s>(elements: &'s [SchemaElement], code: &str) -> Option<Located<'s>> {
    for element in elements {
        match element {
            SchemaElement::Segment { name, occurs } => {
                if name == code {
                    return Some(Located {
                        occurs: *occurs,
                        groups: Vec::new(),
                    });
                }
            }
            SchemaElement::Group { elements, .. } => {
                if let Some(mut found) = locate(elements, code) {
                    found.groups.insert(0, element);
                    return Some(found);
                }
            }
        }
    }
    None
}
