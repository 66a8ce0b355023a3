//! Validation report

use hl7_schema::Occurs;
use serde::Serialize;
use std::fmt;

/// One structural problem found in a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A segment required by the schema is absent
    MissingRequiredSegment { segment: String },
    /// A segment type the schema does not mention anywhere
    UnexpectedSegment { segment: String },
    /// A segment type occurs more or fewer times than its bounds allow
    OccurrenceViolation {
        segment: String,
        /// Group path down to the segment, e.g. `ORU_R01.PATIENT_RESULT/OBX`
        path: String,
        #[serde(serialize_with = "serialize_occurs")]
        expected: Occurs,
        observed: usize,
    },
}

impl Violation {
    /// Segment type the violation is about
    #[must_use]
    pub fn segment(&self) -> &str {
        match self {
            Self::MissingRequiredSegment { segment }
            | Self::UnexpectedSegment { segment }
            | Self::OccurrenceViolation { segment, .. } => segment,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredSegment { segment } => {
                write!(f, "missing required segment {segment}")
            }
            Self::UnexpectedSegment { segment } => {
                write!(f, "segment {segment} is not allowed")
            }
            Self::OccurrenceViolation {
                segment,
                expected,
                observed,
                ..
            } => {
                write!(f, "segment {segment} occurs {observed} time(s), expected {expected}")
            }
        }
    }
}

fn serialize_occurs<S: serde::Serializer>(occurs: &Occurs, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(occurs)
}

/// Every violation found in one message, in check order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    message_type: String,
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new(message_type: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            violations: Vec::new(),
        }
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    /// Names of missing required segments
    #[must_use]
    pub fn missing_segments(&self) -> Vec<&str> {
        self.violations
            .iter()
            .filter(|v| matches!(v, Violation::MissingRequiredSegment { .. }))
            .map(Violation::segment)
            .collect()
    }

    /// Names of segment types the schema does not allow
    #[must_use]
    pub fn unexpected_segments(&self) -> Vec<&str> {
        self.violations
            .iter()
            .filter(|v| matches!(v, Violation::UnexpectedSegment { .. }))
            .map(Violation::segment)
            .collect()
    }

    pub fn occurrence_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| matches!(v, Violation::OccurrenceViolation { .. }))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "{}: valid", self.message_type);
        }
        write!(
            f,
            "{}: {} violation(s)",
            self.message_type,
            self.violations.len()
        )?;
        for violation in &self.violations {
            write!(f, "\n  - {violation}")?;
        }
        Ok(())
    }
}
