//! HL7 delimiter definitions
//!
//! The header segment declares the delimiters for the whole message:
//!
//! ```text
//! MSH|^~\&|SENDER|...
//!    ^ ^^^^
//!    | |||+- subcomponent separator
//!    | ||+-- escape character
//!    | |+--- repetition separator
//!    | +---- component separator
//!    +------ field separator (4th character of the line)
//! ```

use crate::{Error, Result};
use hl7_ir::HEADER_SEGMENT;

/// Default HL7 delimiters (when the header does not say otherwise)
pub const DEFAULT_FIELD_SEPARATOR: char = '|';
pub const DEFAULT_COMPONENT_SEPARATOR: char = '^';
pub const DEFAULT_REPETITION_SEPARATOR: char = '~';
pub const DEFAULT_ESCAPE_CHARACTER: char = '\\';
pub const DEFAULT_SUBCOMPONENT_SEPARATOR: char = '&';

/// Delimiters used to split and join one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterSet {
    /// Field separator (default '|')
    pub field: char,
    /// Component separator (default '^')
    pub component: char,
    /// Repetition separator (default '~')
    pub repetition: char,
    /// Escape character (default '\')
    pub escape: char,
    /// Subcomponent separator (default '&')
    pub subcomponent: char,
}

impl Default for DelimiterSet {
    fn default() -> Self {
        Self {
            field: DEFAULT_FIELD_SEPARATOR,
            component: DEFAULT_COMPONENT_SEPARATOR,
            repetition: DEFAULT_REPETITION_SEPARATOR,
            escape: DEFAULT_ESCAPE_CHARACTER,
            subcomponent: DEFAULT_SUBCOMPONENT_SEPARATOR,
        }
    }
}

impl DelimiterSet {
    /// Build a delimiter set, checking that all five characters are distinct
    pub fn new(
        field: char,
        component: char,
        repetition: char,
        escape: char,
        subcomponent: char,
    ) -> Result<Self> {
        let set = Self {
            field,
            component,
            repetition,
            escape,
            subcomponent,
        };
        set.check()?;
        Ok(set)
    }

    /// Derive the delimiters from a header line (`MSH|^~\&|...`)
    pub fn from_header(line: &str) -> Result<Self> {
        let Some(rest) = line.strip_prefix(HEADER_SEGMENT) else {
            return Err(Error::malformed_header(format!(
                "header must start with {HEADER_SEGMENT}"
            )));
        };
        let mut chars = rest.chars();
        let field = chars
            .next()
            .ok_or_else(|| Error::malformed_header("header too short to declare delimiters"))?;
        let after_field = chars.as_str();
        let encoding = after_field
            .split(field)
            .next()
            .unwrap_or_default();
        Self::from_parts(field, encoding)
    }

    /// Derive the delimiters from the field separator and the encoding-character field.
    ///
    /// Characters after the fourth are ignored here; callers keep them verbatim.
    pub fn from_parts(field: char, encoding_characters: &str) -> Result<Self> {
        let mut chars = encoding_characters.chars();
        let (Some(component), Some(repetition), Some(escape), Some(subcomponent)) =
            (chars.next(), chars.next(), chars.next(), chars.next())
        else {
            return Err(Error::malformed_header(format!(
                "expected 4 encoding characters, found {:?}",
                encoding_characters
            )));
        };
        Self::new(field, component, repetition, escape, subcomponent)
    }

    /// The four encoding characters in header order
    #[must_use]
    pub fn encoding_characters(&self) -> String {
        [self.component, self.repetition, self.escape, self.subcomponent]
            .iter()
            .collect()
    }

    /// True for the four splitting delimiters (the escape character is not one)
    #[must_use]
    pub fn is_separator(&self, c: char) -> bool {
        c == self.field || c == self.component || c == self.repetition || c == self.subcomponent
    }

    fn check(&self) -> Result<()> {
        let all = [
            self.field,
            self.component,
            self.repetition,
            self.escape,
            self.subcomponent,
        ];
        for (i, c) in all.iter().enumerate() {
            if *c == '\r' || *c == '\n' {
                return Err(Error::malformed_header("delimiters cannot be line breaks"));
            }
            if all[i + 1..].contains(c) {
                return Err(Error::malformed_header(format!(
                    "delimiter {c:?} is used more than once"
                )));
            }
        }
        Ok(())
    }
}
