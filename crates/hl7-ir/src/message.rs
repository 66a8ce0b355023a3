//! Message container and segment grouping

use crate::node::FieldValue;
use crate::segment::{HEADER_SEGMENT, Segment};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Position of the message type field in the header segment
const MESSAGE_TYPE_POSITION: usize = 9;

/// A decoded message: segments in the order they arrived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    segments: Vec<Segment>,
}

/// All occurrences of one segment type.
///
/// A type seen once is `Single`; from the second occurrence onward it becomes
/// `Repeated`, holding every occurrence in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentEntry<'a> {
    Single(&'a Segment),
    Repeated(Vec<&'a Segment>),
}

impl<'a> SegmentEntry<'a> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Repeated(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_repeated(&self) -> bool {
        matches!(self, Self::Repeated(_))
    }

    #[must_use]
    pub fn first(&self) -> Option<&'a Segment> {
        match self {
            Self::Single(segment) => Some(segment),
            Self::Repeated(items) => items.first().copied(),
        }
    }

    /// Occurrences in arrival order
    #[must_use]
    pub fn segments(&self) -> Vec<&'a Segment> {
        match self {
            Self::Single(segment) => vec![*segment],
            Self::Repeated(items) => items.clone(),
        }
    }
}

impl Message {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Append a segment after all existing ones
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Distinct segment type codes in order of first appearance
    #[must_use]
    pub fn segment_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if !types.contains(&segment.code()) {
                types.push(segment.code());
            }
        }
        types
    }

    /// Number of occurrences of a segment type
    #[must_use]
    pub fn count(&self, code: &str) -> usize {
        self.segments.iter().filter(|s| s.code() == code).count()
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.segments.iter().any(|s| s.code() == code)
    }

    /// First occurrence of a segment type
    #[must_use]
    pub fn first(&self, code: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.code() == code)
    }

    /// Grouped view of one segment type
    #[must_use]
    pub fn get(&self, code: &str) -> Option<SegmentEntry<'_>> {
        let mut matching = self.segments.iter().filter(|s| s.code() == code);
        let first = matching.next()?;
        match matching.next() {
            None => Some(SegmentEntry::Single(first)),
            Some(second) => {
                let mut items = vec![first, second];
                items.extend(matching);
                Some(SegmentEntry::Repeated(items))
            }
        }
    }

    /// Grouped view of every segment type, in order of first appearance
    #[must_use]
    pub fn groups(&self) -> Vec<(&str, SegmentEntry<'_>)> {
        let mut groups: Vec<(&str, SegmentEntry<'_>)> = Vec::new();
        for segment in &self.segments {
            match groups.iter_mut().find(|(code, _)| *code == segment.code()) {
                Some((_, entry)) => {
                    let promoted = match entry {
                        SegmentEntry::Single(existing) => {
                            SegmentEntry::Repeated(vec![*existing, segment])
                        }
                        SegmentEntry::Repeated(items) => {
                            items.push(segment);
                            continue;
                        }
                    };
                    *entry = promoted;
                }
                None => groups.push((segment.code(), SegmentEntry::Single(segment))),
            }
        }
        groups
    }

    /// The header segment, if present
    #[must_use]
    pub fn header(&self) -> Option<&Segment> {
        self.first(HEADER_SEGMENT)
    }

    /// Message type identifier such as `ADT_A01`.
    ///
    /// Built from the first two components of the header's message type field
    /// (message code and trigger event); spaces in the trigger event are removed.
    /// Returns `None` when either component is missing or empty.
    #[must_use]
    pub fn message_type(&self) -> Option<String> {
        let field = self.header()?.field_at(MESSAGE_TYPE_POSITION)?;
        let field = match field {
            FieldValue::List(items) => items.first()?,
            other => other,
        };
        let record = field.as_record()?;
        let code = record.get_at(1)?.value.as_text()?.trim();
        let trigger: String = record
            .get_at(2)?
            .value
            .as_text()?
            .chars()
            .filter(|c| *c != ' ')
            .collect();
        if code.is_empty() || trigger.is_empty() {
            return None;
        }
        Some(format!("{code}_{trigger}"))
    }
}

impl FromIterator<Segment> for Message {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl Serialize for SegmentEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Single(segment) => segment.serialize(serializer),
            Self::Repeated(items) => serializer.collect_seq(items.iter()),
        }
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let groups = self.groups();
        let mut map = serializer.serialize_map(Some(groups.len()))?;
        for (code, entry) in &groups {
            map.serialize_entry(code, entry)?;
        }
        map.end()
    }
}
