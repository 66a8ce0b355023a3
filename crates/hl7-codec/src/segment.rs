//! Segment codec
//!
//! Turns one segment line into a [`Segment`] whose fields carry the names from the
//! [`FieldCatalog`], and back. Segment types the catalog does not know get
//! positional labels: field n of `NK1` is `NK1.2`, its components `NK1.2.1`, ...

use crate::hierarchy;
use crate::syntax::DelimiterSet;
use crate::{Error, Result};
use hl7_ir::{FieldValue, HEADER_SEGMENT, Record, Segment, ValueNode};
use hl7_schema::{CompositeSchema, FieldCatalog, FieldDescriptor, SegmentDefinition};
use tracing::{debug, trace};

/// Position of the field separator pseudo-field in the header
const FIELD_SEPARATOR_POSITION: usize = 1;
/// Position of the encoding-characters field in the header
const ENCODING_CHARACTERS_POSITION: usize = 2;

/// Catalog-driven codec for single segments
#[derive(Debug, Clone, Copy)]
pub struct SegmentCodec<'c> {
    catalog: &'c FieldCatalog,
}

impl<'c> SegmentCodec<'c> {
    #[must_use]
    pub fn new(catalog: &'c FieldCatalog) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &'c FieldCatalog {
        self.catalog
    }

    /// Decode one segment line.
    ///
    /// The type code is the text before the first field separator and must look
    /// like a segment code. Errors report line 1; the message parser supplies
    /// real line numbers.
    pub fn decode_line(&self, line: &str, ds: &DelimiterSet) -> Result<Segment> {
        let mut parts = line.split(ds.field);
        let code = parts.next().unwrap_or_default();
        if !hl7_schema::is_segment_code(code) {
            return Err(Error::malformed_segment(
                1,
                format!("invalid segment type {code:?}"),
            ));
        }
        let raw_fields: Vec<&str> = parts.collect();
        Ok(self.decode(code, &raw_fields, ds))
    }

    /// Decode the fields of a segment whose type code is already known.
    ///
    /// `raw_fields` is everything after the type code, split on the field
    /// separator. For the header, the first entry is the encoding-character field.
    #[must_use]
    pub fn decode(&self, code: &str, raw_fields: &[&str], ds: &DelimiterSet) -> Segment {
        let definition = self.catalog.segment(code);
        if definition.is_none() {
            trace!("No field definitions for segment {}, using positional labels", code);
        }

        let mut segment = Segment::new(code);
        let first_position = if code == HEADER_SEGMENT {
            segment.set(
                FIELD_SEPARATOR_POSITION,
                field_name(code, definition, FIELD_SEPARATOR_POSITION),
                ds.field.to_string(),
            );
            ENCODING_CHARACTERS_POSITION
        } else {
            1
        };

        for (offset, raw) in raw_fields.iter().enumerate() {
            let position = first_position + offset;
            let name = field_name(code, definition, position);
            let value = if code == HEADER_SEGMENT && position == ENCODING_CHARACTERS_POSITION {
                FieldValue::text(*raw)
            } else {
                let node = hierarchy::decode(raw, ds);
                match definition.and_then(|d| d.field(position)) {
                    Some(descriptor) => self.label_field(code, position, &node, descriptor),
                    None => positional_field(&label(code, position), &node),
                }
            };
            segment.set(position, name, value);
        }
        segment
    }

    /// Name the parts of a decoded field after its descriptor
    fn label_field(
        &self,
        code: &str,
        position: usize,
        node: &ValueNode,
        descriptor: &FieldDescriptor,
    ) -> FieldValue {
        let structure = self.catalog.structure_of(descriptor);
        let prefix = label(code, position);

        match node {
            ValueNode::Repeated(repetitions) => {
                if !descriptor.is_repeated() {
                    debug!(
                        "{}-{} ({}) is not repeatable but holds repetitions; keeping them as a list",
                        code, position, descriptor.name
                    );
                }
                FieldValue::List(
                    repetitions
                        .iter()
                        .map(|rep| self.label_repetition(&prefix, rep, structure))
                        .collect(),
                )
            }
            single if descriptor.is_repeated() => {
                if is_blank(single) {
                    FieldValue::List(Vec::new())
                } else {
                    FieldValue::List(vec![self.label_repetition(&prefix, single, structure)])
                }
            }
            single => self.label_repetition(&prefix, single, structure),
        }
    }

    /// Name one repetition of a known field
    fn label_repetition(
        &self,
        prefix: &str,
        node: &ValueNode,
        structure: Option<&CompositeSchema>,
    ) -> FieldValue {
        let Some(composite) = structure else {
            return positional_repetition(prefix, node);
        };
        if is_blank(node) {
            return FieldValue::Null;
        }

        let mut record = Record::new();
        for (index, component) in components(node).iter().enumerate() {
            let position = index + 1;
            let component_label = label(prefix, position);
            let (name, value) = match composite.component(position) {
                Some(descriptor) => {
                    let value = match self.catalog.structure_of(descriptor) {
                        Some(_) if is_blank(component) => FieldValue::Null,
                        Some(nested) => {
                            subcomponent_record(&component_label, component, Some(nested))
                        }
                        None => positional_component(&component_label, component),
                    };
                    (descriptor.name.clone(), value)
                }
                None => (
                    component_label.clone(),
                    positional_component(&component_label, component),
                ),
            };
            record.insert(position, name, value);
        }
        FieldValue::Record(record)
    }

    /// Encode a segment into one line (without terminator)
    pub fn encode(&self, segment: &Segment, ds: &DelimiterSet) -> Result<String> {
        let code = segment.code();
        if !hl7_schema::is_segment_code(code) {
            return Err(Error::encode(code, 0, "invalid segment type code"));
        }
        let definition = self.catalog.segment(code);
        let fields = segment.fields();
        if fields.first_position() == Some(0) {
            return Err(Error::encode(code, 0, "field positions start at 1"));
        }

        for (position, entry) in fields.iter() {
            check_name(code, definition, position, &entry.name)?;
        }

        let is_header = code == HEADER_SEGMENT;
        let first_position = if is_header { ENCODING_CHARACTERS_POSITION + 1 } else { 1 };
        let last_position = fields.last_position().unwrap_or(0);

        let mut parts = Vec::new();
        for position in first_position..=last_position {
            let encoded = match fields.get_at(position) {
                Some(entry) => encode_value(&entry.value, ds)
                    .map_err(|e| into_encode_error(e, code, position))?,
                None => String::new(),
            };
            parts.push(encoded);
        }
        while parts.last().is_some_and(String::is_empty) {
            parts.pop();
        }

        let separator = ds.field.to_string();
        let mut line = String::from(code);
        if is_header {
            line.push(ds.field);
            line.push_str(&header_encoding_characters(segment, ds)?);
        }
        for part in parts {
            line.push_str(&separator);
            line.push_str(&part);
        }
        Ok(line)
    }

    /// Build a segment from named values, resolving names to positions.
    ///
    /// Names are catalog field names or positional labels (`NK1.2`); caller
    /// order does not matter.
    pub fn build<I, S>(&self, code: &str, fields: I) -> Result<Segment>
    where
        I: IntoIterator<Item = (S, FieldValue)>,
        S: Into<String>,
    {
        let definition = self.catalog.segment(code);
        let mut segment = Segment::new(code);
        for (name, value) in fields {
            let name = name.into();
            let position = self
                .position_of(code, definition, &name)
                .ok_or_else(|| Error::unknown_field(code, name.as_str()))?;
            segment.set(position, name, value);
        }
        Ok(segment)
    }

    fn position_of(
        &self,
        code: &str,
        definition: Option<&SegmentDefinition>,
        name: &str,
    ) -> Option<usize> {
        definition
            .and_then(|d| d.position_of(name))
            .or_else(|| positional_index(code, name))
    }
}

/// Name for a field position: the catalog's, or a positional label
fn field_name(code: &str, definition: Option<&SegmentDefinition>, position: usize) -> String {
    definition
        .and_then(|d| d.field(position))
        .map_or_else(|| label(code, position), |f| f.name.clone())
}

fn label(prefix: &str, position: usize) -> String {
    format!("{prefix}.{position}")
}

/// Parse `<prefix>.<n>` back into `n`
pub(crate) fn positional_index(prefix: &str, name: &str) -> Option<usize> {
    name.strip_prefix(prefix)?
        .strip_prefix('.')?
        .parse()
        .ok()
        .filter(|n| *n > 0)
}

fn check_name(
    code: &str,
    definition: Option<&SegmentDefinition>,
    position: usize,
    name: &str,
) -> Result<()> {
    let Some(definition) = definition else {
        return Ok(());
    };
    match definition.field(position) {
        Some(descriptor) if descriptor.name == name => Ok(()),
        Some(descriptor) => Err(Error::encode(
            code,
            position,
            format!("field is named {name:?} but position {position} is {:?}", descriptor.name),
        )),
        None if positional_index(code, name) == Some(position) => Ok(()),
        None => Err(Error::encode(
            code,
            position,
            format!("{name:?} is beyond the known fields of {code}"),
        )),
    }
}

fn header_encoding_characters(segment: &Segment, ds: &DelimiterSet) -> Result<String> {
    match segment.field_at(ENCODING_CHARACTERS_POSITION) {
        None | Some(FieldValue::Null) => Ok(ds.encoding_characters()),
        Some(FieldValue::Text(raw)) if raw.is_empty() => Ok(ds.encoding_characters()),
        Some(FieldValue::Text(raw)) => {
            if raw.contains(ds.field) || raw.contains('\r') || raw.contains('\n') {
                return Err(Error::encode(
                    HEADER_SEGMENT,
                    ENCODING_CHARACTERS_POSITION,
                    "encoding characters contain the field separator or a line break",
                ));
            }
            Ok(raw.clone())
        }
        Some(other) => Err(Error::encode(
            HEADER_SEGMENT,
            ENCODING_CHARACTERS_POSITION,
            format!("expected text, found {}", other.kind()),
        )),
    }
}

fn into_encode_error(error: Error, code: &str, position: usize) -> Error {
    match error {
        Error::InvalidValue(reason) => Error::encode(code, position, reason),
        other => other,
    }
}

/// Convert a named value into a delimiter tree and encode it
pub(crate) fn encode_value(value: &FieldValue, ds: &DelimiterSet) -> Result<String> {
    hierarchy::encode(&to_node(value, 0)?, ds)
}

/// `depth` 0 is the field, 1 a component, 2 a subcomponent
fn to_node(value: &FieldValue, depth: usize) -> Result<ValueNode> {
    match value {
        FieldValue::Null => Ok(ValueNode::empty()),
        FieldValue::Text(text) => Ok(ValueNode::leaf(text.as_str())),
        FieldValue::List(items) if depth == 0 => Ok(ValueNode::Repeated(
            items
                .iter()
                .map(|item| match item {
                    FieldValue::List(_) => Err(Error::InvalidValue(
                        "repetition nested inside a repetition".to_string(),
                    )),
                    other => to_node(other, 0),
                })
                .collect::<Result<_>>()?,
        )),
        FieldValue::List(_) => Err(Error::InvalidValue(
            "repetition inside a component".to_string(),
        )),
        FieldValue::Record(record) => {
            if record.first_position() == Some(0) {
                return Err(Error::InvalidValue(
                    "component positions start at 1".to_string(),
                ));
            }
            let last = record.last_position().unwrap_or(0);
            let mut children = Vec::with_capacity(last);
            for position in 1..=last {
                children.push(match record.get_at(position) {
                    Some(entry) => to_node(&entry.value, depth + 1)?,
                    None => ValueNode::empty(),
                });
            }
            Ok(ValueNode::Composite(children))
        }
    }
}

/// An empty leaf: what empty raw text decodes to
fn is_blank(node: &ValueNode) -> bool {
    node.as_text().is_some_and(str::is_empty)
}

/// Components of one repetition; a bare leaf is its own first component
fn components(node: &ValueNode) -> &[ValueNode] {
    match node {
        ValueNode::Leaf(_) => std::slice::from_ref(node),
        other => other.children(),
    }
}

/// Field of an unrecognized segment, or beyond the known fields
fn positional_field(prefix: &str, node: &ValueNode) -> FieldValue {
    match node {
        ValueNode::Repeated(repetitions) => FieldValue::List(
            repetitions
                .iter()
                .map(|rep| positional_repetition(prefix, rep))
                .collect(),
        ),
        other => positional_repetition(prefix, other),
    }
}

fn positional_repetition(prefix: &str, node: &ValueNode) -> FieldValue {
    match node {
        ValueNode::Leaf(text) => FieldValue::text(text.as_str()),
        other => {
            let mut record = Record::new();
            for (index, component) in other.children().iter().enumerate() {
                let component_label = label(prefix, index + 1);
                let value = positional_component(&component_label, component);
                record.insert(index + 1, component_label, value);
            }
            FieldValue::Record(record)
        }
    }
}

fn positional_component(prefix: &str, node: &ValueNode) -> FieldValue {
    match node {
        ValueNode::Leaf(text) => FieldValue::text(text.as_str()),
        other => subcomponent_record(prefix, other, None),
    }
}

/// Subcomponents of one component, named by `structure` where it has names
fn subcomponent_record(
    prefix: &str,
    node: &ValueNode,
    structure: Option<&CompositeSchema>,
) -> FieldValue {
    let mut record = Record::new();
    for (index, part) in components(node).iter().enumerate() {
        let position = index + 1;
        let name = structure
            .and_then(|s| s.component(position))
            .map_or_else(|| label(prefix, position), |d| d.name.clone());
        record.insert(position, name, part.as_text().unwrap_or_default());
    }
    FieldValue::Record(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FieldCatalog {
        FieldCatalog::builtin().unwrap()
    }

    #[test]
    fn test_pid_identifier_components() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let pid = codec.decode_line("PID|1||ID^5^M11", &ds).unwrap();
        let ids = pid.field_at(3).unwrap();
        let first = ids.at(0).and_then(FieldValue::as_record).unwrap();
        let values: Vec<&str> = first.iter().filter_map(|(_, e)| e.value.as_text()).collect();
        assert_eq!(values, vec!["ID", "5", "M11"]);
        assert_eq!(first.get_at(1).map(|e| e.name.as_str()), Some("IdNumber"));
        assert_eq!(pid.get("SetID").and_then(FieldValue::as_text), Some("1"));
        assert_eq!(pid.get("PatientID"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_unrecognized_segment_positional_labels() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let nk1 = codec
            .decode_line("NK1|1|NUCLEAR^NELDA^W|SPO^SPOUSE||||NK^NEXT OF KIN", &ds)
            .unwrap();
        assert_eq!(nk1.get("NK1.1").and_then(FieldValue::as_text), Some("1"));
        let name = nk1.get("NK1.2").unwrap();
        assert_eq!(name.get("NK1.2.1").and_then(FieldValue::as_text), Some("NUCLEAR"));
        assert_eq!(name.get("NK1.2.3").and_then(FieldValue::as_text), Some("W"));
        assert_eq!(nk1.get("NK1.4").and_then(FieldValue::as_text), Some(""));
    }

    #[test]
    fn test_unrecognized_segment_subcomponents_and_repetitions() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let zab = codec.decode_line("ZAB|a~b^c&d", &ds).unwrap();
        let reps = zab.get("ZAB.1").and_then(FieldValue::as_list).unwrap();
        assert_eq!(reps[0].as_text(), Some("a"));
        let sub = reps[1].get("ZAB.1.2").and_then(|v| v.get("ZAB.1.2.2"));
        assert_eq!(sub.and_then(FieldValue::as_text), Some("d"));
    }

    #[test]
    fn test_decoded_fields_follow_hierarchy_tree() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::new('#', ':', '*', '!', '@').unwrap();

        let raw = ["a*b:c@d", "x@y", "", "p:q"];
        let zab = codec.decode_line(&format!("ZAB#{}", raw.join("#")), &ds).unwrap();
        for (index, raw) in raw.iter().enumerate() {
            let value = zab.field_at(index + 1).unwrap();
            let tree = hierarchy::decode(raw, &ds);
            assert_eq!(
                encode_value(value, &ds).unwrap(),
                hierarchy::encode(&tree, &ds).unwrap(),
                "field {}",
                index + 1
            );
        }
        let sub = zab.get("ZAB.2").and_then(|v| v.get("ZAB.2.1"));
        assert_eq!(sub.and_then(|v| v.get("ZAB.2.1.2")).and_then(FieldValue::as_text), Some("y"));

        let pv1 = codec
            .decode_line("PV1#1#R#####Manning:Terry:::::::@7654321@UPIN", &ds)
            .unwrap();
        let doctor = pv1.get("AttendingDoctor").and_then(|v| v.at(0)).unwrap();
        assert_eq!(doctor.get("FamilyName").and_then(FieldValue::as_text), Some("Terry"));
        let authority = doctor.get("AssigningAuthority").unwrap();
        assert_eq!(authority.get("UniversalID").and_then(FieldValue::as_text), Some("7654321"));
    }

    #[test]
    fn test_header_fields() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let msh = codec
            .decode_line("MSH|^~\\&|ADT1|GOOD HEALTH HOSPITAL|||||ADT^A01^ADT_A01|MSG00001", &ds)
            .unwrap();
        assert_eq!(msh.get("FieldSeparator").and_then(FieldValue::as_text), Some("|"));
        assert_eq!(msh.get("EncodingCharacters").and_then(FieldValue::as_text), Some("^~\\&"));
        let sending = msh.get("SendingApplication").unwrap();
        assert_eq!(sending.get("NamespaceID").and_then(FieldValue::as_text), Some("ADT1"));
        let message_type = msh.get("MessageType").unwrap();
        assert_eq!(message_type.get("TriggerEvent").and_then(FieldValue::as_text), Some("A01"));
        assert_eq!(msh.get("MessageControlID").and_then(FieldValue::as_text), Some("MSG00001"));
        assert_eq!(msh.fields().position_of("MessageType"), Some(9));
    }

    #[test]
    fn test_nested_composite_and_extra_components() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        // XCN component 9 (AssigningAuthority) is an HD
        let pv1 = codec
            .decode_line("PV1|1|R|||||Manning^Manning^Terry^^^^^^&7654321&UPIN", &ds)
            .unwrap();
        let doctor = pv1.get("AttendingDoctor").and_then(|v| v.at(0)).unwrap();
        let authority = doctor.get("AssigningAuthority").unwrap();
        assert_eq!(authority.get("UniversalID").and_then(FieldValue::as_text), Some("7654321"));
        assert_eq!(authority.get("UniversalIdType").and_then(FieldValue::as_text), Some("UPIN"));
    }

    #[test]
    fn test_single_field_with_repetitions_becomes_list() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let pid = codec.decode_line("PID|1~2", &ds).unwrap();
        let set_id = pid.get("SetID").and_then(FieldValue::as_list).unwrap();
        assert_eq!(set_id.len(), 2);
        assert_eq!(codec.encode(&pid, &ds).unwrap(), "PID|1~2");
    }

    #[test]
    fn test_plain_field_with_components_is_kept() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        // PID-7 DateOfBirth has no structure in the catalog
        let pid = codec.decode_line("PID|1||||||1961^06", &ds).unwrap();
        let dob = pid.get("DateOfBirth").unwrap();
        assert_eq!(dob.get("PID.7.2").and_then(FieldValue::as_text), Some("06"));
        assert_eq!(codec.encode(&pid, &ds).unwrap(), "PID|1||||||1961^06");
    }

    #[test]
    fn test_empty_fields() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let pid = codec.decode_line("PID|||||", &ds).unwrap();
        assert_eq!(pid.get("SetID"), Some(&FieldValue::text("")));
        assert_eq!(pid.get("PatientID"), Some(&FieldValue::Null));
        assert_eq!(pid.get("PatientIdentifierList"), Some(&FieldValue::List(vec![])));
        assert_eq!(codec.encode(&pid, &ds).unwrap(), "PID");
    }

    #[test]
    fn test_encode_round_trip_with_trailing_normalization() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let line = "PID|||10002^^^A^MR||RAPID^^|^^|||||^^^^^^^||||||||||||||||||";
        let pid = codec.decode_line(line, &ds).unwrap();
        assert_eq!(codec.encode(&pid, &ds).unwrap(), "PID|||10002^^^A^MR||RAPID");
    }

    #[test]
    fn test_encode_header() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let line = "MSH|^~\\&|HL7|CG3_SICU|CE_CENTRAL|GH_CSF|20251014154001||ORU^R01|20251014154001-425|P|2.3||||||UNICODE UTF-8";
        let msh = codec.decode_line(line, &ds).unwrap();
        assert_eq!(codec.encode(&msh, &ds).unwrap(), line);

        let bare = Segment::new("MSH");
        assert_eq!(codec.encode(&bare, &ds).unwrap(), "MSH|^~\\&");
    }

    #[test]
    fn test_build_resolves_names() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let name = Record::new().with(2, "GivenName", "ADAM").with(1, "FamilyName", "EVERYMAN");
        let pid = codec
            .build(
                "PID",
                vec![
                    ("PatientName", FieldValue::List(vec![FieldValue::Record(name)])),
                    ("SetID", FieldValue::text("1")),
                ],
            )
            .unwrap();
        assert_eq!(codec.encode(&pid, &ds).unwrap(), "PID|1||||EVERYMAN^ADAM");

        let nk1 = codec.build("NK1", vec![("NK1.3", FieldValue::text("SPO"))]).unwrap();
        assert_eq!(codec.encode(&nk1, &ds).unwrap(), "NK1|||SPO");
    }

    #[test]
    fn test_build_unknown_field() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        match codec.build("PID", vec![("ShoeSize", FieldValue::text("9"))]) {
            Err(Error::UnknownField { segment, field }) => {
                assert_eq!(segment, "PID");
                assert_eq!(field, "ShoeSize");
            }
            other => panic!("Expected UnknownField, got {other:?}"),
        }
        assert!(codec.build("NK1", vec![("Name", FieldValue::Null)]).is_err());
        assert!(codec.build("NK1", vec![("NK1.0", FieldValue::Null)]).is_err());
    }

    #[test]
    fn test_encode_rejects_mismatched_name() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let pid = Segment::new("PID").with_field(5, "SetID", "1");
        match codec.encode(&pid, &ds) {
            Err(Error::Encode { segment, position, .. }) => {
                assert_eq!(segment, "PID");
                assert_eq!(position, 5);
            }
            other => panic!("Expected Encode error, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_rejects_delimiter_in_value() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let pid = Segment::new("PID").with_field(8, "AdministrativeSex", "M|F");
        match codec.encode(&pid, &ds) {
            Err(Error::Encode { position, reason, .. }) => {
                assert_eq!(position, 8);
                assert!(reason.contains("escape"));
            }
            other => panic!("Expected Encode error, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_rejects_nested_lists() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();

        let nested = FieldValue::List(vec![FieldValue::List(vec![FieldValue::text("a")])]);
        let zab = Segment::new("ZAB").with_field(1, "ZAB.1", nested);
        assert!(matches!(codec.encode(&zab, &ds), Err(Error::Encode { position: 1, .. })));
    }

    #[test]
    fn test_decode_line_rejects_bad_code() {
        let catalog = catalog();
        let codec = SegmentCodec::new(&catalog);
        let ds = DelimiterSet::default();
        assert!(matches!(
            codec.decode_line("pid|1", &ds),
            Err(Error::MalformedSegment { line: 1, .. })
        ));
        assert!(codec.decode_line("PIDX|1", &ds).is_err());
    }
}
