//! Field-level delimiter hierarchy
//!
//! A field splits into repetitions, each repetition into components, and each
//! component into subcomponents. [`decode`] keeps every part it finds; [`encode`]
//! drops trailing empty parts at every level, innermost first, so `A^^` comes
//! back as `A` and `A&^` as `A`.

use crate::syntax::DelimiterSet;
use crate::{Error, Result};
use hl7_ir::ValueNode;

/// Decode one field's raw text into a value tree.
///
/// A field with subcomponents but no component separator decodes to a
/// one-component `Composite` around the subcomponent `Composite`, so the
/// subcomponent level survives re-encoding.
#[must_use]
pub fn decode(raw: &str, ds: &DelimiterSet) -> ValueNode {
    if raw.is_empty() {
        return ValueNode::empty();
    }
    if raw.contains(ds.repetition) {
        return ValueNode::Repeated(
            raw.split(ds.repetition)
                .map(|part| decode_repetition(part, ds))
                .collect(),
        );
    }
    decode_repetition(raw, ds)
}

/// Decode one repetition (component level)
#[must_use]
pub fn decode_repetition(raw: &str, ds: &DelimiterSet) -> ValueNode {
    if raw.contains(ds.component) {
        return ValueNode::Composite(
            raw.split(ds.component)
                .map(|part| decode_component(part, ds))
                .collect(),
        );
    }
    match decode_component(raw, ds) {
        leaf @ ValueNode::Leaf(_) => leaf,
        subcomponents => ValueNode::Composite(vec![subcomponents]),
    }
}

/// Decode one component (subcomponent level)
#[must_use]
pub fn decode_component(raw: &str, ds: &DelimiterSet) -> ValueNode {
    if raw.contains(ds.subcomponent) {
        ValueNode::Composite(raw.split(ds.subcomponent).map(ValueNode::leaf).collect())
    } else {
        ValueNode::leaf(raw)
    }
}

/// Encode a value tree into one field's raw text.
///
/// Fails on `Repeated` below field level, on composites nested deeper than
/// subcomponents, and on leaves containing a separator or a line break.
pub fn encode(node: &ValueNode, ds: &DelimiterSet) -> Result<String> {
    match node {
        ValueNode::Repeated(items) => {
            let parts = items
                .iter()
                .map(|item| encode_repetition(item, ds))
                .collect::<Result<Vec<_>>>()?;
            Ok(join_trimmed(parts, ds.repetition))
        }
        other => encode_repetition(other, ds),
    }
}

fn encode_repetition(node: &ValueNode, ds: &DelimiterSet) -> Result<String> {
    match node {
        ValueNode::Leaf(text) => check_leaf(text, ds),
        ValueNode::Composite(components) => {
            let parts = components
                .iter()
                .map(|component| encode_component(component, ds))
                .collect::<Result<Vec<_>>>()?;
            Ok(join_trimmed(parts, ds.component))
        }
        ValueNode::Repeated(_) => Err(Error::InvalidValue(
            "repetition nested inside a repetition".to_string(),
        )),
    }
}

fn encode_component(node: &ValueNode, ds: &DelimiterSet) -> Result<String> {
    match node {
        ValueNode::Leaf(text) => check_leaf(text, ds),
        ValueNode::Composite(subcomponents) => {
            let parts = subcomponents
                .iter()
                .map(|sub| match sub {
                    ValueNode::Leaf(text) => check_leaf(text, ds),
                    _ => Err(Error::InvalidValue(
                        "structure nested below subcomponent level".to_string(),
                    )),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(join_trimmed(parts, ds.subcomponent))
        }
        ValueNode::Repeated(_) => Err(Error::InvalidValue(
            "repetition inside a component".to_string(),
        )),
    }
}

fn check_leaf(text: &str, ds: &DelimiterSet) -> Result<String> {
    if let Some(c) = text
        .chars()
        .find(|c| ds.is_separator(*c) || *c == '\r' || *c == '\n')
    {
        return Err(Error::InvalidValue(format!(
            "value {text:?} contains delimiter {c:?}; escape sequences are not supported"
        )));
    }
    Ok(text.to_string())
}

/// Drop trailing empty parts, then join
fn join_trimmed(mut parts: Vec<String>, separator: char) -> String {
    while parts.last().is_some_and(String::is_empty) {
        parts.pop();
    }
    parts.join(&separator.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(s: &str) -> ValueNode {
        ValueNode::leaf(s)
    }

    fn comp(children: Vec<ValueNode>) -> ValueNode {
        ValueNode::Composite(children)
    }

    #[test]
    fn test_decode_components() {
        let ds = DelimiterSet::default();
        assert_eq!(
            decode("ID^5^M11", &ds),
            comp(vec![leaf("ID"), leaf("5"), leaf("M11")])
        );
    }

    #[test]
    fn test_decode_empty_and_plain() {
        let ds = DelimiterSet::default();
        assert_eq!(decode("", &ds), ValueNode::empty());
        assert_eq!(decode("ADT1", &ds), leaf("ADT1"));
    }

    #[test]
    fn test_decode_repetitions() {
        let ds = DelimiterSet::default();
        let node = decode("PATID1234^5^M11~123456789^^^USSSA^SS", &ds);
        match node {
            ValueNode::Repeated(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(
                    items[1],
                    comp(vec![leaf("123456789"), leaf(""), leaf(""), leaf("USSSA"), leaf("SS")])
                );
            }
            other => panic!("Expected Repeated, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_subcomponents() {
        let ds = DelimiterSet::default();
        assert_eq!(
            decode("Manning^Terry^^&7654321&UPIN", &ds),
            comp(vec![
                leaf("Manning"),
                leaf("Terry"),
                leaf(""),
                comp(vec![leaf(""), leaf("7654321"), leaf("UPIN")]),
            ])
        );
        assert_eq!(decode("A&B", &ds), comp(vec![comp(vec![leaf("A"), leaf("B")])]));
    }

    #[test]
    fn test_encode_strips_trailing_empties() {
        let ds = DelimiterSet::default();
        assert_eq!(encode(&decode("A^^", &ds), &ds).unwrap(), "A");
        assert_eq!(encode(&decode("RAPID^^", &ds), &ds).unwrap(), "RAPID");
        assert_eq!(encode(&decode("^^^^^^^", &ds), &ds).unwrap(), "");
        assert_eq!(encode(&decode("A~~", &ds), &ds).unwrap(), "A");
        assert_eq!(encode(&decode("^A", &ds), &ds).unwrap(), "^A");
    }

    #[test]
    fn test_encode_strips_bottom_up() {
        let ds = DelimiterSet::default();
        // Stripping the empty subcomponents leaves the last component empty too
        let node = comp(vec![leaf("A"), comp(vec![leaf(""), leaf("")])]);
        assert_eq!(encode(&node, &ds).unwrap(), "A");
        let node = ValueNode::Repeated(vec![leaf("A"), comp(vec![leaf(""), comp(vec![leaf("")])])]);
        assert_eq!(encode(&node, &ds).unwrap(), "A");
    }

    #[test]
    fn test_encode_rejects_delimiters_in_leaf() {
        let ds = DelimiterSet::default();
        for text in ["A|B", "A^B", "A~B", "A&B", "A\rB", "A\nB"] {
            assert!(
                matches!(encode(&leaf(text), &ds), Err(Error::InvalidValue(_))),
                "{text:?} should be rejected"
            );
        }
        // The escape character passes through
        assert_eq!(encode(&leaf("CT\\T\\BODY"), &ds).unwrap(), "CT\\T\\BODY");
    }

    #[test]
    fn test_encode_rejects_bad_nesting() {
        let ds = DelimiterSet::default();
        let nested_rep = ValueNode::Repeated(vec![ValueNode::Repeated(vec![leaf("A")])]);
        assert!(encode(&nested_rep, &ds).is_err());

        let rep_in_comp = comp(vec![ValueNode::Repeated(vec![leaf("A"), leaf("B")])]);
        assert!(encode(&rep_in_comp, &ds).is_err());

        let too_deep = comp(vec![comp(vec![comp(vec![leaf("A")])])]);
        assert!(encode(&too_deep, &ds).is_err());
    }

    #[test]
    fn test_round_trip_canonical_trees() {
        let custom = DelimiterSet::new('#', ':', '*', '!', '@').unwrap();
        let trees = vec![
            leaf("plain"),
            leaf(""),
            comp(vec![leaf("ID"), leaf("5"), leaf("M11")]),
            comp(vec![leaf(""), leaf("x")]),
            comp(vec![comp(vec![leaf("A"), leaf("B")])]),
            comp(vec![
                leaf("Manning"),
                leaf(""),
                comp(vec![leaf(""), leaf("7654321"), leaf("UPIN")]),
            ]),
            ValueNode::Repeated(vec![leaf("a"), leaf("b")]),
            ValueNode::Repeated(vec![
                leaf(""),
                comp(vec![leaf("x"), comp(vec![leaf("y"), leaf("z")])]),
                comp(vec![comp(vec![leaf("s1"), leaf("s2")])]),
            ]),
        ];
        for ds in [DelimiterSet::default(), custom] {
            for tree in &trees {
                let wire = encode(tree, &ds).unwrap();
                assert_eq!(&decode(&wire, &ds), tree, "wire {wire:?}");
            }
        }
    }
}
