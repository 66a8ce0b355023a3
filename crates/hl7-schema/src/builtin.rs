//! Message schemas embedded in the crate

/// Message types with a built-in schema
pub const BUILTIN_MESSAGE_TYPES: &[&str] = &[
    "ADT_A01", "ADT_A04", "DFT_P03", "MFN_M02", "ORU_R01", "SIU_S12",
];

/// Raw JSON of a built-in schema
#[must_use]
pub fn source(message_type: &str) -> Option<&'static str> {
    let json = match message_type {
        "ADT_A01" => include_str!("../data/messages/ADT_A01.json"),
        "ADT_A04" => include_str!("../data/messages/ADT_A04.json"),
        "DFT_P03" => include_str!("../data/messages/DFT_P03.json"),
        "MFN_M02" => include_str!("../data/messages/MFN_M02.json"),
        "ORU_R01" => include_str!("../data/messages/ORU_R01.json"),
        "SIU_S12" => include_str!("../data/messages/SIU_S12.json"),
        _ => return None,
    };
    Some(json)
}
