use crate::codec::Frame;
use crate::error::{FrameError, Result};

/// On-wire tags whose spelling is not a valid output key, with the key
/// used in their place.
pub const TAG_ALIASES: &[(&str, &str)] = &[
    ("SMAXSN-1", "SMAXSN1"),
    ("SMAXIN-1", "SMAXIN1"),
    ("CCASN-1", "CCASN1"),
    ("CCAIN-1", "CCAIN1"),
];

/// Canonical output key for a raw tag. Tags outside the alias table are
/// already canonical and come back unchanged.
pub fn canonical_tag(raw: &str) -> &str {
    TAG_ALIASES
        .iter()
        .find(|(wire, _)| *wire == raw)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(raw)
}

/// One tag/value pair extracted from a validated frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    /// Canonical tag.
    pub tag: String,
    /// Value fields joined by single spaces.
    pub value: String,
}

/// Split a validated frame into its canonical tag and value.
///
/// Fields are separated by the field separator or by runs of spaces, so
/// free-text values collapse to single-spaced words and multi-field
/// values (timestamp plus reading) come back as one string.
pub fn parse(frame: &Frame) -> Result<TagValue> {
    let text = String::from_utf8_lossy(frame.checksum_scope());
    let tokens: Vec<&str> = text.split_ascii_whitespace().collect();
    if tokens.len() < 2 {
        return Err(FrameError::Malformed {
            tokens: tokens.len(),
        });
    }

    Ok(TagValue {
        tag: canonical_tag(tokens[0]).to_string(),
        value: tokens[1..].join(" "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_line(line: &[u8]) -> Result<TagValue> {
        parse(&Frame::from_line(line))
    }

    #[test]
    fn single_value() {
        let tv = parse_line(b"\nSINSTS\t00290\tQ\r").unwrap();
        assert_eq!(tv.tag, "SINSTS");
        assert_eq!(tv.value, "00290");
    }

    #[test]
    fn timestamped_value_joins_fields() {
        let tv = parse_line(b"\nSMAXSN\tE210616063541\t06180\t<\r").unwrap();
        assert_eq!(tv.value, "E210616063541 06180");
    }

    #[test]
    fn free_text_collapses_spaces() {
        let tv = parse_line(b"\nMSG1\tPAS DE          MESSAGE         \t<\r").unwrap();
        assert_eq!(tv.tag, "MSG1");
        assert_eq!(tv.value, "PAS DE MESSAGE");
    }

    #[test]
    fn empty_trailing_field_is_ignored() {
        let tv = parse_line(b"\nDATE\tE210616150030\t\t7\r").unwrap();
        assert_eq!(tv.value, "E210616150030");
    }

    #[test]
    fn space_checksum_is_not_mistaken_for_a_separator() {
        // "X\tV\t" sums to 192, so the checksum byte is 0x20.
        let frame = Frame::from_line(b"\nX\tV\t \r");
        assert!(crate::checksum::check(&frame));

        let tv = parse(&frame).unwrap();
        assert_eq!(tv.tag, "X");
        assert_eq!(tv.value, "V");
    }

    #[test]
    fn aliased_tag_is_canonicalised() {
        let tv = parse_line(b"\nSMAXSN-1\tE210615115407\t07200\tR\r").unwrap();
        assert_eq!(tv.tag, "SMAXSN1");
        assert_eq!(tv.value, "E210615115407 07200");
    }

    #[test]
    fn alias_is_idempotent() {
        assert_eq!(canonical_tag("SMAXIN-1"), "SMAXIN1");
        assert_eq!(canonical_tag(canonical_tag("SMAXIN-1")), "SMAXIN1");
        assert_eq!(canonical_tag("SMAXIN1"), "SMAXIN1");
        assert_eq!(canonical_tag("SINSTS"), "SINSTS");
    }

    #[test]
    fn tag_without_value_is_malformed() {
        let err = parse_line(b"\nADSC\t$\r").unwrap_err();
        assert!(matches!(err, FrameError::Malformed { tokens: 1 }));
    }

    #[test]
    fn empty_frame_is_malformed() {
        let err = parse_line(b"\r").unwrap_err();
        assert!(matches!(err, FrameError::Malformed { tokens: 0 }));
    }
}
