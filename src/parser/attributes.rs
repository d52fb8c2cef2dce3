//! The `{#id .class key=value}` attribute block parser.
//!
//! The block must open and close on one line. Entries are separated by
//! spaces or tabs: `#id` sets the id (last one wins), `.class` appends a
//! class, `key=value` sets a property with a bare or quoted value, and a
//! bare `key` sets an empty-valued property. Anything else invalidates the
//! whole block, which then reads as literal text.

use crate::nodes::NodeAttributes;
use crate::strings;

/// Tries to parse an attribute block at the start of `input`, which must
/// begin with `{`. Returns the attributes and the bytes consumed,
/// including both braces.
pub fn parse_attribute_block(input: &str) -> Option<(NodeAttributes, usize)> {
    let bytes = input.as_bytes();
    if bytes.first() != Some(&b'{') {
        return None;
    }

    let mut attributes = NodeAttributes::default();
    let mut pos = 1;

    loop {
        while pos < bytes.len() && strings::is_space_or_tab(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() || strings::is_line_end_char(bytes[pos]) {
            return None;
        }
        if bytes[pos] == b'}' {
            return Some((attributes, pos + 1));
        }

        match bytes[pos] {
            b'#' => {
                let name = scan_name(&input[pos + 1..])?;
                attributes.id = Some(name.to_string());
                pos += 1 + name.len();
            }
            b'.' => {
                let name = scan_name(&input[pos + 1..])?;
                attributes.classes.push(name.to_string());
                pos += 1 + name.len();
            }
            _ => {
                let key = scan_name(&input[pos..])?;
                pos += key.len();
                if bytes.get(pos) == Some(&b'=') {
                    pos += 1;
                    let (value, consumed) = scan_value(&input[pos..])?;
                    attributes.properties.push((key.to_string(), value));
                    pos += consumed;
                } else {
                    attributes.properties.push((key.to_string(), String::new()));
                }
            }
        }

        // Entries must be separated.
        if pos < bytes.len()
            && bytes[pos] != b'}'
            && !strings::is_space_or_tab(bytes[pos])
        {
            return None;
        }
    }
}

/// Tries to parse a trailing attribute block: optional spaces, the block,
/// then nothing but spaces to the end of `tail`. Returns the attributes
/// and the offset within `tail` at which the block starts.
pub fn parse_trailing_attributes(tail: &str) -> Option<(NodeAttributes, usize)> {
    let open = tail.rfind('{')?;
    let (attributes, consumed) = parse_attribute_block(&tail[open..])?;
    if !strings::is_blank(&tail[open + consumed..]) {
        return None;
    }
    // Only spaces may precede the block (or it must start the tail).
    if !tail[..open].is_empty() && !tail[..open].ends_with(|c| c == ' ' || c == '\t') {
        return None;
    }
    Some((attributes, open))
}

fn scan_name(input: &str) -> Option<&str> {
    let len = input
        .bytes()
        .take_while(|&b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':'))
        .count();
    if len == 0 {
        None
    } else {
        Some(&input[..len])
    }
}

fn scan_value(input: &str) -> Option<(String, usize)> {
    let bytes = input.as_bytes();
    match bytes.first() {
        Some(&q) if q == b'"' || q == b'\'' => {
            let close = input[1..].find(q as char)?;
            if input[1..1 + close].contains('\n') {
                return None;
            }
            Some((input[1..1 + close].to_string(), close + 2))
        }
        Some(_) => {
            let len = input
                .bytes()
                .take_while(|&b| {
                    !strings::is_space_or_tab(b) && !strings::is_line_end_char(b) && b != b'}'
                })
                .count();
            if len == 0 {
                None
            } else {
                Some((input[..len].to_string(), len))
            }
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_class_and_properties() {
        let (attrs, consumed) =
            parse_attribute_block("{#intro .wide .lead align=center data-x=\"a b\"}").unwrap();
        assert_eq!(consumed, 46);
        assert_eq!(attrs.id.as_deref(), Some("intro"));
        assert_eq!(attrs.classes, vec!["wide", "lead"]);
        assert_eq!(
            attrs.properties,
            vec![
                ("align".to_string(), "center".to_string()),
                ("data-x".to_string(), "a b".to_string())
            ]
        );
    }

    #[test]
    fn last_id_wins() {
        let (attrs, _) = parse_attribute_block("{#a #b}").unwrap();
        assert_eq!(attrs.id.as_deref(), Some("b"));
    }

    #[test]
    fn unterminated_is_invalid() {
        assert!(parse_attribute_block("{#a\n}").is_none());
        assert!(parse_attribute_block("{#a").is_none());
        assert!(parse_attribute_block("{#}").is_none());
    }

    #[test]
    fn trailing_block() {
        let tail = "Heading text {#here}  \n";
        let (attrs, open) = parse_trailing_attributes(tail).unwrap();
        assert_eq!(attrs.id.as_deref(), Some("here"));
        assert_eq!(open, 13);
        assert!(parse_trailing_attributes("a {#x} b\n").is_none());
    }
}
