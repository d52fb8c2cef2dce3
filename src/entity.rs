use std::char;
use std::cmp::min;

use crate::ctype::isdigit;

include!(concat!(env!("OUT_DIR"), "/entitydata.rs"));

fn isxdigit(ch: u8) -> bool {
    ch.is_ascii_hexdigit()
}

/// Tries to decode one entity at the start of `text`, which begins just
/// after an `&`. Returns the replacement and the number of bytes consumed
/// (including the terminating `;`).
pub fn unescape(text: &str) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    if text.len() >= 3 && bytes[0] == b'#' {
        let mut codepoint: u32 = 0;
        let mut i = 0;

        let num_digits = if isdigit(bytes[1]) {
            i = 1;
            while i < text.len() && isdigit(bytes[i]) {
                codepoint = (codepoint * 10) + (bytes[i] as u32 - '0' as u32);
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 1
        } else if bytes[1] == b'x' || bytes[1] == b'X' {
            i = 2;
            while i < text.len() && isxdigit(bytes[i]) {
                codepoint = (codepoint * 16) + ((bytes[i] as u32 | 32) % 39 - 9);
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 2
        } else {
            0
        };

        if (1..=8).contains(&num_digits) && i < text.len() && bytes[i] == b';' {
            if codepoint == 0 || (0xD800..=0xE000).contains(&codepoint) || codepoint >= 0x11_0000 {
                codepoint = 0xFFFD;
            }
            return Some((
                char::from_u32(codepoint).unwrap_or('\u{FFFD}').to_string(),
                i + 1,
            ));
        }
    }

    let size = min(text.len(), entitydata::MAX_LENGTH + 1);
    for i in entitydata::MIN_LENGTH..size {
        if bytes[i] == b' ' {
            return None;
        }
        if bytes[i] == b';' {
            return lookup(&text[..i]).map(|e| (e.to_string(), i + 1));
        }
    }

    None
}

fn lookup(name: &str) -> Option<&'static str> {
    entitydata::NAMED_ENTITIES
        .binary_search_by(|(probe, _)| (*probe).cmp(name))
        .ok()
        .map(|ix| entitydata::NAMED_ENTITIES[ix].1)
}

/// Replaces every decodable entity in `src`.
pub fn unescape_html(src: &str) -> String {
    let bytes = src.as_bytes();
    let size = src.len();
    let mut i = 0;
    let mut v = String::new();

    while i < size {
        let org = i;
        while i < size && bytes[i] != b'&' {
            i += 1;
        }

        if i > org {
            if org == 0 && i >= size {
                return src.to_string();
            }
            v.push_str(&src[org..i]);
        }

        if i >= size {
            return v;
        }

        i += 1;
        match unescape(&src[i..]) {
            Some((chs, consumed)) => {
                v.push_str(&chs);
                i += consumed;
            }
            None => v.push('&'),
        }
    }

    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named() {
        assert_eq!(unescape_html("&amp;"), "&");
        assert_eq!(unescape_html("&copy;x"), "©x");
        assert_eq!(unescape_html("&xyzzy;"), "&xyzzy;");
        assert_eq!(unescape_html("&amp"), "&amp");
    }

    #[test]
    fn numeric() {
        assert_eq!(unescape_html("&#65;"), "A");
        assert_eq!(unescape_html("&#x41;"), "A");
        assert_eq!(unescape_html("&#0;"), "\u{FFFD}");
        assert_eq!(unescape_html("&#11111111;"), "\u{FFFD}");
        // More than eight digits is not a numeric reference at all.
        assert_eq!(unescape_html("&#999999999;"), "&#999999999;");
    }
}
