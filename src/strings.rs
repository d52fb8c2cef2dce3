use crate::ctype::{ispunct, isspace};
use crate::entity;

pub fn is_line_end_char(ch: u8) -> bool {
    matches!(ch, b'\n' | b'\r')
}

pub fn is_space_or_tab(ch: u8) -> bool {
    matches!(ch, b'\t' | b' ')
}

pub fn is_blank(s: &str) -> bool {
    for c in s.bytes() {
        match c {
            b'\n' | b'\r' => return true,
            b' ' | b'\t' => (),
            _ => return false,
        }
    }
    true
}

/// Removes backslashes that escape ASCII punctuation, in place.
pub fn unescape(s: &mut String) {
    let bytes = s.as_bytes();
    let mut first = None;
    for i in 0..bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() && ispunct(bytes[i + 1]) {
            first = Some(i);
            break;
        }
    }
    let first = match first {
        Some(first) => first,
        None => return,
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let bytes = s.as_bytes();
    let mut i = first;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() && ispunct(bytes[i + 1]) {
            i += 1;
        }
        let start = i;
        i += 1;
        while i < bytes.len() && !(bytes[i] == b'\\' && i + 1 < bytes.len() && ispunct(bytes[i + 1]))
        {
            i += 1;
        }
        out.push_str(&s[start..i]);
    }
    *s = out;
}

pub fn ltrim(s: &mut String) {
    let spaces = s.bytes().take_while(|&b| isspace(b)).count();
    s.replace_range(..spaces, "");
}

pub fn rtrim(s: &mut String) {
    let spaces = s.bytes().rev().take_while(|&b| isspace(b)).count();
    let new_len = s.len() - spaces;
    s.truncate(new_len);
}

pub fn trim(s: &mut String) {
    ltrim(s);
    rtrim(s);
}

pub fn ltrim_slice(mut s: &str) -> &str {
    while let Some(first) = s.as_bytes().first() {
        if isspace(*first) {
            s = &s[1..];
        } else {
            break;
        }
    }
    s
}

pub fn rtrim_slice(mut s: &str) -> &str {
    while let Some(last) = s.as_bytes().last() {
        if isspace(*last) {
            s = &s[..s.len() - 1];
        } else {
            break;
        }
    }
    s
}

pub fn trim_slice(s: &str) -> &str {
    rtrim_slice(ltrim_slice(s))
}

/// Strips a closing ATX sequence (` ###`) from the end of a heading line.
pub fn chop_trailing_hashtags(line: &mut String) {
    rtrim(line);
    if line.is_empty() {
        return;
    }

    let bytes = line.as_bytes();
    let orig_n = bytes.len() - 1;
    let mut n = orig_n;
    while bytes[n] == b'#' {
        if n == 0 {
            return;
        }
        n -= 1;
    }

    if n != orig_n && is_space_or_tab(bytes[n]) {
        line.truncate(n);
        rtrim(line);
    }
}

pub fn remove_trailing_blank_lines(s: &mut String) {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return;
    }
    let mut i = bytes.len() - 1;
    loop {
        let c = bytes[i];
        if c != b' ' && c != b'\t' && !is_line_end_char(c) {
            break;
        }
        if i == 0 {
            s.clear();
            return;
        }
        i -= 1;
    }

    for (ix, c) in s.bytes().enumerate().skip(i) {
        if is_line_end_char(c) {
            s.truncate(ix);
            return;
        }
    }
}

/// Collapses interior line endings to spaces and strips one leading and
/// trailing space, per the code span rules.
pub fn normalize_code(s: &str) -> String {
    let mut v = Vec::with_capacity(s.len());
    let mut contains_nonspace = false;
    let bytes = s.as_bytes();

    for (i, &c) in bytes.iter().enumerate() {
        match c {
            b'\r' => {
                if i + 1 == s.len() || bytes[i + 1] != b'\n' {
                    v.push(b' ');
                }
            }
            b'\n' => v.push(b' '),
            _ => v.push(c),
        }
        if c != b' ' && !is_line_end_char(c) {
            contains_nonspace = true;
        }
    }

    // Only ASCII line endings were replaced, each with an ASCII space.
    let mut r = unsafe { String::from_utf8_unchecked(v) };

    if contains_nonspace && r.starts_with(' ') && r.ends_with(' ') {
        r.pop();
        r.remove(0);
    }

    r
}

/// Case-folds a link label and collapses its internal whitespace, producing
/// the canonical form used as a definition map key.
pub fn normalize_label(s: &str) -> String {
    let folded = caseless::default_case_fold_str(trim_slice(s));

    let mut v = String::with_capacity(folded.len());
    let mut last_was_whitespace = false;
    for c in folded.chars() {
        if c.is_whitespace() {
            if !last_was_whitespace {
                last_was_whitespace = true;
                v.push(' ');
            }
        } else {
            last_was_whitespace = false;
            v.push(c);
        }
    }
    v
}

pub fn clean_url(url: &str) -> String {
    let url = trim_slice(url);
    if url.is_empty() {
        return String::new();
    }

    let mut b = entity::unescape_html(url);
    unescape(&mut b);
    b
}

pub fn clean_title(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    let bytes = title.as_bytes();
    let first = bytes[0];
    let last = bytes[bytes.len() - 1];

    let mut b = if (first == b'\'' && last == b'\'')
        || (first == b'(' && last == b')')
        || (first == b'"' && last == b'"')
    {
        entity::unescape_html(&title[1..title.len() - 1])
    } else {
        entity::unescape_html(title)
    };

    unescape(&mut b);
    b
}

pub fn clean_autolink(url: &str, email: bool) -> String {
    let url = trim_slice(url);
    if url.is_empty() {
        return String::new();
    }

    let mut buf = String::with_capacity(url.len());
    if email {
        buf.push_str("mailto:");
    }
    buf.push_str(&entity::unescape_html(url));
    buf
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn unescape_removes_punct_escapes() {
        let mut s = "a\\*b\\\\c\\d".to_string();
        unescape(&mut s);
        assert_eq!(s, "a*b\\c\\d");
    }

    #[test]
    fn normalize_code_handles_lone_newline() {
        assert_eq!(normalize_code("\n"), " ");
    }

    #[test]
    fn normalize_code_handles_lone_space() {
        assert_eq!(normalize_code(" "), " ");
    }

    #[test]
    fn normalize_code_strips_one_flanking_space() {
        assert_eq!(normalize_code(" `code` "), "`code`");
        assert_eq!(normalize_code("  "), "  ");
    }

    #[test]
    fn label_folding_collapses_whitespace() {
        assert_eq!(normalize_label("  FoO \t\n Bar  "), "foo bar");
    }

    #[test]
    fn label_folding_is_unicode_aware() {
        assert_eq!(normalize_label("ẞ"), normalize_label("ss"));
    }

    #[test]
    fn chop_hashtags() {
        let mut s = "Hi ###".to_string();
        chop_trailing_hashtags(&mut s);
        assert_eq!(s, "Hi");
        let mut s = "Hi#".to_string();
        chop_trailing_hashtags(&mut s);
        assert_eq!(s, "Hi#");
    }
}
