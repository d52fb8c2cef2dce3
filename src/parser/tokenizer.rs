//! The block tokenizer.
//!
//! [`Line`] carries one physical line plus the scan state that container
//! processors mutate as they strip their prefixes: byte offset, tab-aware
//! column, first-nonspace position, indent and blankness. [`classify`]
//! recognizes the structural token starting at the first nonspace byte,
//! in fixed priority order.

use crate::ctype::isdigit;
use crate::parser::options::ParseOptions;
use crate::scanners::{self, SetextChar};
use crate::strings;
use crate::nodes::{ListDelimType, ListStyle, ListType, NodeList};
use std::cmp::min;

pub const TAB_STOP: usize = 4;
pub const CODE_INDENT: usize = 4;

// Enough for "mmmcmxcix."; longer letter runs are not list markers.
const MAX_MARKER_LETTERS: usize = 12;

/// One physical line under examination. The text always ends with a
/// newline; the parser feeds a rebuilt copy of the final line if the
/// source lacks one.
#[derive(Debug)]
pub struct Line<'s> {
    pub text: &'s str,

    /// Absolute source offset of `text[0]`.
    pub start_offset: usize,

    pub offset: usize,
    pub column: usize,
    pub first_nonspace: usize,
    pub first_nonspace_column: usize,
    pub indent: usize,
    pub blank: bool,
    pub partially_consumed_tab: bool,
}

impl<'s> Line<'s> {
    pub fn new(text: &'s str, start_offset: usize) -> Line<'s> {
        assert!(text.ends_with('\n'));
        let mut line = Line {
            text,
            start_offset,
            offset: 0,
            column: 0,
            first_nonspace: 0,
            first_nonspace_column: 0,
            indent: 0,
            blank: false,
            partially_consumed_tab: false,
        };
        line.find_first_nonspace();
        line
    }

    pub fn find_first_nonspace(&mut self) {
        let mut chars_to_tab = TAB_STOP - (self.column % TAB_STOP);

        if self.first_nonspace <= self.offset {
            self.first_nonspace = self.offset;
            self.first_nonspace_column = self.column;

            let bytes = self.text.as_bytes();
            loop {
                match bytes[self.first_nonspace] {
                    b' ' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += 1;
                        chars_to_tab -= 1;
                        if chars_to_tab == 0 {
                            chars_to_tab = TAB_STOP;
                        }
                    }
                    b'\t' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += chars_to_tab;
                        chars_to_tab = TAB_STOP;
                    }
                    _ => break,
                }
            }
        }

        self.indent = self.first_nonspace_column - self.column;
        self.blank = strings::is_line_end_char(self.text.as_bytes()[self.first_nonspace]);
    }

    /// Consumes `count` bytes, or `count` columns when `columns` is set, in
    /// which case a tab may be left partially consumed.
    pub fn advance_offset(&mut self, mut count: usize, columns: bool) {
        let bytes = self.text.as_bytes();
        while count > 0 {
            match bytes[self.offset] {
                b'\t' => {
                    let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
                    if columns {
                        self.partially_consumed_tab = chars_to_tab > count;
                        let chars_to_advance = min(count, chars_to_tab);
                        self.column += chars_to_advance;
                        self.offset += if self.partially_consumed_tab { 0 } else { 1 };
                        count -= chars_to_advance;
                    } else {
                        self.partially_consumed_tab = false;
                        self.column += chars_to_tab;
                        self.offset += 1;
                        count -= 1;
                    }
                }
                _ => {
                    self.partially_consumed_tab = false;
                    self.offset += 1;
                    self.column += 1;
                    count -= 1;
                }
            }
        }
    }

    pub fn advance_to_first_nonspace(&mut self) {
        self.advance_offset(self.first_nonspace - self.offset, false);
    }

    pub fn is_indented(&self) -> bool {
        self.indent >= CODE_INDENT
    }

    /// The byte at the first nonspace position.
    pub fn peek(&self) -> u8 {
        self.text.as_bytes()[self.first_nonspace]
    }

    pub fn rest(&self) -> &'s str {
        &self.text[self.offset..]
    }

    pub fn from_first_nonspace(&self) -> &'s str {
        &self.text[self.first_nonspace..]
    }

    /// Maps a line-relative byte position to an absolute source offset.
    pub fn source_offset(&self, rel: usize) -> usize {
        self.start_offset + rel
    }

    /// Line length without the trailing line ending.
    pub fn len_without_ending(&self) -> usize {
        let mut len = self.text.len() - 1;
        if len > 0 && self.text.as_bytes()[len - 1] == b'\r' {
            len -= 1;
        }
        len
    }
}

/// A structural token recognized at the first nonspace position.
#[derive(Debug)]
pub enum BlockToken {
    /// A `>` block quote marker.
    QuoteMarker,

    /// An ATX heading opener; `consumed` covers the `#` run and any
    /// following spaces.
    AtxHeading { level: u8, consumed: usize },

    /// A Setext underline under an open paragraph.
    SetextUnderline { level: u8 },

    /// An opening fence: code (`` ` ``/`~`), math (`$`) or custom
    /// container (`:`).
    Fence(FenceToken),

    ThematicBreak,

    /// A `[^name]:` footnote definition opener.
    FootnoteLabel { name: String, consumed: usize },

    /// The start of an HTML block of the given kind.
    HtmlBlockStart { kind: u8 },

    /// A list item marker. Spacing after the marker is resolved by the
    /// block starter, which knows the column context.
    ListMarker(ListMarkerToken),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    Code,
    Math,
    Container,
}

#[derive(Debug)]
pub struct FenceToken {
    pub kind: FenceKind,
    pub ch: u8,
    pub length: usize,
}

#[derive(Debug)]
pub struct ListMarkerToken {
    /// Partially-populated list data: type, style, start, delimiter and
    /// bullet character. Offsets and padding are filled in later.
    pub list: NodeList,

    /// Bytes from the first nonspace to just past the marker's delimiter.
    pub marker_len: usize,
}

/// Context the classifier needs beyond the line itself.
#[derive(Debug, Default)]
pub struct ClassifyContext {
    /// Whether an open paragraph directly precedes, making Setext
    /// underlines possible and restricting what may interrupt.
    pub in_paragraph: bool,
}

/// Recognizes the structural token at the line's first nonspace position.
///
/// Priority is fixed: quote marker, ATX heading, fence, HTML block, Setext
/// underline, thematic break, footnote label, list marker. A Setext
/// underline beats a thematic break (`---` under a paragraph is a heading),
/// and a thematic break beats a list marker (`- - -` is a break, not a
/// bullet). Indented lines produce no token.
pub fn classify(line: &Line, options: &ParseOptions, ctx: &ClassifyContext) -> Option<BlockToken> {
    if line.is_indented() || line.blank {
        return None;
    }

    let head = line.from_first_nonspace();
    let bytes = head.as_bytes();

    if bytes[0] == b'>' {
        return Some(BlockToken::QuoteMarker);
    }

    if let Some(consumed) = scanners::atx_heading_start(bytes) {
        let level = bytes.iter().take_while(|&&b| b == b'#').count() as u8;
        return Some(BlockToken::AtxHeading { level, consumed });
    }

    if let Some(fence) = scan_fence(head, options) {
        return Some(BlockToken::Fence(fence));
    }

    if let Some(kind) = scan_html_block_start(bytes, ctx.in_paragraph) {
        return Some(BlockToken::HtmlBlockStart { kind });
    }

    if ctx.in_paragraph {
        if let Some(ch) = scanners::setext_heading_line(bytes) {
            let level = match ch {
                SetextChar::Equals => 1,
                SetextChar::Hyphen => 2,
            };
            return Some(BlockToken::SetextUnderline { level });
        }
    }

    if scanners::thematic_break(bytes).is_some() {
        return Some(BlockToken::ThematicBreak);
    }

    if options.footnotes {
        if let Some(consumed) = scanners::footnote_definition(bytes) {
            let close = head[2..].find(']').unwrap() + 2;
            return Some(BlockToken::FootnoteLabel {
                name: head[2..close].to_string(),
                consumed,
            });
        }
    }

    if let Some(token) = scan_list_marker(head, options, ctx.in_paragraph) {
        return Some(BlockToken::ListMarker(token));
    }

    None
}

fn scan_fence(head: &str, options: &ParseOptions) -> Option<FenceToken> {
    let bytes = head.as_bytes();
    let ch = bytes[0];
    // Only ASCII fence characters; anything else may be mid-codepoint.
    if !matches!(ch, b'`' | b'~' | b'$' | b':') {
        return None;
    }
    let length = bytes.iter().take_while(|&&b| b == ch).count();
    let rest = &head[length..];

    match ch {
        b'`' | b'~' if length >= 3 => {
            // An info string on a backtick fence cannot contain backticks.
            if ch == b'`' && rest.contains('`') {
                None
            } else {
                Some(FenceToken {
                    kind: FenceKind::Code,
                    ch,
                    length,
                })
            }
        }
        b'$' if options.math && length >= 2 => {
            if strings::is_blank(rest) {
                Some(FenceToken {
                    kind: FenceKind::Math,
                    ch,
                    length,
                })
            } else {
                None
            }
        }
        b':' if options.custom_containers && length >= 3 => Some(FenceToken {
            kind: FenceKind::Container,
            ch,
            length,
        }),
        _ => None,
    }
}

fn scan_html_block_start(bytes: &[u8], in_paragraph: bool) -> Option<u8> {
    scanners::html_block_start(bytes).or_else(|| {
        if in_paragraph {
            None
        } else {
            scanners::html_block_start_7(bytes)
        }
    })
}

/// Recognizes a list marker: a bullet, a decimal ordinal, or (with
/// `extra_list_styles`) an alphabetic, Roman or Greek ordinal, followed by
/// its delimiter and at least one space.
fn scan_list_marker(
    head: &str,
    options: &ParseOptions,
    interrupts_paragraph: bool,
) -> Option<ListMarkerToken> {
    let bytes = head.as_bytes();
    let c = bytes[0];

    if c == b'*' || c == b'-' || c == b'+' {
        if !crate::ctype::isspace(bytes[1]) {
            return None;
        }
        if interrupts_paragraph && following_blank(head, 1) {
            return None;
        }
        return Some(ListMarkerToken {
            list: NodeList {
                list_type: ListType::Bullet,
                bullet_char: c,
                tight: false,
                ..NodeList::default()
            },
            marker_len: 1,
        });
    }

    if isdigit(c) {
        let mut pos = 0;
        let mut start: usize = 0;
        while pos < 9 && isdigit(bytes[pos]) {
            start = start * 10 + (bytes[pos] - b'0') as usize;
            pos += 1;
        }
        if isdigit(bytes[pos]) {
            return None;
        }
        return finish_ordered_marker(head, pos, start, ListStyle::Decimal, interrupts_paragraph);
    }

    if !options.extra_list_styles {
        return None;
    }

    if c.is_ascii_alphabetic() {
        let lower = c.is_ascii_lowercase();
        let mut pos = 0;
        while pos < MAX_MARKER_LETTERS && bytes[pos].is_ascii_alphabetic() {
            if bytes[pos].is_ascii_lowercase() != lower {
                return None;
            }
            pos += 1;
        }
        if bytes[pos].is_ascii_alphabetic() {
            return None;
        }

        let marker = &head[..pos];
        let (style, start) = if pos == 1 {
            // A lone `i` resolves as Roman; any other single letter is
            // alphabetic. Later markers may downgrade the Roman choice.
            match c {
                b'i' => (ListStyle::LowerRoman, 1),
                b'I' => (ListStyle::UpperRoman, 1),
                _ => {
                    let style = if lower {
                        ListStyle::LowerAlpha
                    } else {
                        ListStyle::UpperAlpha
                    };
                    (style, (c.to_ascii_lowercase() - b'a') as usize + 1)
                }
            }
        } else {
            let style = if lower {
                ListStyle::LowerRoman
            } else {
                ListStyle::UpperRoman
            };
            (style, roman_value(marker)?)
        };
        return finish_ordered_marker(head, pos, start, style, interrupts_paragraph);
    }

    let first = head.chars().next().unwrap();
    if let Some(start) = greek_value(first) {
        return finish_ordered_marker(
            head,
            first.len_utf8(),
            start,
            ListStyle::LowerGreek,
            interrupts_paragraph,
        );
    }

    None
}

fn finish_ordered_marker(
    head: &str,
    mut pos: usize,
    start: usize,
    style: ListStyle,
    interrupts_paragraph: bool,
) -> Option<ListMarkerToken> {
    if interrupts_paragraph && start != 1 {
        return None;
    }

    let bytes = head.as_bytes();
    let delimiter = match bytes[pos] {
        b'.' => ListDelimType::Period,
        b')' => ListDelimType::Paren,
        _ => return None,
    };
    pos += 1;

    if !crate::ctype::isspace(bytes[pos]) {
        return None;
    }
    if interrupts_paragraph && following_blank(head, pos) {
        return None;
    }

    Some(ListMarkerToken {
        list: NodeList {
            list_type: ListType::Ordered,
            style,
            start,
            delimiter,
            tight: false,
            ..NodeList::default()
        },
        marker_len: pos,
    })
}

// An empty list item cannot interrupt a paragraph.
fn following_blank(head: &str, mut pos: usize) -> bool {
    let bytes = head.as_bytes();
    while strings::is_space_or_tab(bytes[pos]) {
        pos += 1;
    }
    strings::is_line_end_char(bytes[pos])
}

/// Parses a run of Roman numeral letters, in either case.
pub fn roman_value(s: &str) -> Option<usize> {
    let mut total: i64 = 0;
    let mut prev = 0;
    for c in s.chars().rev() {
        let v: i64 = match c.to_ascii_lowercase() {
            'i' => 1,
            'v' => 5,
            'x' => 10,
            'l' => 50,
            'c' => 100,
            'd' => 500,
            'm' => 1000,
            _ => return None,
        };
        if v < prev {
            total -= v;
        } else {
            total += v;
            prev = v;
        }
    }
    if total > 0 {
        Some(total as usize)
    } else {
        None
    }
}

/// Whether every character of `s` could continue a Roman marker.
pub fn is_roman_letters(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| "ivxlcdmIVXLCDM".contains(c))
}

/// The ordinal of a lowercase Greek letter; `ς` is a positional variant of
/// `σ` and does not number.
fn greek_value(c: char) -> Option<usize> {
    if c == 'ς' || !('α'..='ω').contains(&c) {
        return None;
    }
    let v = c as usize - 'α' as usize + 1;
    Some(if c > 'ς' { v - 1 } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(head: &str) -> Option<(ListStyle, usize)> {
        let mut options = ParseOptions::default();
        options.extra_list_styles = true;
        scan_list_marker(head, &options, false).map(|t| (t.list.style, t.list.start))
    }

    #[test]
    fn decimal_markers() {
        assert_eq!(marker("12. x\n"), Some((ListStyle::Decimal, 12)));
        assert_eq!(marker("1234567890. x\n"), None);
        assert_eq!(marker("3) x\n"), Some((ListStyle::Decimal, 3)));
        assert_eq!(marker("3:x\n"), None);
    }

    #[test]
    fn single_i_is_roman() {
        assert_eq!(marker("i. x\n"), Some((ListStyle::LowerRoman, 1)));
        assert_eq!(marker("I. x\n"), Some((ListStyle::UpperRoman, 1)));
        assert_eq!(marker("v. x\n"), Some((ListStyle::LowerAlpha, 22)));
    }

    #[test]
    fn multi_letter_roman() {
        assert_eq!(marker("iv. x\n"), Some((ListStyle::LowerRoman, 4)));
        assert_eq!(marker("MCM. x\n"), Some((ListStyle::UpperRoman, 1900)));
        assert_eq!(marker("ab. x\n"), None);
        assert_eq!(marker("iV. x\n"), None);
    }

    #[test]
    fn fences_reject_multibyte_heads() {
        let mut options = ParseOptions::default();
        options.custom_containers = true;
        assert!(scan_fence("été\n", &options).is_none());
        assert!(scan_fence("α\n", &options).is_none());
        assert!(scan_fence(":::\n", &options).is_some());
    }

    #[test]
    fn greek_markers() {
        assert_eq!(marker("α. x\n"), Some((ListStyle::LowerGreek, 1)));
        assert_eq!(marker("ω. x\n"), Some((ListStyle::LowerGreek, 24)));
        assert_eq!(marker("ς. x\n"), None);
    }

    #[test]
    fn roman_values() {
        assert_eq!(roman_value("iii"), Some(3));
        assert_eq!(roman_value("xlii"), Some(42));
        assert_eq!(roman_value("q"), None);
    }
}
