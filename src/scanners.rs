//! Single-construct scanners.
//!
//! Each function tries to match exactly one syntactic construct at the start
//! of its input and reports the number of bytes matched. They do no
//! tree-building; callers decide what a match means.

use lazy_static::lazy_static;
use regex::bytes::Regex;

fn search(re: &Regex, line: &[u8]) -> Option<usize> {
    re.find(line).map(|m| m.end() - m.start())
}

fn is_match(re: &Regex, line: &[u8]) -> bool {
    re.is_match(line)
}

pub fn atx_heading_start(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"\A#{1,6}(?:[ \t]+|[\r\n])").unwrap();
    }
    search(&RE, line)
}

#[derive(PartialEq, Eq, Copy, Clone)]
pub enum SetextChar {
    Equals,
    Hyphen,
}

pub fn setext_heading_line(line: &[u8]) -> Option<SetextChar> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"\A(?:=+|-+)[ \t]*[\r\n]").unwrap();
    }

    if is_match(&RE, line) {
        if line[0] == b'=' {
            Some(SetextChar::Equals)
        } else {
            Some(SetextChar::Hyphen)
        }
    } else {
        None
    }
}

pub fn thematic_break(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex =
            Regex::new(r"\A(?:(\*[ \t]*){3,}|(_[ \t]*){3,}|(-[ \t]*){3,})[ \t]*[\r\n]").unwrap();
    }
    search(&RE, line)
}

pub fn footnote_definition(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"\A\[\^([^\]\r\n\x00\t]+)\]:[ \t]*").unwrap();
    }
    search(&RE, line)
}

lazy_static! {
    static ref SCHEME: &'static str = r"[A-Za-z][A-Za-z0-9.+-]{1,31}";
}

pub fn autolink_uri(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(&format!(r"\A(?:{}:[^\x00-\x20<>]*>)", *SCHEME)).unwrap();
    }
    search(&RE, line)
}

pub fn autolink_email(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(concat!(
            r"\A(?:",
            "[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+",
            r"@",
            r"[a-zA-Z0-9]",
            r"([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?",
            r"(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*",
            r">",
            r")"
        ))
        .unwrap();
    }
    search(&RE, line)
}

lazy_static! {
    static ref SPACE_CHAR: &'static str = r"(?:[ \t\v\f\r\n])";
    static ref TAG_NAME: &'static str = r"(?:[A-Za-z][A-Za-z0-9-]*)";
    static ref CLOSE_TAG: String = format!(r"(?:/{}{}*>)", *TAG_NAME, *SPACE_CHAR);
    static ref ATTRIBUTE_NAME: &'static str = r"(?:[a-zA-Z_:][a-zA-Z0-9:._-]*)";
    static ref ATTRIBUTE_VALUE: &'static str =
        r#"(?:[^"'=<>`\x00 ]+|['][^'\x00]*[']|["][^"\x00]*["])"#;
    static ref ATTRIBUTE_VALUE_SPEC: String =
        format!(r"(?:{}*={}*{})", *SPACE_CHAR, *SPACE_CHAR, *ATTRIBUTE_VALUE);
    static ref ATTRIBUTE: String = format!(
        r"(?:{}+{}{}?)",
        *SPACE_CHAR, *ATTRIBUTE_NAME, *ATTRIBUTE_VALUE_SPEC
    );
    static ref OPEN_TAG: String = format!(r"(?:{}{}*{}*/?>)", *TAG_NAME, *ATTRIBUTE, *SPACE_CHAR);
    static ref HTML_COMMENT: &'static str = r"(?:!---->|!---?[^\x00>-](-?[^\x00-])*-->)";
    static ref PROCESSING_INSTRUCTION: &'static str = r"\?([^?>\x00]+|\?[^>\x00]|>)*\?>";
    static ref DECLARATION: String = format!(r"![A-Z]+{}+[^>\x00]*>", *SPACE_CHAR);
    static ref CDATA: &'static str = r"!\[CDATA\[([^\]\x00]+|\][^\]\x00]|\]\][^>\x00])*\]\]>";
    static ref HTML_TAG: String = format!(
        r"(?:{}|{}|{}|{}|{}|{})",
        *OPEN_TAG, *CLOSE_TAG, *HTML_COMMENT, *PROCESSING_INSTRUCTION, *DECLARATION, *CDATA
    );
}

/// Matches one raw HTML construct. Called just past a `<`; the pattern
/// itself has no leading angle bracket.
pub fn html_tag(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(&format!(r"\A(?:{})", *HTML_TAG)).unwrap();
    }
    search(&RE, line)
}

/// Matches the rest of an emoji shortcode. Called just past the opening
/// colon; the match includes the closing colon.
pub fn shortcode(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"\A[A-Za-z0-9+_-]+:").unwrap();
    }
    search(&RE, line)
}

/// Matches a comment body. Called just past `<!`, at the opening `--`;
/// the match includes the closing `-->`.
pub fn html_comment(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"\A---?[^\x00>-](-?[^\x00-])*-->").unwrap();
    }
    search(&RE, line)
}

/// Matches a CDATA section body. Called just past `<![`; the match stops
/// short of the closing `]]>`.
pub fn html_cdata(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex =
            Regex::new(r"\ACDATA\[([^\]\x00]+|\][^\]\x00]|\]\][^>\x00])*").unwrap();
    }
    search(&RE, line)
}

/// Matches a declaration body. Called just past `<!`; the match stops
/// short of the closing `>`.
pub fn html_declaration(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"\A[A-Za-z][^>\x00]*").unwrap();
    }
    search(&RE, line)
}

/// Matches a processing instruction body, possibly empty. Called just
/// past `<?`; the match stops short of the closing `?>`.
pub fn html_processing_instruction(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"\A([^?>\x00]+|\?[^>\x00]|>)*").unwrap();
    }
    search(&RE, line)
}

/// Classifies the start of an HTML block, kinds 1 through 6.
pub fn html_block_start(line: &[u8]) -> Option<u8> {
    lazy_static! {
        static ref RE1: Regex =
            Regex::new(r"\A<(?i:script|pre|style|textarea)(?:[ \t\v\f\r\n]|>)").unwrap();
        static ref RE4: Regex = Regex::new(r"\A<![A-Za-z]").unwrap();
        static ref RE6: Regex = Regex::new(concat!(
            r"\A</?(?i:",
            "address|article|aside|base|basefont|blockquote|body|caption|center|col|colgroup|",
            "dd|details|dialog|dir|div|dl|dt|fieldset|figcaption|figure|footer|form|frame|",
            "frameset|h1|h2|h3|h4|h5|h6|head|header|hr|html|iframe|legend|li|link|main|menu|",
            "menuitem|nav|noframes|ol|optgroup|option|p|param|section|search|summary|table|",
            "tbody|td|tfoot|th|thead|title|tr|track|ul",
            r")(?:[ \t\v\f\r\n]|/?>)"
        ))
        .unwrap();
    }

    if !line.starts_with(b"<") {
        None
    } else if is_match(&RE1, line) {
        Some(1)
    } else if line.starts_with(b"<!--") {
        Some(2)
    } else if line.starts_with(b"<?") {
        Some(3)
    } else if is_match(&RE4, line) {
        Some(4)
    } else if line.starts_with(b"<![CDATA[") {
        Some(5)
    } else if is_match(&RE6, line) {
        Some(6)
    } else {
        None
    }
}

/// Kind 7: a complete open or close tag, alone on its line.
pub fn html_block_start_7(line: &[u8]) -> Option<u8> {
    lazy_static! {
        static ref RE: Regex = Regex::new(&format!(
            r"\A<(?:{}|{})[ \t\v\f]*[\r\n]",
            *OPEN_TAG, *CLOSE_TAG
        ))
        .unwrap();
    }
    if is_match(&RE, line) {
        Some(7)
    } else {
        None
    }
}

pub fn html_block_end_1(line: &[u8]) -> bool {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"(?i:</(?:script|pre|style|textarea)>)").unwrap();
    }
    is_match(&RE, line)
}

pub fn html_block_end_2(line: &[u8]) -> bool {
    line.windows(3).any(|w| w == b"-->")
}

pub fn html_block_end_3(line: &[u8]) -> bool {
    line.windows(2).any(|w| w == b"?>")
}

pub fn html_block_end_4(line: &[u8]) -> bool {
    line.contains(&b'>')
}

pub fn html_block_end_5(line: &[u8]) -> bool {
    line.windows(3).any(|w| w == b"]]>")
}

pub fn spacechars(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"\A[ \t\v\f\r\n]+").unwrap();
    }
    search(&RE, line)
}

lazy_static! {
    static ref ESCAPED_CHAR: &'static str = r##"(?:\\[!"#$%&'()*+,./:;<=>?@\[\\\]^_`{|}~-])"##;
}

pub fn link_title(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(&format!(
            r#"\A(?:"({}|[^"\x00])*"|'({}|[^'\x00])*'|\(({}|[^)\x00]*)*\))"#,
            *ESCAPED_CHAR, *ESCAPED_CHAR, *ESCAPED_CHAR
        ))
        .unwrap();
    }
    search(&RE, line)
}

pub fn dangerous_url(url: &[u8]) -> bool {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"\A(?i:javascript:|vbscript:|file:|data:)").unwrap();
        static ref IMAGE: Regex = Regex::new(r"\A(?i:data:image/(?:png|gif|jpeg|webp))").unwrap();
    }
    is_match(&RE, url) && !is_match(&IMAGE, url)
}

lazy_static! {
    static ref TABLE_SPACECHAR: &'static str = r"(?:[ \t\v\f])";
    static ref TABLE_NEWLINE: &'static str = r"(?:\r?\n)";
    static ref TABLE_MARKER: String =
        format!(r"(?:{}*:?-+:?{}*)", *TABLE_SPACECHAR, *TABLE_SPACECHAR);
    static ref TABLE_CELL: String = format!(r"(?:({}|[^|\r\n])*)", *ESCAPED_CHAR);
}

/// Matches a full table delimiter row, e.g. `| --- | :-: |`.
pub fn table_start(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(&format!(
            r"\A\|?{}(\|{})*\|?{}*{}",
            *TABLE_MARKER, *TABLE_MARKER, *TABLE_SPACECHAR, *TABLE_NEWLINE
        ))
        .unwrap();
    }
    search(&RE, line)
}

pub fn table_cell(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex = Regex::new(&format!(r"\A{}", *TABLE_CELL)).unwrap();
    }
    search(&RE, line)
}

pub fn table_cell_end(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex =
            Regex::new(&format!(r"\A\|{}*{}?", *TABLE_SPACECHAR, *TABLE_NEWLINE)).unwrap();
    }
    search(&RE, line)
}

pub fn table_row_end(line: &[u8]) -> Option<usize> {
    lazy_static! {
        static ref RE: Regex =
            Regex::new(&format!(r"\A{}*{}", *TABLE_SPACECHAR, *TABLE_NEWLINE)).unwrap();
    }
    search(&RE, line)
}
