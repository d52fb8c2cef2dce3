//! The HTML renderer.
//!
//! Output follows the CommonMark reference shapes; extension nodes render
//! to the nearest HTML equivalent. Raw HTML is replaced with a placeholder
//! comment unless [`unsafe_html`](crate::ParseOptions::unsafe_html) is set.

use std::borrow::Cow;
use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::character_set::character_set;
use crate::nodes::{
    Arena, AstNode, Document, ListStyle, ListType, NodeAttributes, NodeValue, TableAlignment,
};
use crate::parser::ParseOptions;
use crate::scanners;

/// Renders a parsed document to HTML.
pub fn format_document(doc: &Document, options: &ParseOptions) -> String {
    let mut f = HtmlFormatter::new(doc.arena(), options);
    f.format(doc.root(), false);
    f.output
}

/// Converts heading text to canonical, unique, but still readable anchors,
/// GitHub style.
///
/// Use one per document: uniqueness is tracked across calls.
///
/// ```
/// # use inkmark::Anchorizer;
/// let mut anchorizer = Anchorizer::new();
/// assert_eq!(anchorizer.anchorize("Ticks & Tricks"), "ticks--tricks");
/// assert_eq!(anchorizer.anchorize("Ticks & Tricks"), "ticks--tricks-1");
/// ```
#[derive(Debug, Default)]
pub struct Anchorizer(HashSet<String>);

impl Anchorizer {
    pub fn new() -> Self {
        Anchorizer(HashSet::new())
    }

    /// Returns a new anchor for `header`, distinct from every anchor
    /// already returned by this instance.
    pub fn anchorize(&mut self, header: &str) -> String {
        lazy_static! {
            static ref REJECTED_CHARS: Regex = Regex::new(r"[^\p{L}\p{M}\p{N}\p{Pc} -]").unwrap();
        }

        let lowered = header.to_lowercase();
        let id = REJECTED_CHARS.replace_all(&lowered, "").replace(' ', "-");

        let mut uniq = 0;
        let id = loop {
            let candidate = if uniq == 0 {
                Cow::from(&id)
            } else {
                Cow::from(format!("{}-{}", id, uniq))
            };

            if !self.0.contains(&*candidate) {
                break candidate.into_owned();
            }
            uniq += 1;
        };
        self.0.insert(id.clone());
        id
    }
}

/// Writes `s` with the HTML special characters replaced by entities.
pub fn escape(output: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => output.push_str("&quot;"),
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
}

const HREF_SAFE: [bool; 256] = character_set!(
    b"abcdefghijklmnopqrstuvwxyz",
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    b"0123456789",
    b"-_.+!*(),%#@?=;:/,+$~"
);

/// Writes `s` percent- or entity-escaped for use in an `href` or `src`
/// attribute value.
pub fn escape_href(output: &mut String, s: &str) {
    let bytes = s.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let org = i;
        while i < bytes.len() && HREF_SAFE[bytes[i] as usize] {
            i += 1;
        }
        if i > org {
            output.push_str(&s[org..i]);
        }
        if i >= bytes.len() {
            break;
        }
        match bytes[i] {
            b'&' => output.push_str("&amp;"),
            b'\'' => output.push_str("&#x27;"),
            b => output.push_str(&format!("&#x{:x};", b)),
        }
        i += 1;
    }
}

enum Phase {
    Enter,
    Exit,
}

/// How a node's children are rendered, decided when the node is entered.
enum ChildRendering {
    Html,
    Plain,
    Skip,
}

struct HtmlFormatter<'d, 'o> {
    output: String,
    arena: &'d Arena,
    options: &'o ParseOptions,

    /// Number of footnote definitions rendered so far; nonzero means the
    /// footnote section is open.
    footnote_ix: u32,
}

impl<'d, 'o> HtmlFormatter<'d, 'o> {
    fn new(arena: &'d Arena, options: &'o ParseOptions) -> Self {
        HtmlFormatter {
            output: String::new(),
            arena,
            options,
            footnote_ix: 0,
        }
    }

    fn cr(&mut self) {
        if !self.output.is_empty() && !self.output.ends_with('\n') {
            self.output.push('\n');
        }
    }

    fn format_children(&mut self, node: AstNode, plain: bool) {
        let arena = self.arena;
        for child in node.children(arena) {
            self.format(child, plain);
        }
    }

    /// Renders a subtree. Traversal keeps its own work stack so that
    /// nesting depth is bounded by the heap, not the call stack. In `plain`
    /// mode only textual content is written, for image alt text.
    fn format(&mut self, node: AstNode, plain: bool) {
        let arena = self.arena;
        let mut stack = vec![(node, plain, Phase::Enter)];

        while let Some((node, plain, phase)) = stack.pop() {
            match phase {
                Phase::Enter => {
                    let children = if plain {
                        self.format_plain(node);
                        ChildRendering::Plain
                    } else {
                        stack.push((node, false, Phase::Exit));
                        self.format_enter(node)
                    };

                    let child_plain = match children {
                        ChildRendering::Skip => continue,
                        ChildRendering::Html => false,
                        ChildRendering::Plain => true,
                    };
                    for child in node.reverse_children(arena) {
                        stack.push((child, child_plain, Phase::Enter));
                    }
                }
                Phase::Exit => self.format_exit(node),
            }
        }
    }

    fn format_enter(&mut self, node: AstNode) -> ChildRendering {
        let arena = self.arena;
        match node.get(arena).value {
            NodeValue::Document => ChildRendering::Html,

            NodeValue::BlockQuote => {
                self.cr();
                self.output.push_str("<blockquote>\n");
                ChildRendering::Html
            }

            NodeValue::List(ref nl) => {
                self.cr();
                if nl.list_type == ListType::Bullet {
                    self.output.push_str("<ul>\n");
                } else {
                    self.output.push_str("<ol");
                    if nl.start != 1 {
                        self.output.push_str(&format!(" start=\"{}\"", nl.start));
                    }
                    match nl.style {
                        ListStyle::Decimal => (),
                        ListStyle::LowerAlpha => self.output.push_str(" type=\"a\""),
                        ListStyle::UpperAlpha => self.output.push_str(" type=\"A\""),
                        ListStyle::LowerRoman => self.output.push_str(" type=\"i\""),
                        ListStyle::UpperRoman => self.output.push_str(" type=\"I\""),
                        ListStyle::LowerGreek => self
                            .output
                            .push_str(" style=\"list-style-type: lower-greek\""),
                    }
                    self.output.push_str(">\n");
                }
                ChildRendering::Html
            }

            NodeValue::Item(..) => {
                self.cr();
                self.output.push_str("<li>");
                ChildRendering::Html
            }

            NodeValue::TaskItem(symbol) => {
                self.cr();
                self.output.push_str("<li>");
                if symbol.is_some() {
                    self.output
                        .push_str("<input type=\"checkbox\" checked=\"\" disabled=\"\" /> ");
                } else {
                    self.output
                        .push_str("<input type=\"checkbox\" disabled=\"\" /> ");
                }
                ChildRendering::Html
            }

            NodeValue::Heading(ref nh) => {
                self.cr();
                self.output.push_str(&format!("<h{}", nh.level));
                self.write_attributes(nh.attributes.as_ref(), None);
                self.output.push('>');
                ChildRendering::Html
            }

            NodeValue::CodeBlock(ref ncb) => {
                self.cr();
                self.output.push_str("<pre><code");
                let language = ncb
                    .info
                    .split_whitespace()
                    .next()
                    .map(|l| format!("language-{}", l));
                self.write_attributes(ncb.attributes.as_ref(), language.as_deref());
                self.output.push('>');
                escape(&mut self.output, &ncb.literal);
                self.output.push_str("</code></pre>\n");
                ChildRendering::Skip
            }

            NodeValue::MathBlock(ref nmb) => {
                self.cr();
                self.output.push_str("<div data-math-style=\"display\">");
                escape(&mut self.output, &nmb.literal);
                self.output.push_str("</div>\n");
                ChildRendering::Skip
            }

            NodeValue::CustomContainer(ref ncc) => {
                self.cr();
                self.output.push_str("<div");
                let class = if ncc.name.is_empty() {
                    None
                } else {
                    Some(ncc.name.as_str())
                };
                self.write_attributes(ncc.attributes.as_ref(), class);
                self.output.push_str(">\n");
                ChildRendering::Html
            }

            NodeValue::HtmlBlock(ref nhb) => {
                self.cr();
                if self.options.unsafe_html {
                    self.output.push_str(&nhb.literal);
                } else {
                    self.output.push_str("<!-- raw HTML omitted -->\n");
                }
                self.cr();
                ChildRendering::Skip
            }

            NodeValue::Paragraph => {
                if !self.paragraph_is_tight(node) {
                    self.cr();
                    self.output.push_str("<p>");
                }
                ChildRendering::Html
            }

            NodeValue::ThematicBreak => {
                self.cr();
                self.output.push_str("<hr />\n");
                ChildRendering::Skip
            }

            NodeValue::FootnoteDefinition(..) => {
                if self.footnote_ix == 0 {
                    self.cr();
                    self.output
                        .push_str("<section class=\"footnotes\" data-footnotes>\n<ol>\n");
                }
                self.footnote_ix += 1;
                self.output
                    .push_str(&format!("<li id=\"fn-{}\">", self.footnote_ix));
                ChildRendering::Html
            }

            NodeValue::LinkReferenceDefinition => ChildRendering::Skip,

            NodeValue::Table(..) => {
                self.cr();
                self.output.push_str("<table>\n");
                ChildRendering::Html
            }

            NodeValue::TableRow(header) => {
                let (alignments, num_columns) =
                    match node.parent(arena).map(|p| &p.get(arena).value) {
                        Some(&NodeValue::Table(ref nt)) => (nt.alignments.clone(), nt.num_columns),
                        _ => (vec![], 0),
                    };

                self.cr();
                if header {
                    self.output.push_str("<thead>\n");
                } else {
                    let first_body = match node.previous_sibling(arena) {
                        Some(prev) => matches!(prev.get(arena).value, NodeValue::TableRow(true)),
                        None => true,
                    };
                    if first_body {
                        self.output.push_str("<tbody>\n");
                    }
                }
                self.output.push_str("<tr>\n");

                // Body rows render exactly the header's column count.
                let cells: Vec<AstNode> = node.children(arena).collect();
                for (i, &cell) in cells.iter().take(num_columns).enumerate() {
                    self.table_cell(Some(cell), header, alignment_name(&alignments, i));
                }
                for i in cells.len()..num_columns {
                    self.table_cell(None, header, alignment_name(&alignments, i));
                }

                self.output.push_str("</tr>\n");
                if header {
                    self.output.push_str("</thead>\n");
                } else if node.next_sibling(arena).is_none() {
                    self.output.push_str("</tbody>\n");
                }
                ChildRendering::Skip
            }

            // Cells are rendered by their row.
            NodeValue::TableCell => ChildRendering::Html,

            NodeValue::Text(ref literal) => {
                escape(&mut self.output, literal);
                ChildRendering::Skip
            }

            NodeValue::LineBreak => {
                self.output.push_str("<br />\n");
                ChildRendering::Skip
            }

            NodeValue::SoftBreak => {
                self.output.push('\n');
                ChildRendering::Skip
            }

            NodeValue::Code(ref nc) => {
                self.output.push_str("<code>");
                escape(&mut self.output, &nc.literal);
                self.output.push_str("</code>");
                ChildRendering::Skip
            }

            NodeValue::HtmlInline(ref literal) => {
                if self.options.unsafe_html {
                    self.output.push_str(literal);
                } else {
                    self.output.push_str("<!-- raw HTML omitted -->");
                }
                ChildRendering::Skip
            }

            NodeValue::Emph => {
                self.output.push_str("<em>");
                ChildRendering::Html
            }

            NodeValue::Strong => {
                self.output.push_str("<strong>");
                ChildRendering::Html
            }

            NodeValue::Strikethrough => {
                self.output.push_str("<del>");
                ChildRendering::Html
            }

            NodeValue::Math(ref nm) => {
                let style = if nm.display { "display" } else { "inline" };
                self.output
                    .push_str(&format!("<span data-math-style=\"{}\">", style));
                escape(&mut self.output, &nm.literal);
                self.output.push_str("</span>");
                ChildRendering::Skip
            }

            NodeValue::Link(ref nl) => {
                self.output.push_str("<a href=\"");
                if self.options.unsafe_html || !scanners::dangerous_url(nl.url.as_bytes()) {
                    escape_href(&mut self.output, &nl.url);
                }
                if !nl.title.is_empty() {
                    self.output.push_str("\" title=\"");
                    escape(&mut self.output, &nl.title);
                }
                self.output.push('"');
                self.write_attributes(nl.attributes.as_ref(), None);
                self.output.push('>');
                ChildRendering::Html
            }

            NodeValue::Image(ref nl) => {
                self.output.push_str("<img src=\"");
                if self.options.unsafe_html || !scanners::dangerous_url(nl.url.as_bytes()) {
                    escape_href(&mut self.output, &nl.url);
                }
                self.output.push_str("\" alt=\"");
                ChildRendering::Plain
            }

            NodeValue::FootnoteReference(ref nfr) => {
                self.output.push_str(&format!(
                    "<sup class=\"footnote-ref\"><a href=\"#fn-{}\" id=\"fnref-{}",
                    nfr.ix, nfr.ix
                ));
                if nfr.ref_num > 1 {
                    self.output.push_str(&format!("-{}", nfr.ref_num));
                }
                self.output.push_str(&format!("\">{}</a></sup>", nfr.ix));
                ChildRendering::Skip
            }

            NodeValue::ShortCode(ref nsc) => {
                self.output.push_str(&nsc.emoji);
                ChildRendering::Skip
            }
        }
    }

    fn format_exit(&mut self, node: AstNode) {
        let arena = self.arena;
        match node.get(arena).value {
            NodeValue::Document => {
                if self.footnote_ix > 0 {
                    self.output.push_str("</ol>\n</section>\n");
                }
            }

            NodeValue::BlockQuote => {
                self.cr();
                self.output.push_str("</blockquote>\n");
            }

            NodeValue::List(ref nl) => {
                if nl.list_type == ListType::Bullet {
                    self.output.push_str("</ul>\n");
                } else {
                    self.output.push_str("</ol>\n");
                }
            }

            NodeValue::Item(..) | NodeValue::TaskItem(..) => {
                self.output.push_str("</li>\n");
            }

            NodeValue::Heading(ref nh) => {
                self.output.push_str(&format!("</h{}>\n", nh.level));
            }

            NodeValue::CustomContainer(..) => {
                self.cr();
                self.output.push_str("</div>\n");
            }

            NodeValue::Paragraph => {
                let backrefs = node.parent(arena).and_then(|p| match p.get(arena).value {
                    NodeValue::FootnoteDefinition(ref nfd)
                        if node.next_sibling(arena).is_none() =>
                    {
                        Some(nfd.total_references)
                    }
                    _ => None,
                });
                if let Some(total) = backrefs {
                    self.write_footnote_backrefs(total);
                }
                if !self.paragraph_is_tight(node) {
                    self.output.push_str("</p>\n");
                }
            }

            NodeValue::FootnoteDefinition(..) => {
                self.cr();
                self.output.push_str("</li>\n");
            }

            NodeValue::Table(..) => {
                self.output.push_str("</table>\n");
            }

            NodeValue::Emph => self.output.push_str("</em>"),
            NodeValue::Strong => self.output.push_str("</strong>"),
            NodeValue::Strikethrough => self.output.push_str("</del>"),

            NodeValue::Link(..) => self.output.push_str("</a>"),

            NodeValue::Image(ref nl) => {
                self.output.push('"');
                if !nl.title.is_empty() {
                    self.output.push_str(" title=\"");
                    escape(&mut self.output, &nl.title);
                    self.output.push('"');
                }
                self.write_attributes(nl.attributes.as_ref(), None);
                self.output.push_str(" />");
            }

            _ => (),
        }
    }

    fn paragraph_is_tight(&self, node: AstNode) -> bool {
        let arena = self.arena;
        match node
            .parent(arena)
            .and_then(|n| n.parent(arena))
            .map(|n| &n.get(arena).value)
        {
            Some(&NodeValue::List(ref nl)) => nl.tight,
            _ => false,
        }
    }

    fn format_plain(&mut self, node: AstNode) {
        let arena = self.arena;
        match node.get(arena).value {
            NodeValue::Text(ref literal) => escape(&mut self.output, literal),
            NodeValue::Code(ref nc) => escape(&mut self.output, &nc.literal),
            NodeValue::Math(ref nm) => escape(&mut self.output, &nm.literal),
            NodeValue::ShortCode(ref nsc) => self.output.push_str(&nsc.emoji),
            NodeValue::LineBreak | NodeValue::SoftBreak => self.output.push(' '),
            _ => (),
        }
    }

    fn table_cell(&mut self, cell: Option<AstNode>, header: bool, alignment: Option<&str>) {
        let tag = if header { "th" } else { "td" };
        self.output.push('<');
        self.output.push_str(tag);
        if let Some(alignment) = alignment {
            self.output.push_str(&format!(" align=\"{}\"", alignment));
        }
        self.output.push('>');
        if let Some(cell) = cell {
            self.format_children(cell, false);
        }
        self.output.push_str(&format!("</{}>\n", tag));
    }

    fn write_footnote_backrefs(&mut self, total_references: u32) {
        let ix = self.footnote_ix;
        for ref_num in 1..=total_references {
            if ref_num == 1 {
                self.output.push_str(&format!(
                    " <a href=\"#fnref-{}\" class=\"footnote-backref\">\u{21a9}</a>",
                    ix
                ));
            } else {
                self.output.push_str(&format!(
                    " <a href=\"#fnref-{}-{}\" class=\"footnote-backref\">\u{21a9}<sup class=\"footnote-ref\">{}</sup></a>",
                    ix, ref_num, ref_num
                ));
            }
        }
    }

    /// Writes `id`, `class` and key-value attributes. The id is prefixed
    /// with the configured `attribute_prefix`; `extra_class` comes first in
    /// the class list.
    fn write_attributes(&mut self, attributes: Option<&NodeAttributes>, extra_class: Option<&str>) {
        if let Some(id) = attributes.and_then(|a| a.id.as_deref()) {
            self.output.push_str(" id=\"");
            if let Some(prefix) = self.options.attribute_prefix.as_deref() {
                escape(&mut self.output, prefix);
            }
            escape(&mut self.output, id);
            self.output.push('"');
        }

        let classes = attributes.map(|a| a.classes.as_slice()).unwrap_or(&[]);
        if extra_class.is_some() || !classes.is_empty() {
            self.output.push_str(" class=\"");
            let mut sep = "";
            if let Some(extra) = extra_class {
                escape(&mut self.output, extra);
                sep = " ";
            }
            for class in classes {
                self.output.push_str(sep);
                escape(&mut self.output, class);
                sep = " ";
            }
            self.output.push('"');
        }

        if let Some(attributes) = attributes {
            for (key, value) in &attributes.properties {
                self.output.push(' ');
                escape(&mut self.output, key);
                self.output.push_str("=\"");
                escape(&mut self.output, value);
                self.output.push('"');
            }
        }
    }
}

fn alignment_name(alignments: &[TableAlignment], i: usize) -> Option<&'static str> {
    alignments.get(i).and_then(|a| a.html_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_are_slugged_and_unique() {
        let mut anchorizer = Anchorizer::new();
        assert_eq!(anchorizer.anchorize("Some Heading"), "some-heading");
        assert_eq!(anchorizer.anchorize("Some Heading"), "some-heading-1");
        assert_eq!(anchorizer.anchorize("Héllo, wörld!"), "héllo-wörld");
    }

    #[test]
    fn escapes_html_specials() {
        let mut out = String::new();
        escape(&mut out, "a<b & \"c\">");
        assert_eq!(out, "a&lt;b &amp; &quot;c&quot;&gt;");
    }

    #[test]
    fn escapes_href_bytes() {
        let mut out = String::new();
        escape_href(&mut out, "/x?a=1&b='q' z");
        assert_eq!(out, "/x?a=1&amp;b=&#x27;q&#x27;&#x20;z");
    }
}
