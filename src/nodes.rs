//! The document tree.
//!
//! Nodes live in an [`Arena`] and are addressed by copyable [`AstNode`]
//! handles; parent, child and sibling relationships are stored by the arena.
//! Every node records the byte [`Span`] of source it was parsed from.

use rustc_hash::FxHashMap;

use crate::position::{LineColumn, Locator, PositionMap};

/// Arena holding every node of a document.
pub type Arena = indextree::Arena<Ast>;

/// A byte range into the original source, end-exclusive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end);
        Span { start, end }
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// The core node enum.
#[derive(Debug, Clone)]
pub enum NodeValue {
    /// The root of every document. Contains **blocks**.
    Document,

    /// **Block**. A block quote. Contains other **blocks**.
    ///
    /// ``` md
    /// > A block quote.
    /// ```
    BlockQuote,

    /// **Block**. A list. Contains list items.
    ///
    /// ``` md
    /// * An unordered list
    /// * Another item
    ///
    /// 1. An ordered list
    /// 2. Another item
    /// ```
    List(NodeList),

    /// **Block**. A list item. Contains other **blocks**.
    Item(NodeList),

    /// **Block**. A task list item; the value is the character between the
    /// brackets, or `None` when unchecked. Contains other **blocks**.
    TaskItem(Option<char>),

    /// **Block**. A code block, fenced or indented. Contains raw text which
    /// is not parsed as Markdown, although it is HTML escaped on output.
    CodeBlock(NodeCodeBlock),

    /// **Block**. A display math block fenced by `$$`. Contains raw text.
    MathBlock(NodeMathBlock),

    /// **Block**. A custom container fenced by `:::`, e.g.
    ///
    /// ``` md
    /// ::: warning
    /// Beware.
    /// :::
    /// ```
    ///
    /// Contains other **blocks**.
    CustomContainer(NodeCustomContainer),

    /// **Block**. An HTML block. Contains raw text which is neither parsed
    /// as Markdown nor HTML escaped.
    HtmlBlock(NodeHtmlBlock),

    /// **Block**. A paragraph. Contains **inlines**.
    Paragraph,

    /// **Block**. An ATX or Setext heading. Contains **inlines**.
    Heading(NodeHeading),

    /// **Block**. A thematic break. Has no children.
    ThematicBreak,

    /// **Block**. A footnote definition. Contains other **blocks**.
    FootnoteDefinition(NodeFootnoteDefinition),

    /// **Block**. A link reference definition, e.g. `[label]: /url "title"`.
    /// Kept in the tree so its span survives; it renders to nothing. The
    /// resolved definition also lives in [`Document::link_definitions`].
    LinkReferenceDefinition,

    /// **Block**. A table. Contains table rows.
    Table(NodeTable),

    /// **Block**. A table row. The `bool` is true for the header row.
    /// Contains table cells.
    TableRow(bool),

    /// **Block**. A table cell. Contains **inlines**.
    TableCell,

    /// **Inline**. Textual content.
    Text(String),

    /// **Inline**. A soft line break.
    SoftBreak,

    /// **Inline**. A hard line break.
    LineBreak,

    /// **Inline**. A code span.
    Code(NodeCode),

    /// **Inline**. Raw HTML contained inline.
    HtmlInline(String),

    /// **Inline**. Emphasised text.
    Emph,

    /// **Inline**. Strong text.
    Strong,

    /// **Inline**. Strikethrough text.
    Strikethrough,

    /// **Inline**. An inline or display math span, e.g. `$x$` or `$$x$$`.
    Math(NodeMath),

    /// **Inline**. A link to some URL, with possible title.
    Link(NodeLink),

    /// **Inline**. An image.
    Image(NodeLink),

    /// **Inline**. A footnote reference.
    FootnoteReference(NodeFootnoteReference),

    /// **Inline**. An emoji generated from a shortcode like `:fire:`.
    ShortCode(NodeShortCode),
}

/// Attributes attached by an explicit `{#id .class key=val}` block, or by
/// heading auto-identifiers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeAttributes {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub properties: Vec<(String, String)>,
}

impl NodeAttributes {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.classes.is_empty() && self.properties.is_empty()
    }
}

/// Alignment of a single table column.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TableAlignment {
    /// Column content is unaligned.
    None,

    /// Column content is aligned left.
    Left,

    /// Column content is centered.
    Center,

    /// Column content is aligned right.
    Right,
}

impl TableAlignment {
    pub(crate) fn html_name(&self) -> Option<&'static str> {
        match *self {
            TableAlignment::None => None,
            TableAlignment::Left => Some("left"),
            TableAlignment::Center => Some("center"),
            TableAlignment::Right => Some("right"),
        }
    }
}

/// The metadata of a table.
#[derive(Debug, Clone)]
pub struct NodeTable {
    /// Column alignments, from the delimiter row.
    pub alignments: Vec<TableAlignment>,

    /// Width of the header row. Body rows are padded or truncated to this
    /// many cells on output.
    pub num_columns: usize,
}

/// An inline code span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCode {
    /// Length of the backtick run that opened the span.
    pub num_backticks: usize,

    /// The content of the span. Not interpreted as Markdown at all, so it is
    /// kept here rather than in a child text node.
    pub literal: String,
}

/// An inline math span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMath {
    /// True for `$$display$$` math, false for `$inline$`.
    pub display: bool,

    /// The verbatim content between the dollars.
    pub literal: String,
}

/// An emoji shortcode span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeShortCode {
    /// The name between the colons, e.g. `fire`.
    pub code: String,

    /// The emoji it resolves to.
    pub emoji: String,
}

/// The details of a link's destination, or an image's source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLink {
    /// The URL for the link destination or image source.
    pub url: String,

    /// The title for the link or image.
    ///
    /// This field is used for the `title` attribute by the HTML formatter
    /// even for images; `alt` text is supplied in the image inline text.
    pub title: String,

    /// Attributes from a trailing `{...}` block, when enabled.
    pub attributes: Option<NodeAttributes>,
}

/// A link reference definition as recorded in the document's label map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDefinition {
    pub url: String,
    pub title: String,
    pub attributes: Option<NodeAttributes>,

    /// Where the definition was written, or the heading it was derived from.
    pub span: Span,
}

/// The ordinal style of an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    /// `1.` `2.` `3.`
    Decimal,

    /// `a.` `b.` `c.`
    LowerAlpha,

    /// `A.` `B.` `C.`
    UpperAlpha,

    /// `i.` `ii.` `iii.`
    LowerRoman,

    /// `I.` `II.` `III.`
    UpperRoman,

    /// `α.` `β.` `γ.`
    LowerGreek,
}

impl Default for ListStyle {
    fn default() -> ListStyle {
        ListStyle::Decimal
    }
}

/// The metadata of a list; the kind of list, the delimiter used and so on.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeList {
    /// The kind of list (bullet (unordered) or ordered).
    pub list_type: ListType,

    /// For ordered lists, the numbering style of the markers.
    pub style: ListStyle,

    /// Number of spaces before the list marker.
    pub marker_offset: usize,

    /// Number of characters between the start of the list marker and the
    /// item text (including the list marker(s)).
    pub padding: usize,

    /// For ordered lists, the ordinal the list starts at.
    pub start: usize,

    /// For ordered lists, the delimiter after each number.
    pub delimiter: ListDelimType,

    /// For bullet lists, the character used for each bullet.
    pub bullet_char: u8,

    /// Whether the list is tight, i.e. whether the paragraphs are wrapped in
    /// `<p>` tags when formatted as HTML.
    pub tight: bool,
}

/// The type of list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListType {
    /// A bullet list, i.e. an unordered list.
    Bullet,

    /// An ordered list.
    Ordered,
}

impl Default for ListType {
    fn default() -> ListType {
        ListType::Bullet
    }
}

/// The delimiter for ordered lists, i.e. the character which appears after
/// each number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListDelimType {
    /// A period character `.`.
    Period,

    /// A paren character `)`.
    Paren,
}

impl Default for ListDelimType {
    fn default() -> ListDelimType {
        ListDelimType::Period
    }
}

/// The metadata and data of a code block (fenced or indented).
#[derive(Default, Debug, Clone)]
pub struct NodeCodeBlock {
    /// Whether the code block is fenced.
    pub fenced: bool,

    /// For fenced code blocks, the fence character itself (`` ` `` or `~`).
    pub fence_char: u8,

    /// For fenced code blocks, the length of the fence.
    pub fence_length: usize,

    /// For fenced code blocks, the indentation level of the code within the
    /// block.
    pub fence_offset: usize,

    /// For fenced code blocks, the info string after the opening fence.
    pub info: String,

    /// Attributes from a trailing `{...}` on the fence line, when enabled.
    pub attributes: Option<NodeAttributes>,

    /// The literal contents of the code block.
    pub literal: String,
}

/// The metadata and data of a `$$` math block.
#[derive(Default, Debug, Clone)]
pub struct NodeMathBlock {
    /// The length of the opening fence.
    pub fence_length: usize,

    /// The indentation of the opening fence.
    pub fence_offset: usize,

    /// The verbatim contents of the block.
    pub literal: String,
}

/// The metadata of a `:::` custom container.
#[derive(Default, Debug, Clone)]
pub struct NodeCustomContainer {
    /// The word after the opening fence, used as the container's class.
    pub name: String,

    /// Attributes from a trailing `{...}` on the fence line, when enabled.
    pub attributes: Option<NodeAttributes>,

    /// The length of the opening fence.
    pub fence_length: usize,

    /// The indentation of the opening fence.
    pub fence_offset: usize,
}

/// The metadata of a heading.
#[derive(Default, Debug, Clone)]
pub struct NodeHeading {
    /// The heading level, 1 through 6.
    pub level: u8,

    /// Whether the heading is setext.
    pub setext: bool,

    /// Attributes from a trailing `{...}` block or an auto-identifier.
    pub attributes: Option<NodeAttributes>,
}

/// The metadata of an HTML block.
#[derive(Debug, Default, Clone)]
pub struct NodeHtmlBlock {
    /// The HTML block kind, 1 through 7, deciding its end condition.
    pub block_type: u8,

    /// The literal contents of the HTML block.
    pub literal: String,
}

/// The metadata of a footnote definition.
#[derive(Debug, Default, Clone)]
pub struct NodeFootnoteDefinition {
    /// The name of the footnote.
    pub name: String,

    /// Total number of references to this footnote in the document.
    pub total_references: u32,
}

/// The metadata of a footnote reference.
#[derive(Debug, Default, Clone)]
pub struct NodeFootnoteReference {
    /// The name of the footnote.
    pub name: String,

    /// The index of the reference (within its footnote), 1-based.
    pub ref_num: u32,

    /// The index of the footnote in the document, 1-based.
    pub ix: u32,
}

/// A single node's data.
#[derive(Debug, Clone)]
pub struct Ast {
    /// The node's kind and associated data.
    pub value: NodeValue,

    /// The byte range of source this node was parsed from.
    pub span: Span,

    pub(crate) content: String,
    pub(crate) position_map: PositionMap,
    pub(crate) open: bool,
    pub(crate) last_line_blank: bool,
}

impl Ast {
    pub fn new(value: NodeValue, start: usize) -> Self {
        Ast {
            value,
            span: Span::new(start, start),
            content: String::new(),
            position_map: PositionMap::new(),
            open: true,
            last_line_blank: false,
        }
    }
}

impl NodeValue {
    /// Whether the node is a block.
    pub fn block(&self) -> bool {
        matches!(
            *self,
            NodeValue::Document
                | NodeValue::BlockQuote
                | NodeValue::List(..)
                | NodeValue::Item(..)
                | NodeValue::TaskItem(..)
                | NodeValue::CodeBlock(..)
                | NodeValue::MathBlock(..)
                | NodeValue::CustomContainer(..)
                | NodeValue::HtmlBlock(..)
                | NodeValue::Paragraph
                | NodeValue::Heading(..)
                | NodeValue::ThematicBreak
                | NodeValue::FootnoteDefinition(..)
                | NodeValue::LinkReferenceDefinition
                | NodeValue::Table(..)
                | NodeValue::TableRow(..)
                | NodeValue::TableCell
        )
    }

    /// Whether the node's children are inlines.
    pub fn contains_inlines(&self) -> bool {
        matches!(
            *self,
            NodeValue::Paragraph | NodeValue::Heading(..) | NodeValue::TableCell
        )
    }

    /// Indicates whether this node may contain a child of kind `child`.
    pub fn can_contain_type(&self, child: &NodeValue) -> bool {
        if let NodeValue::Document = *child {
            return false;
        }

        match *self {
            NodeValue::Document
            | NodeValue::BlockQuote
            | NodeValue::FootnoteDefinition(_)
            | NodeValue::CustomContainer(..)
            | NodeValue::Item(..)
            | NodeValue::TaskItem(..) => {
                child.block() && !matches!(*child, NodeValue::Item(..) | NodeValue::TaskItem(..))
            }

            NodeValue::List(..) => matches!(*child, NodeValue::Item(..) | NodeValue::TaskItem(..)),

            NodeValue::Paragraph | NodeValue::Heading(..) | NodeValue::TableCell => !child.block(),

            NodeValue::Emph
            | NodeValue::Strong
            | NodeValue::Strikethrough
            | NodeValue::Link(..)
            | NodeValue::Image(..) => !child.block(),

            NodeValue::Table(..) => matches!(*child, NodeValue::TableRow(..)),
            NodeValue::TableRow(..) => matches!(*child, NodeValue::TableCell),

            _ => false,
        }
    }

    /// Text node contents, if this is a text node.
    pub fn text(&self) -> Option<&String> {
        match *self {
            NodeValue::Text(ref t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn text_mut(&mut self) -> Option<&mut String> {
        match *self {
            NodeValue::Text(ref mut t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn accepts_lines(&self) -> bool {
        matches!(
            *self,
            NodeValue::Paragraph
                | NodeValue::Heading(..)
                | NodeValue::CodeBlock(..)
                | NodeValue::MathBlock(..)
                | NodeValue::HtmlBlock(..)
        )
    }
}

/// A handle to a node in an [`Arena`].
///
/// Handles are cheap to copy and remain valid for the lifetime of the
/// arena, even after the node is detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstNode(pub(crate) indextree::NodeId);

impl AstNode {
    pub(crate) fn create(arena: &mut Arena, ast: Ast) -> AstNode {
        AstNode(arena.new_node(ast))
    }

    pub fn get<'a>(&self, arena: &'a Arena) -> &'a Ast {
        arena[self.0].get()
    }

    pub fn get_mut<'a>(&self, arena: &'a mut Arena) -> &'a mut Ast {
        arena[self.0].get_mut()
    }

    pub fn parent(&self, arena: &Arena) -> Option<AstNode> {
        arena[self.0].parent().map(AstNode)
    }

    pub fn first_child(&self, arena: &Arena) -> Option<AstNode> {
        arena[self.0].first_child().map(AstNode)
    }

    pub fn last_child(&self, arena: &Arena) -> Option<AstNode> {
        arena[self.0].last_child().map(AstNode)
    }

    pub fn previous_sibling(&self, arena: &Arena) -> Option<AstNode> {
        arena[self.0].previous_sibling().map(AstNode)
    }

    pub fn next_sibling(&self, arena: &Arena) -> Option<AstNode> {
        arena[self.0].next_sibling().map(AstNode)
    }

    pub fn append(&self, arena: &mut Arena, child: AstNode) {
        self.0.append(child.0, arena);
    }

    pub fn insert_after(&self, arena: &mut Arena, sibling: AstNode) {
        self.0.insert_after(sibling.0, arena);
    }

    pub fn insert_before(&self, arena: &mut Arena, sibling: AstNode) {
        self.0.insert_before(sibling.0, arena);
    }

    /// Detaches this node, and its subtree, from the tree. The nodes stay in
    /// the arena and the handle stays valid.
    pub fn detach(&self, arena: &mut Arena) {
        self.0.detach(arena);
    }

    pub fn children<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = AstNode> + 'a {
        self.0.children(arena).map(AstNode)
    }

    pub fn reverse_children<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = AstNode> + 'a {
        let mut next = self.last_child(arena);
        std::iter::from_fn(move || {
            let cur = next?;
            next = cur.previous_sibling(arena);
            Some(cur)
        })
    }

    /// This node and all of its descendants, in depth-first order.
    pub fn descendants<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = AstNode> + 'a {
        self.0.descendants(arena).map(AstNode)
    }
}

/// A parsed document: the tree plus everything resolved during parsing.
pub struct Document {
    pub(crate) arena: Arena,
    root: AstNode,

    /// Normalized label → link reference definition. First definition wins.
    pub link_definitions: FxHashMap<String, LinkDefinition>,

    /// Normalized footnote name → definition node, for footnotes referenced
    /// at least once.
    pub footnotes: FxHashMap<String, AstNode>,

    pub(crate) locator: Option<Locator>,
}

impl Document {
    pub(crate) fn new(
        arena: Arena,
        root: AstNode,
        link_definitions: FxHashMap<String, LinkDefinition>,
        footnotes: FxHashMap<String, AstNode>,
        locator: Option<Locator>,
    ) -> Document {
        Document {
            arena,
            root,
            link_definitions,
            footnotes,
            locator,
        }
    }

    /// The document root node.
    pub fn root(&self) -> AstNode {
        self.root
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Translates a byte offset to a 1-based line/column position. Only
    /// available when the document was parsed with
    /// [`locator`](crate::ParseOptions::locator) set.
    pub fn locate(&self, offset: usize) -> Option<LineColumn> {
        self.locator.as_ref().map(|l| l.locate(offset))
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("link_definitions", &self.link_definitions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_children_walks_backwards() {
        let mut arena = Arena::new();
        let root = AstNode::create(&mut arena, Ast::new(NodeValue::Paragraph, 0));
        for s in ["a", "b", "c"] {
            let child = AstNode::create(&mut arena, Ast::new(NodeValue::Text(s.to_string()), 0));
            root.append(&mut arena, child);
        }

        let texts: Vec<String> = root
            .reverse_children(&arena)
            .filter_map(|n| n.get(&arena).value.text().cloned())
            .collect();
        assert_eq!(texts, vec!["c", "b", "a"]);
    }
}
