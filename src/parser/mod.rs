//! The block-structure parser.
//!
//! Input is consumed a line at a time. Each line makes three passes over
//! the tree's open spine: the continuation pass asks every open block
//! whether the line still belongs to it, the new-block pass opens blocks
//! for whatever markers remain, and the text pass routes the rest of the
//! line into the deepest block that accepts text, closing any blocks the
//! continuation pass abandoned. Inline content is parsed afterwards, once
//! per leaf, from the accumulated content.

pub mod attributes;
pub mod autolink;
pub mod inlines;
pub mod linkdefs;
mod options;
pub mod table;
pub mod tokenizer;

pub use options::ParseOptions;

use std::collections::HashMap;
use std::mem;

use rustc_hash::FxHashMap;

use crate::html::Anchorizer;
use crate::nodes::{
    Arena, Ast, AstNode, Document, LinkDefinition, ListStyle, NodeAttributes, NodeCodeBlock,
    NodeCustomContainer, NodeFootnoteDefinition, NodeHeading, NodeHtmlBlock, NodeList,
    NodeMathBlock, NodeValue, Span,
};
use crate::position::Locator;
use crate::scanners;
use crate::strings;

use self::linkdefs::LinkReferenceParser;
use self::tokenizer::{BlockToken, ClassifyContext, FenceKind, Line, CODE_INDENT, TAB_STOP};

/// Parses a Markdown document into a tree.
///
/// Parsing is total: every input produces a document, and malformed
/// constructs degrade to literal text.
pub fn parse_document(source: &str, options: &ParseOptions) -> Document {
    let mut arena = Arena::new();
    let root = AstNode::create(&mut arena, Ast::new(NodeValue::Document, 0));

    let mut parser = Parser::new(&mut arena, root, options);
    parser.feed(source);
    let (link_definitions, footnotes) = parser.finish();

    let locator = if options.locator {
        Some(Locator::new(source))
    } else {
        None
    };

    Document::new(arena, root, link_definitions, footnotes, locator)
}

/// The answer an open block gives the continuation pass.
#[derive(Debug, PartialEq, Eq)]
enum Continuation {
    /// The line belongs to this block; any prefix has been consumed.
    Matched,

    /// The line does not continue this block. Whether the block closes is
    /// decided later, after lazy continuation is ruled out.
    NotMatched,

    /// The line closes this block and is consumed entirely (a closing
    /// fence).
    Closed,
}

pub(crate) struct Parser<'a, 'o> {
    arena: &'a mut Arena,
    options: &'o ParseOptions,
    root: AstNode,
    current: AstNode,
    total_len: usize,
    refmap: FxHashMap<String, LinkDefinition>,
}

impl<'a, 'o> Parser<'a, 'o> {
    fn new(arena: &'a mut Arena, root: AstNode, options: &'o ParseOptions) -> Self {
        Parser {
            arena,
            options,
            root,
            current: root,
            total_len: 0,
            refmap: FxHashMap::default(),
        }
    }

    fn ast(&self, node: AstNode) -> &Ast {
        node.get(self.arena)
    }

    fn ast_mut(&mut self, node: AstNode) -> &mut Ast {
        node.get_mut(self.arena)
    }

    fn feed(&mut self, source: &str) {
        let mut i = if source.starts_with('\u{feff}') { 3 } else { 0 };
        self.total_len = source.len();

        let eol = jetscii::bytes!(b'\n', b'\r');
        let bytes = source.as_bytes();
        let mut scratch = String::new();

        while i < source.len() {
            let rest = &bytes[i..];
            let (content_end, terminator_len) = match eol.find(rest) {
                Some(ix) if rest[ix] == b'\r' && rest.get(ix + 1) == Some(&b'\n') => (ix, 2),
                Some(ix) => (ix, 1),
                None => (rest.len(), 0),
            };
            let total = content_end + terminator_len;
            let line = &source[i..i + total];

            if line.ends_with('\n') && !line.contains('\0') {
                self.process_line(line, i);
            } else {
                scratch.clear();
                for ch in source[i..i + content_end].chars() {
                    scratch.push(if ch == '\0' { '\u{FFFD}' } else { ch });
                }
                scratch.push('\n');
                self.process_line(&scratch, i);
            }

            i += total;
        }
    }

    fn process_line(&mut self, text: &str, start_offset: usize) {
        let mut line = Line::new(text, start_offset);

        let last_matched = match self.check_open_blocks(&mut line) {
            Some(last_matched) => last_matched,
            None => return,
        };

        let container = self.open_new_blocks(last_matched, &mut line);
        self.add_text_to_container(container, last_matched, &mut line);
    }

    /// The continuation pass. Walks the open spine from the root, giving
    /// each block a chance to consume its prefix. Returns the deepest
    /// block that matched, or `None` when the line was consumed whole by a
    /// closing fence.
    fn check_open_blocks(&mut self, line: &mut Line) -> Option<AstNode> {
        let mut container = self.root;

        loop {
            let next = match container.last_child(self.arena) {
                Some(child) if self.ast(child).open => child,
                _ => break,
            };
            container = next;
            line.find_first_nonspace();

            match self.continue_block(container, line) {
                Continuation::Matched => (),
                Continuation::NotMatched => {
                    container = container
                        .parent(self.arena)
                        .expect("open block has a parent");
                    break;
                }
                Continuation::Closed => {
                    let end = line.source_offset(line.len_without_ending());
                    let ast = self.ast_mut(container);
                    if end > ast.span.end {
                        ast.span.end = end;
                    }
                    // A closing container fence also closes every open
                    // block inside it.
                    while self.current != container {
                        let parent =
                            self.finalize(self.current).expect("open spine has a parent");
                        self.current = parent;
                    }
                    let parent = self.finalize(container).expect("fence block has a parent");
                    self.current = parent;
                    return None;
                }
            }
        }

        Some(container)
    }

    /// One open block examines the line. Dispatches on the block's kind.
    fn continue_block(&mut self, node: AstNode, line: &mut Line) -> Continuation {
        // Fence-delimited blocks share one continuation.
        let fence = match self.ast(node).value {
            NodeValue::CodeBlock(ref ncb) if ncb.fenced => {
                Some((ncb.fence_char, ncb.fence_length, ncb.fence_offset))
            }
            NodeValue::MathBlock(ref nmb) => Some((b'$', nmb.fence_length, nmb.fence_offset)),
            NodeValue::CustomContainer(ref ncc) => {
                Some((b':', ncc.fence_length, ncc.fence_offset))
            }
            _ => None,
        };
        if let Some((ch, length, offset)) = fence {
            return self.continue_fenced(line, ch, length, offset);
        }

        match self.ast(node).value {
            NodeValue::BlockQuote => {
                if line.indent <= 3 && !line.blank && line.peek() == b'>' {
                    line.advance_to_first_nonspace();
                    line.advance_offset(1, false);
                    if strings::is_space_or_tab(line.text.as_bytes()[line.offset]) {
                        line.advance_offset(1, true);
                    }
                    Continuation::Matched
                } else {
                    Continuation::NotMatched
                }
            }

            NodeValue::Item(nl) => {
                if line.indent >= nl.marker_offset + nl.padding {
                    line.advance_offset(nl.marker_offset + nl.padding, true);
                    Continuation::Matched
                } else if line.blank && node.first_child(self.arena).is_some() {
                    line.advance_to_first_nonspace();
                    Continuation::Matched
                } else {
                    Continuation::NotMatched
                }
            }

            NodeValue::CodeBlock(..) => {
                if line.indent >= CODE_INDENT {
                    line.advance_offset(CODE_INDENT, true);
                    Continuation::Matched
                } else if line.blank {
                    line.advance_to_first_nonspace();
                    Continuation::Matched
                } else {
                    Continuation::NotMatched
                }
            }

            NodeValue::HtmlBlock(ref nhb) => {
                if line.blank && (nhb.block_type == 6 || nhb.block_type == 7) {
                    Continuation::NotMatched
                } else {
                    Continuation::Matched
                }
            }

            NodeValue::Paragraph | NodeValue::Table(..) => {
                if line.blank {
                    Continuation::NotMatched
                } else {
                    Continuation::Matched
                }
            }

            NodeValue::FootnoteDefinition(..) => {
                if line.indent >= CODE_INDENT {
                    line.advance_offset(CODE_INDENT, true);
                    Continuation::Matched
                } else if line.blank && node.first_child(self.arena).is_some() {
                    line.advance_to_first_nonspace();
                    Continuation::Matched
                } else {
                    Continuation::NotMatched
                }
            }

            NodeValue::List(..) => Continuation::Matched,

            _ => Continuation::NotMatched,
        }
    }

    /// Shared continuation for fence-delimited blocks: a matching closing
    /// fence consumes the line, otherwise up to `fence_offset` columns of
    /// indentation are stripped.
    fn continue_fenced(
        &mut self,
        line: &mut Line,
        fence_char: u8,
        fence_length: usize,
        fence_offset: usize,
    ) -> Continuation {
        if !line.is_indented() && !line.blank && line.peek() == fence_char {
            let head = line.from_first_nonspace();
            let run = head.bytes().take_while(|&b| b == fence_char).count();
            if run >= fence_length && strings::is_blank(&head[run..]) {
                return Continuation::Closed;
            }
        }

        let mut i = fence_offset;
        while i > 0 && strings::is_space_or_tab(line.text.as_bytes()[line.offset]) {
            line.advance_offset(1, true);
            i -= 1;
        }
        Continuation::Matched
    }

    /// The new-block pass. Opens blocks for the markers remaining on the
    /// line, in fixed priority order, descending into each newly opened
    /// container.
    fn open_new_blocks(&mut self, mut container: AstNode, line: &mut Line) -> AstNode {
        let mut maybe_lazy = matches!(self.ast(self.current).value, NodeValue::Paragraph);

        loop {
            match self.ast(container).value {
                NodeValue::Document
                | NodeValue::BlockQuote
                | NodeValue::List(..)
                | NodeValue::Item(..)
                | NodeValue::FootnoteDefinition(..)
                | NodeValue::CustomContainer(..)
                | NodeValue::Paragraph
                | NodeValue::Table(..) => (),
                _ => break,
            }

            line.find_first_nonspace();
            let indented = line.is_indented();
            let ctx = ClassifyContext {
                in_paragraph: matches!(self.ast(container).value, NodeValue::Paragraph),
            };

            match tokenizer::classify(line, self.options, &ctx) {
                Some(BlockToken::QuoteMarker) => {
                    let start = line.source_offset(line.first_nonspace);
                    line.advance_to_first_nonspace();
                    line.advance_offset(1, false);
                    if strings::is_space_or_tab(line.text.as_bytes()[line.offset]) {
                        line.advance_offset(1, true);
                    }
                    container = self.add_child(container, NodeValue::BlockQuote, start);
                }

                Some(BlockToken::AtxHeading { level, consumed }) => {
                    let start = line.source_offset(line.first_nonspace);
                    line.advance_to_first_nonspace();
                    line.advance_offset(consumed, false);
                    container = self.add_child(
                        container,
                        NodeValue::Heading(NodeHeading {
                            level,
                            setext: false,
                            attributes: None,
                        }),
                        start,
                    );
                }

                Some(BlockToken::Fence(fence)) => {
                    let start = line.source_offset(line.first_nonspace);
                    let fence_offset = line.first_nonspace - line.offset;
                    line.advance_to_first_nonspace();
                    line.advance_offset(fence.length, false);

                    match fence.kind {
                        FenceKind::Code => {
                            container = self.add_child(
                                container,
                                NodeValue::CodeBlock(NodeCodeBlock {
                                    fenced: true,
                                    fence_char: fence.ch,
                                    fence_length: fence.length,
                                    fence_offset,
                                    ..NodeCodeBlock::default()
                                }),
                                start,
                            );
                        }
                        FenceKind::Math => {
                            container = self.add_child(
                                container,
                                NodeValue::MathBlock(NodeMathBlock {
                                    fence_length: fence.length,
                                    fence_offset,
                                    literal: String::new(),
                                }),
                                start,
                            );
                            let end = line.len_without_ending();
                            line.advance_offset(end - line.offset, false);
                        }
                        FenceKind::Container => {
                            let (name, attrs) = self.container_info(line);
                            container = self.add_child(
                                container,
                                NodeValue::CustomContainer(NodeCustomContainer {
                                    name,
                                    attributes: attrs,
                                    fence_length: fence.length,
                                    fence_offset,
                                }),
                                start,
                            );
                            let end = line.len_without_ending();
                            line.advance_offset(end - line.offset, false);
                        }
                    }
                }

                Some(BlockToken::HtmlBlockStart { kind }) => {
                    let start = line.source_offset(line.first_nonspace);
                    container = self.add_child(
                        container,
                        NodeValue::HtmlBlock(NodeHtmlBlock {
                            block_type: kind,
                            literal: String::new(),
                        }),
                        start,
                    );
                }

                Some(BlockToken::SetextUnderline { level }) => {
                    if self.resolve_reference_link_definitions(container) {
                        {
                            let ast = self.ast_mut(container);
                            strings::rtrim(&mut ast.content);
                            ast.value = NodeValue::Heading(NodeHeading {
                                level,
                                setext: true,
                                attributes: None,
                            });
                        }
                        let end = line.len_without_ending();
                        line.advance_offset(end - line.offset, false);
                        let end_abs = line.source_offset(end);
                        let ast = self.ast_mut(container);
                        if end_abs > ast.span.end {
                            ast.span.end = end_abs;
                        }
                        break;
                    }
                    // The paragraph was nothing but definitions; close it
                    // and reconsider the underline from the parent.
                    let parent = self.finalize(container).expect("paragraph has a parent");
                    if self.current == container {
                        self.current = parent;
                    }
                    container = parent;
                    continue;
                }

                Some(BlockToken::ThematicBreak) => {
                    let start = line.source_offset(line.first_nonspace);
                    container = self.add_child(container, NodeValue::ThematicBreak, start);
                    let end = line.len_without_ending();
                    line.advance_offset(end - line.offset, false);
                    self.ast_mut(container).span.end = line.source_offset(end);
                }

                Some(BlockToken::FootnoteLabel { name, consumed }) => {
                    let start = line.source_offset(line.first_nonspace);
                    line.advance_to_first_nonspace();
                    line.advance_offset(consumed, false);
                    container = self.add_child(
                        container,
                        NodeValue::FootnoteDefinition(NodeFootnoteDefinition {
                            name,
                            total_references: 0,
                        }),
                        start,
                    );
                }

                Some(BlockToken::ListMarker(token)) => {
                    container = self.open_list_item(container, line, token);
                }

                None => {
                    if indented && !maybe_lazy && !line.blank {
                        let start = line.source_offset(line.offset);
                        line.advance_offset(CODE_INDENT, true);
                        container = self.add_child(
                            container,
                            NodeValue::CodeBlock(NodeCodeBlock {
                                fenced: false,
                                ..NodeCodeBlock::default()
                            }),
                            start,
                        );
                    } else if self.options.table && !line.blank {
                        match table::try_opening_block(self, container, line) {
                            Some(table) => container = table,
                            None => (),
                        }
                        break;
                    } else {
                        break;
                    }
                }
            }

            maybe_lazy = false;
        }

        container
    }

    /// Opens a list item (and its list, unless the marker continues the
    /// open one). Resolves Roman/alphabetic marker ambiguity against the
    /// open list.
    fn open_list_item(
        &mut self,
        container: AstNode,
        line: &mut Line,
        token: tokenizer::ListMarkerToken,
    ) -> AstNode {
        let mut nl = token.list;
        nl.marker_offset = line.indent;

        let start = line.source_offset(line.first_nonspace);
        line.advance_to_first_nonspace();
        line.advance_offset(token.marker_len, false);

        // Measure the spacing after the marker to pick the item's padding:
        // one to four spaces count; none, five or more, or a blank rest
        // mean a one-space padding with the rest as content.
        let save_offset = line.offset;
        let save_column = line.column;
        let save_tab = line.partially_consumed_tab;

        let bytes = line.text.as_bytes();
        while line.column - save_column <= 5 && strings::is_space_or_tab(bytes[line.offset]) {
            line.advance_offset(1, true);
        }

        let spaces = line.column - save_column;
        if spaces >= 5 || spaces < 1 || strings::is_line_end_char(bytes[line.offset]) {
            nl.padding = token.marker_len + 1;
            line.offset = save_offset;
            line.column = save_column;
            line.partially_consumed_tab = save_tab;
            if strings::is_space_or_tab(bytes[line.offset]) {
                line.advance_offset(1, true);
            }
        } else {
            nl.padding = token.marker_len + spaces;
        }

        let open_list = match self.ast(container).value {
            NodeValue::List(open_list) => Some(open_list),
            _ => None,
        };
        let list = match open_list {
            Some(open) if self.lists_match(container, &open, &mut nl) => container,
            _ => self.add_child(container, NodeValue::List(nl), start),
        };

        self.add_child(list, NodeValue::Item(nl), start)
    }

    /// Whether a new marker continues the open list, reconciling ordinal
    /// styles in the process:
    ///
    /// - a Roman list accepts alphabetic markers drawn from the Roman
    ///   letters (`v.` after `iv.`);
    /// - a single `i` that opened a Roman list is downgraded to an
    ///   alphabetic `i` when the next marker is alphabetic but not Roman;
    /// - a lone `i` after `h.` continues the alphabetic list.
    fn lists_match(&mut self, list_node: AstNode, open: &NodeList, new: &mut NodeList) -> bool {
        if open.list_type != new.list_type
            || open.delimiter != new.delimiter
            || open.bullet_char != new.bullet_char
        {
            return false;
        }
        if open.style == new.style {
            return true;
        }

        let roman_pair = |roman: ListStyle, alpha: ListStyle| {
            (roman == ListStyle::LowerRoman && alpha == ListStyle::LowerAlpha)
                || (roman == ListStyle::UpperRoman && alpha == ListStyle::UpperAlpha)
        };

        if roman_pair(open.style, new.style) {
            let letter = (b'a' + (new.start - 1) as u8) as char;
            if "ivxlcdm".contains(letter.to_ascii_lowercase()) {
                // A Roman continuation that happened to scan as alphabetic.
                new.style = open.style;
                return true;
            }
            // Only a lone `i` opener is ambiguous enough to downgrade.
            let single_item = {
                let first = list_node.first_child(self.arena);
                first.is_some() && first == list_node.last_child(self.arena)
            };
            if single_item && open.start == 1 {
                let downgraded = new.style;
                if let NodeValue::List(ref mut open_nl) = self.ast_mut(list_node).value {
                    open_nl.style = downgraded;
                    open_nl.start = 9; // the opener's `i`, reread as a letter
                }
                if let Some(item) = list_node.first_child(self.arena) {
                    if let NodeValue::Item(ref mut item_nl) = self.ast_mut(item).value {
                        item_nl.style = downgraded;
                    }
                }
                return true;
            }
            return false;
        }

        if roman_pair(new.style, open.style) && new.start == 1 {
            // A lone `i` continuing an alphabetic list.
            new.style = open.style;
            return true;
        }

        false
    }

    /// Reads the name and optional attribute block from the rest of a
    /// container fence line.
    fn container_info(&mut self, line: &Line) -> (String, Option<NodeAttributes>) {
        let end = line.len_without_ending();
        let mut tail = &line.text[line.offset..end];

        let mut attrs = None;
        if self.options.attributes {
            let padded = format!("{}\n", tail);
            if let Some((parsed, open_ix)) = attributes::parse_trailing_attributes(&padded) {
                attrs = Some(parsed);
                tail = &tail[..open_ix];
            }
        }

        let name = strings::trim_slice(tail)
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();
        (name, attrs)
    }

    /// The text pass. Closes blocks the continuation pass abandoned
    /// (unless the line lazily continues the open paragraph) and hands the
    /// rest of the line to the deepest block.
    fn add_text_to_container(
        &mut self,
        mut container: AstNode,
        last_matched: AstNode,
        line: &mut Line,
    ) {
        line.find_first_nonspace();

        let last_line_blank = line.blank
            && match self.ast(container).value {
                NodeValue::BlockQuote | NodeValue::Heading(..) | NodeValue::ThematicBreak => false,
                NodeValue::CodeBlock(ref ncb) => !ncb.fenced,
                NodeValue::Item(..) => {
                    container.first_child(self.arena).is_some()
                        || self.ast(container).span.start < line.start_offset
                }
                _ => true,
            };
        self.ast_mut(container).last_line_blank = last_line_blank;

        let lazy = self.current != last_matched
            && container == last_matched
            && !line.blank
            && matches!(self.ast(self.current).value, NodeValue::Paragraph);

        if lazy {
            let current = self.current;
            line.advance_to_first_nonspace();
            self.add_line(current, line);
            return;
        }

        while self.current != last_matched {
            let parent = self.finalize(self.current).expect("spine has a parent");
            self.current = parent;
        }

        enum Sink {
            Raw,
            Html(u8),
            Lines,
            Blocks,
        }
        let sink = match self.ast(container).value {
            NodeValue::CodeBlock(..) | NodeValue::MathBlock(..) => Sink::Raw,
            NodeValue::HtmlBlock(ref nhb) => Sink::Html(nhb.block_type),
            ref value if value.accepts_lines() => Sink::Lines,
            _ => Sink::Blocks,
        };

        match sink {
            Sink::Raw => self.add_line(container, line),
            Sink::Html(kind) => {
                self.add_line(container, line);

                let tail = line.from_first_nonspace().as_bytes();
                let done = match kind {
                    1 => scanners::html_block_end_1(tail),
                    2 => scanners::html_block_end_2(tail),
                    3 => scanners::html_block_end_3(tail),
                    4 => scanners::html_block_end_4(tail),
                    5 => scanners::html_block_end_5(tail),
                    _ => false,
                };
                if done {
                    container = self.finalize(container).expect("html block has a parent");
                }
            }
            Sink::Lines => {
                line.advance_to_first_nonspace();
                self.add_line(container, line);
            }
            Sink::Blocks => {
                if !line.blank
                    && self
                        .ast(container)
                        .value
                        .can_contain_type(&NodeValue::Paragraph)
                {
                    let start = line.source_offset(line.first_nonspace);
                    container = self.add_child(container, NodeValue::Paragraph, start);
                    line.advance_to_first_nonspace();
                    self.add_line(container, line);
                }
            }
        }

        self.current = container;
    }

    /// Appends the rest of the line to the node's content, recording where
    /// it came from.
    fn add_line(&mut self, node: AstNode, line: &mut Line) {
        let partially_consumed_tab = line.partially_consumed_tab;
        let spaces = TAB_STOP - (line.column % TAB_STOP);
        if partially_consumed_tab {
            line.offset += 1;
        }
        let end = line.len_without_ending();
        let end_abs = line.source_offset(end);
        let offset = line.offset;
        let source_offset = line.source_offset(offset);

        let ast = self.ast_mut(node);
        assert!(ast.open);

        if partially_consumed_tab {
            for _ in 0..spaces {
                ast.content.push(' ');
            }
        }
        ast.position_map
            .push_anchor(ast.content.len(), source_offset);
        if offset < end {
            ast.content.push_str(&line.text[offset..end]);
        }
        ast.content.push('\n');

        if end_abs > ast.span.end {
            ast.span.end = end_abs;
        }
    }

    /// Adds a child block, closing open blocks until a valid parent is
    /// found.
    pub(crate) fn add_child(
        &mut self,
        mut parent: AstNode,
        value: NodeValue,
        start: usize,
    ) -> AstNode {
        while !self.ast(parent).value.can_contain_type(&value) {
            parent = self
                .finalize(parent)
                .expect("the document block contains everything");
        }

        let node = AstNode::create(self.arena, Ast::new(value, start));
        parent.append(self.arena, node);
        node
    }

    /// Closes a block: resolves its accumulated content into its final
    /// shape. Returns the parent.
    fn finalize(&mut self, node: AstNode) -> Option<AstNode> {
        let parent = node.parent(self.arena);
        {
            let ast = self.ast_mut(node);
            assert!(ast.open);
            ast.open = false;
        }

        enum Close {
            Paragraph,
            FencedCode,
            IndentedCode,
            Math,
            Html,
            Heading { setext: bool },
            List,
            Other,
        }
        let close = match self.ast(node).value {
            NodeValue::Paragraph => Close::Paragraph,
            NodeValue::CodeBlock(ref ncb) => {
                if ncb.fenced {
                    Close::FencedCode
                } else {
                    Close::IndentedCode
                }
            }
            NodeValue::MathBlock(..) => Close::Math,
            NodeValue::HtmlBlock(..) => Close::Html,
            NodeValue::Heading(ref nh) => Close::Heading { setext: nh.setext },
            NodeValue::List(..) => Close::List,
            _ => Close::Other,
        };

        match close {
            Close::Paragraph => {
                if !self.resolve_reference_link_definitions(node) {
                    node.detach(self.arena);
                }
            }

            Close::FencedCode => self.finalize_fenced_code(node),

            Close::IndentedCode => {
                let ast = self.ast_mut(node);
                let mut content = mem::take(&mut ast.content);
                strings::remove_trailing_blank_lines(&mut content);
                content.push('\n');
                if let NodeValue::CodeBlock(ref mut ncb) = ast.value {
                    ncb.literal = content;
                }
            }

            Close::Math => {
                let ast = self.ast_mut(node);
                let content = mem::take(&mut ast.content);
                // The first content line is the remainder of the fence
                // line, which is blank.
                let literal = match content.find('\n') {
                    Some(ix) => content[ix + 1..].to_string(),
                    None => content,
                };
                if let NodeValue::MathBlock(ref mut nmb) = ast.value {
                    nmb.literal = literal;
                }
            }

            Close::Html => {
                let ast = self.ast_mut(node);
                let content = mem::take(&mut ast.content);
                if let NodeValue::HtmlBlock(ref mut nhb) = ast.value {
                    nhb.literal = content;
                }
            }

            Close::Heading { setext } => {
                let attributes_enabled = self.options.attributes;
                let ast = self.ast_mut(node);
                strings::rtrim(&mut ast.content);
                if !setext {
                    strings::chop_trailing_hashtags(&mut ast.content);
                }
                if attributes_enabled {
                    let trailing = {
                        let padded = format!("{}\n", ast.content);
                        attributes::parse_trailing_attributes(&padded)
                    };
                    if let Some((attrs, open_ix)) = trailing {
                        ast.content.truncate(open_ix);
                        strings::rtrim(&mut ast.content);
                        if let NodeValue::Heading(ref mut nh) = ast.value {
                            nh.attributes = Some(attrs);
                        }
                    }
                }
            }

            Close::List => self.determine_list_tight(node),

            Close::Other => (),
        }

        // A container ends where its last child does.
        if let Some(last_child) = node.last_child(self.arena) {
            let child_end = self.ast(last_child).span.end;
            let ast = self.ast_mut(node);
            if child_end > ast.span.end {
                ast.span.end = child_end;
            }
        }

        parent
    }

    fn finalize_fenced_code(&mut self, node: AstNode) {
        let attributes_enabled = self.options.attributes;
        let ast = self.ast_mut(node);
        let content = mem::take(&mut ast.content);

        let (info_line, literal) = match content.find('\n') {
            Some(ix) => (&content[..ix], content[ix + 1..].to_string()),
            None => (&content[..], String::new()),
        };

        let mut info_line = info_line.to_string();
        let mut attrs = None;
        if attributes_enabled {
            let padded = format!("{}\n", info_line);
            if let Some((parsed, open_ix)) = attributes::parse_trailing_attributes(&padded) {
                attrs = Some(parsed);
                info_line.truncate(open_ix);
            }
        }

        let mut info = crate::entity::unescape_html(&info_line);
        strings::unescape(&mut info);
        strings::trim(&mut info);

        if let NodeValue::CodeBlock(ref mut ncb) = ast.value {
            ncb.info = info;
            ncb.attributes = attrs;
            ncb.literal = literal;
        }
    }

    /// Strips leading link-reference definitions from a paragraph. Emits a
    /// `LinkReferenceDefinition` node per definition and registers each
    /// label, first definition winning. Returns false when nothing but
    /// definitions remained.
    fn resolve_reference_link_definitions(&mut self, node: AstNode) -> bool {
        if !self.ast(node).content.starts_with('[') {
            return true;
        }

        let (consumed, definitions) = {
            let ast = self.ast(node);
            LinkReferenceParser::new(&ast.content, self.options.attributes).run()
        };

        if consumed == 0 {
            return true;
        }

        for definition in definitions {
            let (range_start, range_end) = definition.range;
            let (start, end) = {
                let ast = self.ast(node);
                (
                    ast.position_map.source(range_start),
                    ast.position_map.source(range_end.saturating_sub(1)),
                )
            };

            let mut def_ast = Ast::new(NodeValue::LinkReferenceDefinition, start);
            def_ast.span = Span::new(start, end);
            def_ast.open = false;
            let def_node = AstNode::create(self.arena, def_ast);
            node.insert_before(self.arena, def_node);

            self.refmap
                .entry(definition.label)
                .or_insert(LinkDefinition {
                    url: definition.url,
                    title: definition.title,
                    attributes: definition.attributes,
                    span: Span::new(start, end),
                });
        }

        let ast = self.ast_mut(node);
        ast.content.replace_range(..consumed, "");
        ast.position_map.advance(consumed);
        if strings::is_blank(&ast.content) {
            false
        } else {
            ast.span.start = ast.position_map.source(0);
            true
        }
    }

    fn determine_list_tight(&mut self, list: AstNode) {
        let mut tight = true;

        let items: Vec<AstNode> = list.children(self.arena).collect();
        'outer: for (ix, &item) in items.iter().enumerate() {
            let item_has_next = ix + 1 < items.len();
            if self.ast(item).last_line_blank && item_has_next {
                tight = false;
                break;
            }
            let children: Vec<AstNode> = item.children(self.arena).collect();
            for (cx, &child) in children.iter().enumerate() {
                if self.ends_with_blank_line(child) && (item_has_next || cx + 1 < children.len()) {
                    tight = false;
                    break 'outer;
                }
            }
        }

        if let NodeValue::List(ref mut nl) = self.ast_mut(list).value {
            nl.tight = tight;
        }
        for item in items {
            if let NodeValue::Item(ref mut nl) = self.ast_mut(item).value {
                nl.tight = tight;
            }
        }
    }

    fn ends_with_blank_line(&self, mut node: AstNode) -> bool {
        loop {
            if self.ast(node).last_line_blank {
                return true;
            }
            match self.ast(node).value {
                NodeValue::List(..) | NodeValue::Item(..) => match node.last_child(self.arena) {
                    Some(child) => node = child,
                    None => return false,
                },
                _ => return false,
            }
        }
    }

    fn finish(&mut self) -> (FxHashMap<String, LinkDefinition>, FxHashMap<String, AstNode>) {
        while self.current != self.root {
            let parent = self.finalize(self.current).expect("spine has a parent");
            self.current = parent;
        }
        self.finalize(self.root);
        self.ast_mut(self.root).span.end = self.total_len;

        self.process_heading_references();
        self.process_inlines();
        self.postprocess_text_nodes();
        let footnotes = self.process_footnotes();

        (mem::take(&mut self.refmap), footnotes)
    }

    /// Assigns heading identifiers and, when enabled, registers each
    /// heading as a link reference. Runs before inline parsing so that
    /// references anywhere in the document resolve.
    fn process_heading_references(&mut self) {
        if !self.options.auto_identifiers && !self.options.heading_references {
            return;
        }

        let mut anchorizer = Anchorizer::new();
        let headings: Vec<AstNode> = self
            .root
            .descendants(self.arena)
            .filter(|n| matches!(self.ast(*n).value, NodeValue::Heading(..)))
            .collect();

        for node in headings {
            let raw = self.ast(node).content.clone();
            let explicit_id = match self.ast(node).value {
                NodeValue::Heading(ref nh) => nh.attributes.as_ref().and_then(|a| a.id.clone()),
                _ => continue,
            };

            let id = match explicit_id {
                Some(id) => id,
                None => {
                    let id = anchorizer.anchorize(&raw);
                    if self.options.auto_identifiers {
                        if let NodeValue::Heading(ref mut nh) = self.ast_mut(node).value {
                            nh.attributes.get_or_insert_with(NodeAttributes::default).id =
                                Some(id.clone());
                        }
                    }
                    id
                }
            };

            if self.options.heading_references {
                let label = strings::normalize_label(&raw);
                if !label.is_empty() {
                    let prefix = self.options.attribute_prefix.as_deref().unwrap_or("");
                    let span = self.ast(node).span;
                    self.refmap.entry(label).or_insert(LinkDefinition {
                        url: format!("#{}{}", prefix, id),
                        title: String::new(),
                        attributes: None,
                        span,
                    });
                }
            }
        }
    }

    fn process_inlines(&mut self) {
        let leaves: Vec<AstNode> = self
            .root
            .descendants(self.arena)
            .filter(|n| self.ast(*n).value.contains_inlines())
            .collect();

        for node in leaves {
            let (mut content, map) = {
                let ast = self.ast_mut(node);
                (mem::take(&mut ast.content), mem::take(&mut ast.position_map))
            };
            strings::rtrim(&mut content);

            let mut subject =
                inlines::Subject::new(self.arena, self.options, &content, &map, &self.refmap);
            while subject.parse_inline(node) {}
            subject.finish();
        }
    }

    /// Coalesces adjacent text nodes, then applies the task-list and bare
    /// autolink passes, both of which inspect finished text.
    fn postprocess_text_nodes(&mut self) {
        let mut stack = vec![self.root];

        while let Some(node) = stack.pop() {
            let mut child = node.first_child(self.arena);
            while let Some(this) = child {
                if matches!(self.ast(this).value, NodeValue::Text(..)) {
                    child = self.coalesce_text_from(this);
                } else {
                    stack.push(this);
                    child = this.next_sibling(self.arena);
                }
            }
        }

        if self.options.tasklist {
            self.process_tasklist();
        }
        if self.options.autolink {
            self.process_autolinks();
        }
    }

    /// Merges the run of text siblings starting at `node`; returns the
    /// node after the run.
    fn coalesce_text_from(&mut self, node: AstNode) -> Option<AstNode> {
        loop {
            let next = match node.next_sibling(self.arena) {
                Some(next) if matches!(self.ast(next).value, NodeValue::Text(..)) => next,
                other => return other,
            };

            let (addition, end) = {
                let ast = self.ast(next);
                match ast.value {
                    NodeValue::Text(ref t) => (t.clone(), ast.span.end),
                    _ => return Some(next),
                }
            };
            let ast = self.ast_mut(node);
            if let NodeValue::Text(ref mut t) = ast.value {
                t.push_str(&addition);
            }
            if end > ast.span.end {
                ast.span.end = end;
            }
            next.detach(self.arena);
        }
    }

    fn process_tasklist(&mut self) {
        let items: Vec<AstNode> = self
            .root
            .descendants(self.arena)
            .filter(|n| matches!(self.ast(*n).value, NodeValue::Item(..)))
            .collect();

        for item in items {
            let paragraph = match item.first_child(self.arena) {
                Some(p) if matches!(self.ast(p).value, NodeValue::Paragraph) => p,
                _ => continue,
            };
            let text_node = match paragraph.first_child(self.arena) {
                Some(t) => t,
                None => continue,
            };

            let symbol = {
                let ast = self.ast(text_node);
                let text = match ast.value.text() {
                    Some(text) => text,
                    None => continue,
                };
                let bytes = text.as_bytes();
                if bytes.len() < 4
                    || bytes[0] != b'['
                    || bytes[2] != b']'
                    || bytes[3] != b' '
                    || !matches!(bytes[1], b' ' | b'x' | b'X')
                {
                    continue;
                }
                bytes[1] as char
            };

            {
                let ast = self.ast_mut(text_node);
                if let NodeValue::Text(ref mut t) = ast.value {
                    t.replace_range(..4, "");
                }
                ast.span.start += 4;
            }

            let symbol = if symbol == ' ' { None } else { Some(symbol) };
            self.ast_mut(item).value = NodeValue::TaskItem(symbol);
        }
    }

    fn process_autolinks(&mut self) {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            let mut child = node.first_child(self.arena);
            while let Some(this) = child {
                let next = this.next_sibling(self.arena);
                if matches!(self.ast(this).value, NodeValue::Text(..)) {
                    autolink::process_autolinks(self.arena, this);
                } else if !matches!(
                    self.ast(this).value,
                    // No bare links inside links.
                    NodeValue::Link(..) | NodeValue::Image(..)
                ) {
                    stack.push(this);
                }
                child = next;
            }
        }
    }

    /// Numbers footnote references in first-use order, moves used
    /// definitions to the end of the document in that order, and drops
    /// unused ones.
    fn process_footnotes(&mut self) -> FxHashMap<String, AstNode> {
        if !self.options.footnotes {
            return FxHashMap::default();
        }

        let definitions: Vec<AstNode> = self
            .root
            .descendants(self.arena)
            .filter(|n| matches!(self.ast(*n).value, NodeValue::FootnoteDefinition(..)))
            .collect();

        let mut map: HashMap<String, AstNode> = HashMap::new();
        for def in definitions {
            def.detach(self.arena);
            let name = match self.ast(def).value {
                NodeValue::FootnoteDefinition(ref nfd) => strings::normalize_label(&nfd.name),
                _ => continue,
            };
            map.entry(name).or_insert(def);
        }

        let references: Vec<AstNode> = self
            .root
            .descendants(self.arena)
            .filter(|n| matches!(self.ast(*n).value, NodeValue::FootnoteReference(..)))
            .collect();

        let mut used: Vec<(AstNode, u32)> = vec![];
        let mut next_ix = 0u32;

        for reference in references {
            let name = match self.ast(reference).value {
                NodeValue::FootnoteReference(ref nfr) => strings::normalize_label(&nfr.name),
                _ => continue,
            };

            match map.get(&name) {
                Some(&def) => {
                    let ix = match used.iter().position(|&(d, _)| d == def) {
                        Some(pos) => used[pos].1,
                        None => {
                            next_ix += 1;
                            used.push((def, next_ix));
                            next_ix
                        }
                    };
                    let ref_num = match self.ast_mut(def).value {
                        NodeValue::FootnoteDefinition(ref mut nfd) => {
                            nfd.total_references += 1;
                            nfd.total_references
                        }
                        _ => continue,
                    };
                    if let NodeValue::FootnoteReference(ref mut nfr) =
                        self.ast_mut(reference).value
                    {
                        nfr.ix = ix;
                        nfr.ref_num = ref_num;
                    }
                }
                None => {
                    // No definition; the reference reads as literal text.
                    let name_text = match self.ast(reference).value {
                        NodeValue::FootnoteReference(ref nfr) => nfr.name.clone(),
                        _ => continue,
                    };
                    self.ast_mut(reference).value = NodeValue::Text(format!("[^{}]", name_text));
                }
            }
        }

        let mut footnotes = FxHashMap::default();
        for &(def, _) in &used {
            let root = self.root;
            root.append(self.arena, def);
            let name = match self.ast(def).value {
                NodeValue::FootnoteDefinition(ref nfd) => strings::normalize_label(&nfd.name),
                _ => continue,
            };
            footnotes.insert(name, def);
        }

        footnotes
    }
}
