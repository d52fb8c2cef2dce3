//! The inline parser.
//!
//! A [`Subject`] walks one leaf block's accumulated content and appends
//! inline nodes to it. Emphasis delimiters and brackets cannot be resolved
//! left to right, so candidate tokens go onto stacks while parsing and are
//! matched up afterwards: delimiters in
//! [`process_emphasis`](Subject::process_emphasis), brackets as each `]`
//! is seen. Source spans are translated back through the block's
//! [`PositionMap`].

use rustc_hash::FxHashMap;
use unicode_categories::UnicodeCategories;

use crate::ctype::{isdigit, ispunct, isspace};
use crate::entity;
use crate::nodes::{
    Arena, Ast, AstNode, LinkDefinition, NodeAttributes, NodeCode, NodeFootnoteReference, NodeLink,
    NodeMath, NodeShortCode, NodeValue, Span,
};
use crate::parser::attributes::parse_attribute_block;
use crate::parser::ParseOptions;
use crate::position::PositionMap;
use crate::scanners;
use crate::strings;

const MAXBACKTICKS: usize = 80;
const MAX_LINK_LABEL_LENGTH: usize = 1000;
const MAX_MATH_DOLLARS: usize = 2;

pub struct Subject<'a, 'o, 'i, 'r> {
    arena: &'a mut Arena,
    options: &'o ParseOptions,
    input: &'i str,
    pos: usize,
    map: &'i PositionMap,
    refmap: &'r FxHashMap<String, LinkDefinition>,
    flags: Flags,
    delimiters: Vec<Delimiter>,
    last_delimiter: Option<usize>,
    brackets: Vec<Bracket>,
    backticks: [usize; MAXBACKTICKS + 1],
    scanned_for_backticks: bool,
    special_chars: [bool; 256],
    skip_chars: [bool; 256],
}

/// Quadratic-behavior guards: once a construct fails to close anywhere in
/// the remaining input, stop rescanning for it.
#[derive(Default)]
struct Flags {
    skip_html_cdata: bool,
    skip_html_declaration: bool,
    skip_html_pi: bool,
    skip_html_comment: bool,
}

/// A candidate emphasis delimiter run. Entries live in a `Vec` and link to
/// each other by index; removal just unlinks.
struct Delimiter {
    inl: AstNode,
    position: usize,
    length: usize,
    delim_char: u8,
    can_open: bool,
    can_close: bool,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Bracket {
    inl_text: AstNode,
    position: usize,
    image: bool,

    /// Cleared on every non-image bracket still open when a link closes;
    /// links cannot nest.
    active: bool,

    /// Whether another bracket opened after this one. A shortcut reference
    /// label must not contain one.
    bracket_after: bool,
}

impl<'a, 'o, 'i, 'r> Subject<'a, 'o, 'i, 'r> {
    pub fn new(
        arena: &'a mut Arena,
        options: &'o ParseOptions,
        input: &'i str,
        map: &'i PositionMap,
        refmap: &'r FxHashMap<String, LinkDefinition>,
    ) -> Self {
        let mut s = Subject {
            arena,
            options,
            input,
            pos: 0,
            map,
            refmap,
            flags: Flags::default(),
            delimiters: vec![],
            last_delimiter: None,
            brackets: vec![],
            backticks: [0; MAXBACKTICKS + 1],
            scanned_for_backticks: false,
            special_chars: [false; 256],
            skip_chars: [false; 256],
        };
        for &c in b"\n\r_*`\\&<[]!" {
            s.special_chars[c as usize] = true;
        }
        if options.strikethrough {
            s.special_chars[b'~' as usize] = true;
            s.skip_chars[b'~' as usize] = true;
        }
        if options.math {
            s.special_chars[b'$' as usize] = true;
        }
        if options.emoji {
            s.special_chars[b':' as usize] = true;
        }
        s
    }

    /// Parses one inline token, appending it to `node`. Returns false at
    /// end of input.
    pub fn parse_inline(&mut self, node: AstNode) -> bool {
        let c = match self.peek_char() {
            None => return false,
            Some(ch) => ch,
        };

        let new_inl: Option<AstNode> = match c {
            b'\r' | b'\n' => Some(self.handle_newline()),
            b'`' => Some(self.handle_backticks()),
            b'\\' => Some(self.handle_backslash()),
            b'&' => Some(self.handle_entity()),
            b'<' => Some(self.handle_pointy_brace()),
            b'*' | b'_' => Some(self.handle_delim(c)),
            b'~' if self.options.strikethrough => Some(self.handle_delim(b'~')),
            b'$' if self.options.math => Some(self.handle_dollars()),
            b':' if self.options.emoji => match self.handle_shortcode() {
                Some(inl) => Some(inl),
                None => {
                    self.pos += 1;
                    Some(self.make_inline(
                        NodeValue::Text(":".to_string()),
                        self.pos - 1,
                        self.pos,
                    ))
                }
            },
            b'[' => {
                self.pos += 1;
                let inl =
                    self.make_inline(NodeValue::Text("[".to_string()), self.pos - 1, self.pos);
                self.push_bracket(false, inl);
                Some(inl)
            }
            b']' => self.handle_close_bracket(),
            b'!' => {
                self.pos += 1;
                if self.peek_char() == Some(b'[') && self.peek_char_n(1) != Some(b'^') {
                    self.pos += 1;
                    let inl = self.make_inline(
                        NodeValue::Text("![".to_string()),
                        self.pos - 2,
                        self.pos,
                    );
                    self.push_bracket(true, inl);
                    Some(inl)
                } else {
                    Some(self.make_inline(
                        NodeValue::Text("!".to_string()),
                        self.pos - 1,
                        self.pos,
                    ))
                }
            }
            _ => {
                let mut endpos = self.find_special_char();
                let mut contents = self.input[self.pos..endpos].to_string();
                let mut startpos = self.pos;
                self.pos = endpos;

                if self.peek_char().map_or(false, strings::is_line_end_char) {
                    let before = contents.len();
                    strings::rtrim(&mut contents);
                    endpos -= before - contents.len();
                }

                // A hard break eats the indentation of the next line.
                if node.last_child(self.arena).map_or(false, |n| {
                    matches!(n.get(self.arena).value, NodeValue::LineBreak)
                }) {
                    let before = contents.len();
                    strings::ltrim(&mut contents);
                    startpos += before - contents.len();
                }

                if contents.is_empty() {
                    None
                } else {
                    Some(self.make_inline(NodeValue::Text(contents), startpos, endpos))
                }
            }
        };

        if let Some(inl) = new_inl {
            node.append(self.arena, inl);
        }

        true
    }

    /// Resolves whatever is still on the stacks once the input is
    /// exhausted.
    pub fn finish(&mut self) {
        self.process_emphasis(0);
        while self.brackets.pop().is_some() {}
    }

    // The delimiters form a doubly-linked list of candidate runs ("*",
    // "__", "~~" and so on) in source order. Starting just above
    // `stack_bottom`, each closer-capable run searches down the list for a
    // matching opener; matched pairs are lowered into Emph, Strong or
    // Strikethrough nodes by `insert_emph`, and everything left over is
    // plain text. The `openers_bottom` array remembers, per delimiter
    // class, how far down an earlier search already failed, which keeps
    // pathological inputs linear.
    pub fn process_emphasis(&mut self, stack_bottom: usize) {
        let mut openers_bottom: [usize; 8] = [stack_bottom; 8];

        let mut candidate = self.last_delimiter;
        let mut closer: Option<usize> = None;
        while let Some(c) = candidate {
            if self.delimiters[c].position < stack_bottom {
                break;
            }
            closer = Some(c);
            candidate = self.delimiters[c].prev;
        }

        while let Some(c) = closer {
            if !self.delimiters[c].can_close {
                closer = self.delimiters[c].next;
                continue;
            }

            // "*" runs get separate buckets by openable-ness and length
            // mod 3 because of the mod-three rule below.
            let ix = match self.delimiters[c].delim_char {
                b'_' => 0,
                b'~' => 1,
                b'*' => {
                    2 + if self.delimiters[c].can_open { 3 } else { 0 }
                        + self.delimiters[c].length % 3
                }
                _ => unreachable!(),
            };

            let mut opener = self.delimiters[c].prev;
            let mut opener_ix = None;
            let mut mod_three_rule_invoked = false;
            while let Some(o) = opener {
                if self.delimiters[o].position < openers_bottom[ix] {
                    break;
                }
                if self.delimiters[o].can_open
                    && self.delimiters[o].delim_char == self.delimiters[c].delim_char
                {
                    // The mod-three rule: when one side of a pair could
                    // serve both roles, runs whose lengths sum to a
                    // multiple of three cannot pair up, unless both are
                    // themselves multiples of three.
                    let odd_match = (self.delimiters[c].can_open || self.delimiters[o].can_close)
                        && (self.delimiters[o].length + self.delimiters[c].length) % 3 == 0
                        && !(self.delimiters[o].length % 3 == 0
                            && self.delimiters[c].length % 3 == 0);
                    if !odd_match {
                        opener_ix = Some(o);
                        break;
                    }
                    mod_three_rule_invoked = true;
                }
                opener = self.delimiters[o].prev;
            }

            let old_c = c;

            match opener_ix {
                // Strikethrough runs must consume each other whole; a
                // length mismatch never pairs, but later delimiters still
                // get their turn.
                Some(o) if self.tilde_mismatch(o, c) => {
                    closer = self.delimiters[c].next;
                }
                Some(o) => closer = self.insert_emph(o, c),
                None => closer = self.delimiters[c].next,
            }

            if opener_ix.is_none() {
                if !mod_three_rule_invoked {
                    openers_bottom[ix] = self.delimiters[old_c].position;
                }
                // A closer that cannot open is now known to be plain text.
                if !self.delimiters[old_c].can_open {
                    self.remove_delimiter(old_c);
                }
            }
        }

        self.remove_delimiters(stack_bottom);
    }

    /// A `~` pair only strikes when both runs are the same length and no
    /// delimiter characters would be left over.
    fn tilde_mismatch(&self, opener: usize, closer: usize) -> bool {
        if self.delimiters[closer].delim_char != b'~' {
            return false;
        }
        let len = |d: usize| {
            self.delimiters[d]
                .inl
                .get(self.arena)
                .value
                .text()
                .map_or(0, |t| t.len())
        };
        let opener_len = len(opener);
        opener_len != len(closer) || opener_len > 2
    }

    fn remove_delimiter(&mut self, d: usize) {
        let (prev, next) = (self.delimiters[d].prev, self.delimiters[d].next);
        match next {
            Some(n) => self.delimiters[n].prev = prev,
            None => {
                debug_assert_eq!(Some(d), self.last_delimiter);
                self.last_delimiter = prev;
            }
        }
        if let Some(p) = prev {
            self.delimiters[p].next = next;
        }
    }

    fn remove_delimiters(&mut self, stack_bottom: usize) {
        while let Some(d) = self.last_delimiter {
            if self.delimiters[d].position < stack_bottom {
                break;
            }
            self.remove_delimiter(d);
        }
    }

    /// Creates the emphasis node for a matched `opener`/`closer` pair,
    /// reparenting everything between them into it. Runs longer than two
    /// are consumed two characters at a time; the truncated pair is handed
    /// back to be matched again.
    fn insert_emph(&mut self, opener: usize, closer: usize) -> Option<usize> {
        let opener_inl = self.delimiters[opener].inl;
        let closer_inl = self.delimiters[closer].inl;

        let (opener_char, mut opener_num_chars) = {
            let text = opener_inl.get(self.arena).value.text().unwrap();
            (text.as_bytes()[0], text.len())
        };
        let mut closer_num_chars = closer_inl.get(self.arena).value.text().unwrap().len();
        let use_delims = if closer_num_chars >= 2 && opener_num_chars >= 2 {
            2
        } else {
            1
        };

        opener_num_chars -= use_delims;
        closer_num_chars -= use_delims;

        let opener_span = opener_inl.get(self.arena).span;
        let closer_span = closer_inl.get(self.arena).span;

        opener_inl
            .get_mut(self.arena)
            .value
            .text_mut()
            .unwrap()
            .truncate(opener_num_chars);
        closer_inl
            .get_mut(self.arena)
            .value
            .text_mut()
            .unwrap()
            .truncate(closer_num_chars);

        // Everything between the pair was already scanned; none of it can
        // match anything anymore.
        let mut delim = self.delimiters[closer].prev;
        while let Some(d) = delim {
            if d == opener {
                break;
            }
            self.remove_delimiter(d);
            delim = self.delimiters[d].prev;
        }

        let value = if opener_char == b'~' {
            NodeValue::Strikethrough
        } else if use_delims == 1 {
            NodeValue::Emph
        } else {
            NodeValue::Strong
        };
        let emph = self.make_inline_at(
            value,
            Span::new(
                opener_span.start + opener_num_chars,
                closer_span.end - closer_num_chars,
            ),
        );

        let mut tmp = opener_inl.next_sibling(self.arena);
        while let Some(t) = tmp {
            if t == closer_inl {
                break;
            }
            tmp = t.next_sibling(self.arena);
            emph.append(self.arena, t);
        }
        opener_inl.insert_after(self.arena, emph);

        if opener_num_chars == 0 {
            opener_inl.detach(self.arena);
            self.remove_delimiter(opener);
        } else {
            opener_inl.get_mut(self.arena).span.end -= use_delims;
        }

        if closer_num_chars == 0 {
            closer_inl.detach(self.arena);
            self.remove_delimiter(closer);
            self.delimiters[closer].next
        } else {
            closer_inl.get_mut(self.arena).span.start += use_delims;
            Some(closer)
        }
    }

    #[inline]
    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    fn peek_char(&self) -> Option<u8> {
        self.peek_char_n(0)
    }

    #[inline]
    fn peek_char_n(&self, n: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + n).copied()
    }

    fn find_special_char(&self) -> usize {
        let bytes = self.input.as_bytes();
        for n in self.pos..bytes.len() {
            if self.special_chars[bytes[n] as usize] {
                return n;
            }
        }
        bytes.len()
    }

    /// Maps an end-exclusive content offset to an end-exclusive source
    /// offset.
    fn source_end(&self, offset: usize) -> usize {
        if offset == 0 {
            self.map.source(0)
        } else {
            self.map.source(offset - 1) + 1
        }
    }

    fn make_inline(&mut self, value: NodeValue, start: usize, end: usize) -> AstNode {
        debug_assert!(start < end);
        let span = Span::new(self.map.source(start), self.source_end(end));
        self.make_inline_at(value, span)
    }

    fn make_inline_at(&mut self, value: NodeValue, span: Span) -> AstNode {
        let mut ast = Ast::new(value, span.start);
        ast.span = span;
        ast.open = false;
        AstNode::create(self.arena, ast)
    }

    fn handle_newline(&mut self) -> AstNode {
        let bytes = self.input.as_bytes();
        let nlpos = self.pos;
        if bytes[self.pos] == b'\r' {
            self.pos += 1;
        }
        if self.pos < bytes.len() && bytes[self.pos] == b'\n' {
            self.pos += 1;
        }
        let inl = if nlpos > 1 && bytes[nlpos - 1] == b' ' && bytes[nlpos - 2] == b' ' {
            self.make_inline(NodeValue::LineBreak, nlpos - 2, self.pos)
        } else {
            self.make_inline(NodeValue::SoftBreak, nlpos, self.pos)
        };
        self.skip_spaces();
        inl
    }

    fn take_while(&mut self, c: u8) -> usize {
        let start_pos = self.pos;
        while self.peek_char() == Some(c) {
            self.pos += 1;
        }
        self.pos - start_pos
    }

    fn take_while_with_limit(&mut self, c: u8, limit: usize) -> usize {
        let start_pos = self.pos;
        while self.pos - start_pos < limit && self.peek_char() == Some(c) {
            self.pos += 1;
        }
        self.pos - start_pos
    }

    fn skip_spaces(&mut self) -> bool {
        let mut skipped = false;
        while self.peek_char().map_or(false, |c| c == b' ' || c == b'\t') {
            self.pos += 1;
            skipped = true;
        }
        skipped
    }

    fn skip_line_end(&mut self) -> bool {
        let old_pos = self.pos;
        if self.peek_char() == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek_char() == Some(b'\n') {
            self.pos += 1;
        }
        self.pos > old_pos || self.eof()
    }

    fn scan_to_closing_backtick(&mut self, openticklength: usize) -> Option<usize> {
        if openticklength > MAXBACKTICKS {
            return None;
        }

        // The memo records where the last run of each length was seen; a
        // cursor past it means no closer exists.
        if self.scanned_for_backticks && self.backticks[openticklength] <= self.pos {
            return None;
        }

        loop {
            while self.peek_char().map_or(false, |c| c != b'`') {
                self.pos += 1;
            }
            if self.eof() {
                self.scanned_for_backticks = true;
                return None;
            }
            let numticks = self.take_while(b'`');
            if numticks <= MAXBACKTICKS {
                self.backticks[numticks] = self.pos - numticks;
            }
            if numticks == openticklength {
                return Some(self.pos);
            }
        }
    }

    fn handle_backticks(&mut self) -> AstNode {
        let startpos = self.pos;
        let openticks = self.take_while(b'`');

        match self.scan_to_closing_backtick(openticks) {
            None => {
                self.pos = startpos + openticks;
                self.make_inline(NodeValue::Text("`".repeat(openticks)), startpos, self.pos)
            }
            Some(endpos) => {
                let buf = &self.input[startpos + openticks..endpos - openticks];
                let code = NodeCode {
                    num_backticks: openticks,
                    literal: strings::normalize_code(buf),
                };
                self.make_inline(NodeValue::Code(code), startpos, endpos)
            }
        }
    }

    fn scan_to_closing_dollar(&mut self, opendollarlength: usize) -> Option<usize> {
        if opendollarlength > MAX_MATH_DOLLARS {
            return None;
        }

        let bytes = self.input.as_bytes();

        // No space after the opening dollar of inline math.
        if opendollarlength == 1 && self.peek_char().map_or(false, isspace) {
            return None;
        }

        loop {
            while self.peek_char().map_or(false, |c| c != b'$') {
                self.pos += 1;
            }

            if self.eof() {
                return None;
            }

            let c = bytes[self.pos - 1];

            // No space before the closing dollar either.
            if opendollarlength == 1 && isspace(c) {
                return None;
            }

            // A backslashed dollar stays inside the math.
            if opendollarlength == 1 && c == b'\\' {
                self.pos += 1;
                continue;
            }

            let numdollars = self.take_while_with_limit(b'$', opendollarlength);

            // A digit after the closing dollar reads as a price, not math.
            if opendollarlength == 1 && self.peek_char().map_or(false, isdigit) {
                return None;
            }

            if numdollars == opendollarlength {
                return Some(self.pos);
            }
        }
    }

    fn handle_dollars(&mut self) -> AstNode {
        let startpos = self.pos;
        let opendollars = self.take_while(b'$');

        let endpos = self
            .scan_to_closing_dollar(opendollars)
            .filter(|endpos| endpos - startpos >= opendollars * 2 + 1);

        match endpos {
            Some(endpos) => {
                let buf = &self.input[startpos + opendollars..endpos - opendollars];
                let literal = if opendollars == 1 {
                    strings::normalize_code(buf)
                } else {
                    buf.to_string()
                };
                let math = NodeMath {
                    display: opendollars == 2,
                    literal,
                };
                self.make_inline(NodeValue::Math(math), startpos, endpos)
            }
            None => {
                self.pos = startpos + opendollars;
                self.make_inline(NodeValue::Text("$".repeat(opendollars)), startpos, self.pos)
            }
        }
    }

    fn handle_delim(&mut self, c: u8) -> AstNode {
        let (numdelims, can_open, can_close) = self.scan_delims(c);

        let contents = self.input[self.pos - numdelims..self.pos].to_string();
        let inl = self.make_inline(NodeValue::Text(contents), self.pos - numdelims, self.pos);

        if can_open || can_close {
            self.push_delimiter(c, can_open, can_close, inl);
        }

        inl
    }

    /// The character before `pos`, skipping over characters that never
    /// affect flanking (the tildes of a strikethrough run). Start of input
    /// counts as a newline.
    fn get_before_char(&self, pos: usize) -> char {
        if pos == 0 {
            return '\n';
        }
        let bytes = self.input.as_bytes();
        let mut before_pos = pos - 1;
        while before_pos > 0
            && (bytes[before_pos] >> 6 == 2 || self.skip_chars[bytes[before_pos] as usize])
        {
            before_pos -= 1;
        }
        match self.input[before_pos..pos].chars().next() {
            Some(c) if (c as usize) >= 256 || !self.skip_chars[c as usize] => c,
            _ => '\n',
        }
    }

    fn scan_delims(&mut self, c: u8) -> (usize, bool, bool) {
        let before_char = self.get_before_char(self.pos);

        let mut numdelims = 0;
        while self.peek_char() == Some(c) {
            numdelims += 1;
            self.pos += 1;
        }

        let after_char = if self.eof() {
            '\n'
        } else {
            let bytes = self.input.as_bytes();
            let mut after_pos = self.pos;
            while after_pos < bytes.len() - 1 && self.skip_chars[bytes[after_pos] as usize] {
                after_pos += 1;
            }
            match self.input[after_pos..].chars().next() {
                Some(x) if (x as usize) >= 256 || !self.skip_chars[x as usize] => x,
                _ => '\n',
            }
        };

        let left_flanking = numdelims > 0
            && !after_char.is_whitespace()
            && !(is_punctuation_char(after_char)
                && !before_char.is_whitespace()
                && !is_punctuation_char(before_char));
        let right_flanking = numdelims > 0
            && !before_char.is_whitespace()
            && !(is_punctuation_char(before_char)
                && !after_char.is_whitespace()
                && !is_punctuation_char(after_char));

        if c == b'_' {
            (
                numdelims,
                left_flanking && (!right_flanking || is_punctuation_char(before_char)),
                right_flanking && (!left_flanking || is_punctuation_char(after_char)),
            )
        } else {
            (numdelims, left_flanking, right_flanking)
        }
    }

    fn push_delimiter(&mut self, c: u8, can_open: bool, can_close: bool, inl: AstNode) {
        let ix = self.delimiters.len();
        let length = inl.get(self.arena).value.text().map_or(0, |t| t.len());
        self.delimiters.push(Delimiter {
            inl,
            position: self.pos,
            length,
            delim_char: c,
            can_open,
            can_close,
            prev: self.last_delimiter,
            next: None,
        });
        if let Some(prev) = self.last_delimiter {
            self.delimiters[prev].next = Some(ix);
        }
        self.last_delimiter = Some(ix);
    }

    fn handle_backslash(&mut self) -> AstNode {
        let startpos = self.pos;
        self.pos += 1;

        if self.peek_char().map_or(false, ispunct) {
            self.pos += 1;
            self.make_inline(
                NodeValue::Text(self.input[self.pos - 1..self.pos].to_string()),
                self.pos - 2,
                self.pos,
            )
        } else if !self.eof() && self.skip_line_end() {
            let inl = self.make_inline(NodeValue::LineBreak, startpos, self.pos);
            self.skip_spaces();
            inl
        } else {
            self.make_inline(NodeValue::Text("\\".to_string()), self.pos - 1, self.pos)
        }
    }

    fn handle_entity(&mut self) -> AstNode {
        self.pos += 1;

        match entity::unescape(&self.input[self.pos..]) {
            None => self.make_inline(NodeValue::Text("&".to_string()), self.pos - 1, self.pos),
            Some((text, len)) => {
                self.pos += len;
                self.make_inline(NodeValue::Text(text), self.pos - 1 - len, self.pos)
            }
        }
    }

    fn handle_shortcode(&mut self) -> Option<AstNode> {
        let matchlen = scanners::shortcode(self.input[self.pos + 1..].as_bytes())?;
        let code = &self.input[self.pos + 1..self.pos + matchlen];
        let emoji = emojis::get_by_shortcode(code)?;

        self.pos += 1 + matchlen;
        Some(self.make_inline(
            NodeValue::ShortCode(NodeShortCode {
                code: code.to_string(),
                emoji: emoji.as_str().to_string(),
            }),
            self.pos - 1 - matchlen,
            self.pos,
        ))
    }

    fn handle_pointy_brace(&mut self) -> AstNode {
        self.pos += 1;
        let bytes = self.input.as_bytes();

        if let Some(matchlen) = scanners::autolink_uri(&bytes[self.pos..]) {
            self.pos += matchlen;
            return self.make_autolink(self.pos - matchlen, self.pos - 1, false);
        }

        if let Some(matchlen) = scanners::autolink_email(&bytes[self.pos..]) {
            self.pos += matchlen;
            return self.make_autolink(self.pos - matchlen, self.pos - 1, true);
        }

        let mut matchlen: Option<usize> = None;

        if self.pos + 2 <= bytes.len() {
            let c = bytes[self.pos];
            if c == b'!' && !self.flags.skip_html_comment {
                let c = bytes[self.pos + 1];
                if c == b'-' && self.peek_char_n(2) == Some(b'-') {
                    if self.peek_char_n(3) == Some(b'>') {
                        matchlen = Some(4);
                    } else if self.peek_char_n(3) == Some(b'-') && self.peek_char_n(4) == Some(b'>')
                    {
                        matchlen = Some(5);
                    } else if let Some(m) = scanners::html_comment(&bytes[self.pos + 1..]) {
                        matchlen = Some(m + 1);
                    } else {
                        self.flags.skip_html_comment = true;
                    }
                } else if c == b'[' {
                    if !self.flags.skip_html_cdata && self.pos + 3 <= bytes.len() {
                        if let Some(m) = scanners::html_cdata(&bytes[self.pos + 2..]) {
                            // The scanner stops short of the closing "]]>";
                            // it must follow, or no CDATA section closes
                            // anywhere in the remaining input.
                            if self.pos + m + 5 > bytes.len() {
                                self.flags.skip_html_cdata = true;
                            } else {
                                matchlen = Some(m + 5);
                            }
                        }
                    }
                } else if !self.flags.skip_html_declaration {
                    if let Some(m) = scanners::html_declaration(&bytes[self.pos + 1..]) {
                        if self.pos + m + 2 > bytes.len() {
                            self.flags.skip_html_declaration = true;
                        } else {
                            matchlen = Some(m + 2);
                        }
                    }
                }
            } else if c == b'?' {
                if !self.flags.skip_html_pi {
                    // An empty instruction body is fine.
                    let m =
                        scanners::html_processing_instruction(&bytes[self.pos + 1..]).unwrap_or(0);
                    if self.pos + m + 3 > bytes.len() {
                        self.flags.skip_html_pi = true;
                    } else {
                        matchlen = Some(m + 3);
                    }
                }
            } else {
                matchlen = scanners::html_tag(&bytes[self.pos..]);
            }
        }

        if let Some(matchlen) = matchlen {
            let contents = self.input[self.pos - 1..self.pos + matchlen].to_string();
            self.pos += matchlen;
            return self.make_inline(
                NodeValue::HtmlInline(contents),
                self.pos - matchlen - 1,
                self.pos,
            );
        }

        self.make_inline(NodeValue::Text("<".to_string()), self.pos - 1, self.pos)
    }

    fn push_bracket(&mut self, image: bool, inl_text: AstNode) {
        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
        }
        self.brackets.push(Bracket {
            inl_text,
            position: self.pos,
            image,
            active: true,
            bracket_after: false,
        });
    }

    fn handle_close_bracket(&mut self) -> Option<AstNode> {
        self.pos += 1;
        let initial_pos = self.pos;

        let brackets_len = self.brackets.len();
        if brackets_len == 0 {
            return Some(self.make_inline(
                NodeValue::Text("]".to_string()),
                self.pos - 1,
                self.pos,
            ));
        }

        let is_image = self.brackets[brackets_len - 1].image;

        if !is_image && !self.brackets[brackets_len - 1].active {
            self.brackets.pop();
            return Some(self.make_inline(
                NodeValue::Text("]".to_string()),
                self.pos - 1,
                self.pos,
            ));
        }

        let after_link_text_pos = self.pos;
        let bytes = self.input.as_bytes();

        // An inline destination in parentheses?
        if self.peek_char() == Some(b'(') {
            let sps = scanners::spacechars(&bytes[self.pos + 1..]).unwrap_or(0);
            let offset = self.pos + 1 + sps;
            if let Some((url, n)) = manual_scan_link_url(&self.input[offset..]) {
                let starturl = offset;
                let endurl = starturl + n;
                let starttitle = endurl + scanners::spacechars(&bytes[endurl..]).unwrap_or(0);
                let endtitle = if starttitle == endurl {
                    starttitle
                } else {
                    starttitle + scanners::link_title(&bytes[starttitle..]).unwrap_or(0)
                };
                let endall = endtitle + scanners::spacechars(&bytes[endtitle..]).unwrap_or(0);

                if endall < bytes.len() && bytes[endall] == b')' {
                    self.pos = endall + 1;

                    let mut attributes = None;
                    if self.options.attributes {
                        if let Some((attrs, consumed)) =
                            parse_attribute_block(&self.input[self.pos..])
                        {
                            attributes = Some(attrs);
                            self.pos += consumed;
                        }
                    }

                    let url = strings::clean_url(url);
                    let title = strings::clean_title(&self.input[starttitle..endtitle]);
                    self.close_bracket_match(is_image, url, title, attributes);
                    return None;
                }
                self.pos = after_link_text_pos;
            }
        }

        // A reference label, then?
        let (mut lab, mut found_label) = match self.link_label() {
            Some(lab) => (lab.to_string(), true),
            None => (String::new(), false),
        };

        if !found_label {
            self.pos = initial_pos;
        }

        // Shortcut references use the bracketed text itself as the label.
        if (!found_label || lab.is_empty()) && !self.brackets[brackets_len - 1].bracket_after {
            lab = self.input[self.brackets[brackets_len - 1].position..initial_pos - 1].to_string();
            found_label = true;
        }

        let lab = strings::normalize_label(&lab);
        let reff = if found_label {
            self.refmap.get(&lab).cloned()
        } else {
            None
        };

        if let Some(reff) = reff {
            self.close_bracket_match(is_image, reff.url, reff.title, reff.attributes);
            return None;
        }

        let bracket_inl_text = self.brackets[brackets_len - 1].inl_text;

        if self.options.footnotes
            && bracket_inl_text.next_sibling(self.arena).map_or(false, |n| {
                n.get(self.arena)
                    .value
                    .text()
                    .map_or(false, |t| t.starts_with('^'))
            })
        {
            self.pos = initial_pos;

            // The name may have been split across several nodes by other
            // special characters; pull it back together.
            let mut text = String::new();
            let mut sibling = bracket_inl_text.next_sibling(self.arena);
            while let Some(n) = sibling {
                match n.get(self.arena).value {
                    NodeValue::Text(ref literal) | NodeValue::HtmlInline(ref literal) => {
                        text.push_str(literal)
                    }
                    _ => (),
                }
                sibling = n.next_sibling(self.arena);
            }

            if text.len() > 1 {
                let start = bracket_inl_text.get(self.arena).span.start;
                let end = self.source_end(self.pos);
                let inl = self.make_inline_at(
                    NodeValue::FootnoteReference(NodeFootnoteReference {
                        name: text[1..].to_string(),
                        ref_num: 0,
                        ix: 0,
                    }),
                    Span::new(start, end),
                );
                bracket_inl_text.insert_before(self.arena, inl);

                let mut sibling = Some(bracket_inl_text);
                while let Some(n) = sibling {
                    sibling = n.next_sibling(self.arena);
                    if matches!(
                        n.get(self.arena).value,
                        NodeValue::Text(_) | NodeValue::HtmlInline(_)
                    ) {
                        n.detach(self.arena);
                    }
                }

                // Footnote names take no emphasis.
                self.remove_delimiters(self.brackets[brackets_len - 1].position);

                self.brackets.pop();
                return None;
            }
        }

        self.brackets.pop();
        self.pos = initial_pos;
        Some(self.make_inline(NodeValue::Text("]".to_string()), self.pos - 1, self.pos))
    }

    fn close_bracket_match(
        &mut self,
        is_image: bool,
        url: String,
        title: String,
        attributes: Option<NodeAttributes>,
    ) {
        let bracket = match self.brackets.pop() {
            Some(bracket) => bracket,
            None => return,
        };

        let nl = NodeLink {
            url,
            title,
            attributes,
        };
        let start = bracket.inl_text.get(self.arena).span.start;
        let end = self.source_end(self.pos);
        let inl = self.make_inline_at(
            if is_image {
                NodeValue::Image(nl)
            } else {
                NodeValue::Link(nl)
            },
            Span::new(start, end),
        );

        bracket.inl_text.insert_before(self.arena, inl);
        let mut tmpch = bracket.inl_text.next_sibling(self.arena);
        while let Some(tmp) = tmpch {
            tmpch = tmp.next_sibling(self.arena);
            inl.append(self.arena, tmp);
        }
        bracket.inl_text.detach(self.arena);

        self.process_emphasis(bracket.position);

        // Links cannot nest: any link bracket still open is now dead.
        if !is_image {
            for b in &mut self.brackets {
                if !b.image {
                    b.active = false;
                }
            }
        }
    }

    fn link_label(&mut self) -> Option<&'i str> {
        let input = self.input;
        let startpos = self.pos;

        if self.peek_char() != Some(b'[') {
            return None;
        }

        self.pos += 1;

        let mut length = 0;
        loop {
            let c = match self.peek_char() {
                Some(c) if c != b'[' && c != b']' => c,
                _ => break,
            };
            if c == b'\\' {
                self.pos += 1;
                length += 1;
                if self.peek_char().map_or(false, ispunct) {
                    self.pos += 1;
                    length += 1;
                }
            } else {
                self.pos += 1;
                length += 1;
            }
            if length > MAX_LINK_LABEL_LENGTH {
                self.pos = startpos;
                return None;
            }
        }

        if self.peek_char() == Some(b']') {
            let raw_label = strings::trim_slice(&input[startpos + 1..self.pos]);
            self.pos += 1;
            Some(raw_label)
        } else {
            self.pos = startpos;
            None
        }
    }

    fn make_autolink(&mut self, url_start: usize, url_end: usize, email: bool) -> AstNode {
        let url = &self.input[url_start..url_end];
        let inl = self.make_inline(
            NodeValue::Link(NodeLink {
                url: strings::clean_autolink(url, email),
                title: String::new(),
                attributes: None,
            }),
            url_start - 1,
            url_end + 1,
        );
        let text = self.make_inline(
            NodeValue::Text(entity::unescape_html(url)),
            url_start,
            url_end,
        );
        inl.append(self.arena, text);
        inl
    }
}

fn is_punctuation_char(c: char) -> bool {
    c.is_punctuation() || c.is_symbol()
}

/// Scans a link destination: either the `<...>` form or a bare URL with
/// balanced parentheses. Returns the destination and the bytes consumed.
pub fn manual_scan_link_url(input: &str) -> Option<(&str, usize)> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    if i < len && bytes[i] == b'<' {
        i += 1;
        while i < len {
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'\\' => i += 2,
                b'\n' | b'<' => return None,
                _ => i += 1,
            }
        }
    } else {
        return manual_scan_link_url_2(input);
    }

    if i >= len {
        None
    } else {
        Some((&input[1..i - 1], i))
    }
}

fn manual_scan_link_url_2(input: &str) -> Option<(&str, usize)> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    let mut nb_p = 0;

    while i < len {
        if bytes[i] == b'\\' && i + 1 < len && ispunct(bytes[i + 1]) {
            i += 2;
        } else if bytes[i] == b'(' {
            nb_p += 1;
            i += 1;
            if nb_p > 32 {
                return None;
            }
        } else if bytes[i] == b')' {
            if nb_p == 0 {
                break;
            }
            nb_p -= 1;
            i += 1;
        } else if isspace(bytes[i]) || bytes[i].is_ascii_control() {
            if i == 0 {
                return None;
            }
            break;
        } else {
            i += 1;
        }
    }

    if i >= len || nb_p != 0 {
        None
    } else {
        Some((&input[..i], i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str, options: &ParseOptions) -> (Arena, AstNode) {
        let mut arena = Arena::new();
        let root = AstNode::create(&mut arena, Ast::new(NodeValue::Paragraph, 0));
        let map = PositionMap::new();
        let refmap = FxHashMap::default();
        {
            let mut subject = Subject::new(&mut arena, options, input, &map, &refmap);
            while subject.parse_inline(root) {}
            subject.finish();
        }
        (arena, root)
    }

    fn kinds(arena: &Arena, node: AstNode) -> Vec<String> {
        node.children(arena)
            .map(|n| match n.get(arena).value {
                NodeValue::Text(ref t) => format!("text:{}", t),
                NodeValue::Emph => "emph".to_string(),
                NodeValue::Strong => "strong".to_string(),
                NodeValue::Strikethrough => "strike".to_string(),
                NodeValue::Code(ref c) => format!("code:{}", c.literal),
                NodeValue::Link(ref l) => format!("link:{}", l.url),
                NodeValue::Math(ref m) => format!("math:{}", m.literal),
                ref other => format!("{:?}", other),
            })
            .collect()
    }

    #[test]
    fn emphasis_pairs_up() {
        let options = ParseOptions::default();
        let (arena, root) = parse("*a* plus **b**", &options);
        assert_eq!(kinds(&arena, root), vec!["emph", "text: plus ", "strong"]);
    }

    #[test]
    fn emphasis_spans_cover_delimiters() {
        let options = ParseOptions::default();
        let (arena, root) = parse("x *ab* y", &options);
        let emph = root
            .children(&arena)
            .find(|n| matches!(n.get(&arena).value, NodeValue::Emph))
            .unwrap();
        assert_eq!(emph.get(&arena).span, Span::new(2, 6));
    }

    #[test]
    fn mismatched_tilde_runs_stay_text() {
        let options = ParseOptions {
            strikethrough: true,
            ..ParseOptions::default()
        };
        let (arena, root) = parse("~~a~ and ~~b~~", &options);
        let kinds = kinds(&arena, root);
        assert!(kinds.contains(&"strike".to_string()));
        assert!(kinds.iter().any(|k| k.starts_with("text:~~a~")));
    }

    #[test]
    fn code_span_trumps_emphasis() {
        let options = ParseOptions::default();
        let (arena, root) = parse("*`a*`", &options);
        assert_eq!(kinds(&arena, root), vec!["text:*", "code:a*"]);
    }

    #[test]
    fn inline_link_with_title() {
        let options = ParseOptions::default();
        let (arena, root) = parse("[text](/url \"hi\")", &options);
        let link = root.first_child(&arena).unwrap();
        match link.get(&arena).value {
            NodeValue::Link(ref nl) => {
                assert_eq!(nl.url, "/url");
                assert_eq!(nl.title, "hi");
            }
            ref other => panic!("expected link, got {:?}", other),
        }
        assert_eq!(
            link.first_child(&arena)
                .unwrap()
                .get(&arena)
                .value
                .text()
                .map(|t| t.as_str()),
            Some("text")
        );
    }

    #[test]
    fn links_do_not_nest() {
        let options = ParseOptions::default();
        let (arena, root) = parse("[a [b](/inner) c](/outer)", &options);
        let links: Vec<String> = kinds(&arena, root)
            .into_iter()
            .filter(|k| k.starts_with("link:"))
            .collect();
        assert_eq!(links, vec!["link:/inner"]);
    }

    #[test]
    fn uri_autolink() {
        let options = ParseOptions::default();
        let (arena, root) = parse("<https://example.com/>", &options);
        assert_eq!(kinds(&arena, root), vec!["link:https://example.com/"]);
    }

    #[test]
    fn math_dollars() {
        let options = ParseOptions {
            math: true,
            ..ParseOptions::default()
        };
        let (arena, root) = parse("$x + y$ and $5 or $6", &options);
        let kinds = kinds(&arena, root);
        assert_eq!(kinds[0], "math:x + y");
        assert!(kinds[1..].iter().all(|k| k.starts_with("text:")));
    }

    #[test]
    fn scans_angle_and_bare_urls() {
        assert_eq!(manual_scan_link_url("<foo bar>rest"), Some(("foo bar", 9)));
        assert_eq!(manual_scan_link_url("/url extra"), Some(("/url", 4)));
        assert_eq!(
            manual_scan_link_url("/a(b(c))d) tail"),
            Some(("/a(b(c))d", 9))
        );
        assert_eq!(manual_scan_link_url(" leading"), None);
        assert_eq!(manual_scan_link_url("<unclosed"), None);
    }
}
