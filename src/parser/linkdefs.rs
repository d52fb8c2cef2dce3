//! The incremental link-reference-definition parser.
//!
//! Runs over a closing paragraph's accumulated content and strips leading
//! `[label]: destination "title"` definitions. It is an explicit state
//! machine: each [`advance`](LinkReferenceParser::advance) call makes one
//! state transition and reports whether the current attempt needs more
//! input, completed a definition, or failed. A failed attempt rolls back
//! to the end of the last completed definition; the remainder stays
//! paragraph text.

use crate::nodes::NodeAttributes;
use crate::parser::attributes::parse_attribute_block;
use crate::parser::inlines::manual_scan_link_url;
use crate::scanners;
use crate::strings;

const MAX_LINK_LABEL_LENGTH: usize = 1000;

/// The result of one state transition.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The attempt is viable but incomplete.
    Continue,

    /// A whole definition, including its line ending, has been consumed.
    DefinitionCompleted,

    /// The current attempt cannot be a definition.
    Failed,
}

#[derive(Debug)]
enum State {
    StartDefinition,
    Label,
    Destination,
    TitleOrEnd,
}

/// A definition stripped from the front of a paragraph.
#[derive(Debug)]
pub struct CompletedDefinition {
    /// The normalized label.
    pub label: String,
    pub url: String,
    pub title: String,
    pub attributes: Option<NodeAttributes>,

    /// The byte range of the definition within the paragraph content.
    pub range: (usize, usize),
}

pub struct LinkReferenceParser<'c> {
    content: &'c str,
    allow_attributes: bool,
    state: State,
    pos: usize,
    attempt_start: usize,
    label: String,
    url: String,
}

impl<'c> LinkReferenceParser<'c> {
    /// `content` must be newline-terminated paragraph content with
    /// container prefixes already stripped.
    pub fn new(content: &'c str, allow_attributes: bool) -> Self {
        LinkReferenceParser {
            content,
            allow_attributes,
            state: State::StartDefinition,
            pos: 0,
            attempt_start: 0,
            label: String::new(),
            url: String::new(),
        }
    }

    /// Consumes as many definitions as possible. Returns the number of
    /// content bytes claimed and the definitions, in order.
    pub fn run(mut self) -> (usize, Vec<CompletedDefinition>) {
        let mut definitions = vec![];
        let mut consumed = 0;

        loop {
            match self.advance(&mut definitions) {
                Outcome::Continue => (),
                Outcome::DefinitionCompleted => {
                    consumed = self.pos;
                    self.state = State::StartDefinition;
                }
                Outcome::Failed => break,
            }
        }

        (consumed, definitions)
    }

    fn advance(&mut self, definitions: &mut Vec<CompletedDefinition>) -> Outcome {
        match self.state {
            State::StartDefinition => {
                if self.content[self.pos..].starts_with('[') {
                    self.attempt_start = self.pos;
                    self.state = State::Label;
                    Outcome::Continue
                } else {
                    Outcome::Failed
                }
            }

            State::Label => match self.scan_label() {
                Some((label, consumed)) => {
                    let normalized = strings::normalize_label(&label);
                    if normalized.is_empty() {
                        return Outcome::Failed;
                    }
                    self.pos += consumed;
                    if self.content[self.pos..].starts_with(':') {
                        self.pos += 1;
                        self.label = normalized;
                        self.state = State::Destination;
                        Outcome::Continue
                    } else {
                        Outcome::Failed
                    }
                }
                None => Outcome::Failed,
            },

            State::Destination => {
                self.spnl();
                match manual_scan_link_url(&self.content[self.pos..]) {
                    Some((url, consumed)) if !url.is_empty() => {
                        self.url = strings::clean_url(url);
                        self.pos += consumed;
                        self.state = State::TitleOrEnd;
                        Outcome::Continue
                    }
                    _ => Outcome::Failed,
                }
            }

            State::TitleOrEnd => {
                let before_title = self.pos;
                self.spnl();

                let mut title = String::new();
                if self.pos < self.content.len() {
                    if let Some(len) = scanners::link_title(self.content[self.pos..].as_bytes()) {
                        title = strings::clean_title(&self.content[self.pos..self.pos + len]);
                        self.pos += len;
                    } else {
                        self.pos = before_title;
                    }
                }

                let mut attributes = None;
                if self.allow_attributes {
                    attributes = self.try_attributes();
                }

                if !self.skip_to_line_end() {
                    if title.is_empty() && attributes.is_none() {
                        return Outcome::Failed;
                    }
                    // The title (or attribute block) was not alone at the
                    // end of its line; a definition without it may still
                    // close cleanly on the destination line.
                    title.clear();
                    attributes = None;
                    self.pos = before_title;
                    if !self.skip_to_line_end() {
                        return Outcome::Failed;
                    }
                }

                definitions.push(CompletedDefinition {
                    label: std::mem::take(&mut self.label),
                    url: std::mem::take(&mut self.url),
                    title,
                    attributes,
                    range: (self.attempt_start, self.pos),
                });
                Outcome::DefinitionCompleted
            }
        }
    }

    /// Scans `[label]` at the current position. Returns the inner label
    /// and the bytes consumed, brackets included.
    fn scan_label(&self) -> Option<(String, usize)> {
        let bytes = self.content[self.pos..].as_bytes();
        debug_assert_eq!(bytes[0], b'[');

        let mut i = 1;
        let limit = std::cmp::min(bytes.len(), MAX_LINK_LABEL_LENGTH + 2);
        while i < limit {
            match bytes[i] {
                b']' => {
                    let label = self.content[self.pos + 1..self.pos + i].to_string();
                    return Some((label, i + 1));
                }
                b'[' => return None,
                b'\\' => {
                    i += 1;
                    if i < limit && crate::ctype::ispunct(bytes[i]) {
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }
        None
    }

    /// Skips spaces and tabs plus at most one line ending.
    fn spnl(&mut self) {
        let bytes = self.content.as_bytes();
        let mut seen_newline = false;
        while self.pos < bytes.len() {
            let c = bytes[self.pos];
            if strings::is_space_or_tab(c) {
                self.pos += 1;
            } else if c == b'\n' && !seen_newline {
                seen_newline = true;
                self.pos += 1;
            } else if c == b'\r' && !seen_newline && bytes.get(self.pos + 1) == Some(&b'\n') {
                seen_newline = true;
                self.pos += 2;
            } else {
                break;
            }
        }
    }

    fn try_attributes(&mut self) -> Option<NodeAttributes> {
        let saved = self.pos;
        while self
            .content
            .as_bytes()
            .get(self.pos)
            .map_or(false, |&b| strings::is_space_or_tab(b))
        {
            self.pos += 1;
        }
        match parse_attribute_block(&self.content[self.pos..]) {
            Some((attributes, consumed)) => {
                self.pos += consumed;
                Some(attributes)
            }
            None => {
                self.pos = saved;
                None
            }
        }
    }

    /// Skips trailing spaces; if a line ending follows, consumes it and
    /// reports success.
    fn skip_to_line_end(&mut self) -> bool {
        let bytes = self.content.as_bytes();
        let mut i = self.pos;
        while i < bytes.len() && strings::is_space_or_tab(bytes[i]) {
            i += 1;
        }
        match bytes.get(i) {
            Some(&b'\n') => {
                self.pos = i + 1;
                true
            }
            Some(&b'\r') => {
                self.pos = i + 1;
                if bytes.get(self.pos) == Some(&b'\n') {
                    self.pos += 1;
                }
                true
            }
            None => {
                self.pos = i;
                true
            }
            _ => false,
        }
    }
}
