//! A CommonMark-compatible Markdown parser with extensions.
//!
//! Parsing is total: every input produces a [`Document`], with malformed
//! constructs degrading to literal text. Every node carries the byte
//! [`Span`](nodes::Span) of source it was parsed from, and an optional
//! line/column locator translates offsets for diagnostics.
//!
//! ```
//! use inkmark::{markdown_to_html, ParseOptions};
//!
//! let options = ParseOptions::default();
//! assert_eq!(
//!     markdown_to_html("Hello, **world**.", &options),
//!     "<p>Hello, <strong>world</strong>.</p>\n"
//! );
//! ```
//!
//! Extensions (tables, strikethrough, footnotes, math, task lists, emoji
//! shortcodes, attribute blocks, custom containers, bare autolinks, extra
//! ordered-list styles) are individual [`ParseOptions`] toggles, all off by
//! default.
//!
//! For the tree itself, use [`parse_document`] and walk from
//! [`Document::root`]:
//!
//! ```
//! use inkmark::{parse_document, nodes::NodeValue, ParseOptions};
//!
//! let doc = parse_document("*hi*", &ParseOptions::default());
//! let paragraph = doc.root().first_child(doc.arena()).unwrap();
//! assert!(matches!(
//!     paragraph.get(doc.arena()).value,
//!     NodeValue::Paragraph
//! ));
//! ```

mod character_set;
mod ctype;
mod entity;
pub mod html;
pub mod nodes;
mod parser;
pub mod position;
mod scanners;
mod strings;

#[cfg(test)]
mod tests;

pub use html::Anchorizer;
pub use nodes::{AstNode, Document};
pub use parser::{parse_document, ParseOptions};

/// Parses `source` and renders it to HTML in one step.
pub fn markdown_to_html(source: &str, options: &ParseOptions) -> String {
    let doc = parse_document(source, options);
    html::format_document(&doc, options)
}
