//! Table recognition.
//!
//! A table begins when a delimiter row (`| --- | :-: |`) follows a
//! one-line paragraph with the same number of cells. The paragraph node
//! becomes the table and its content becomes the header row; every
//! further non-blank line the table matches is parsed into a body row.
//! Rows keep the cells they were written with; the renderer pads or
//! truncates body rows to the header width.

use crate::nodes::{Ast, AstNode, NodeTable, NodeValue, Span, TableAlignment};
use crate::position::PositionMap;
use crate::scanners;
use crate::strings;

use super::tokenizer::Line;
use super::Parser;

/// A cell as written, with its byte range in the parsed text. The range
/// covers the trimmed content.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RowCell {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

pub(crate) fn try_opening_block(
    parser: &mut Parser,
    container: AstNode,
    line: &mut Line,
) -> Option<AstNode> {
    match container.get(parser.arena).value {
        NodeValue::Paragraph => try_opening_header(parser, container, line),
        NodeValue::Table(..) => try_opening_row(parser, container, line),
        _ => None,
    }
}

/// Matches a delimiter row against the open paragraph.
fn try_opening_header(
    parser: &mut Parser,
    paragraph: AstNode,
    line: &mut Line,
) -> Option<AstNode> {
    scanners::table_start(line.from_first_nonspace().as_bytes())?;

    let (content, map, span) = {
        let ast = paragraph.get(parser.arena);
        // Only a one-line paragraph can become a header.
        if ast.content.find('\n') != Some(ast.content.len() - 1) {
            return None;
        }
        (ast.content.clone(), ast.position_map.clone(), ast.span)
    };

    let header = row(&content)?;
    let marker = row(line.from_first_nonspace())?;
    if header.len() != marker.len() {
        return None;
    }

    let alignments: Vec<TableAlignment> = marker
        .iter()
        .map(|cell| {
            let left = cell.text.starts_with(':');
            let right = cell.text.ends_with(':');
            match (left, right) {
                (true, true) => TableAlignment::Center,
                (true, false) => TableAlignment::Left,
                (false, true) => TableAlignment::Right,
                (false, false) => TableAlignment::None,
            }
        })
        .collect();

    let num_columns = header.len();
    {
        let ast = paragraph.get_mut(parser.arena);
        ast.value = NodeValue::Table(NodeTable {
            alignments,
            num_columns,
        });
        ast.content.clear();
        ast.position_map = PositionMap::default();
    }
    let table = paragraph;

    append_row(parser, table, true, &header, |off| map.source(off), span);

    // The delimiter line is consumed whole.
    let end = line.len_without_ending();
    line.advance_offset(end - line.offset, false);
    let end_abs = line.source_offset(end);
    let ast = table.get_mut(parser.arena);
    if end_abs > ast.span.end {
        ast.span.end = end_abs;
    }

    Some(table)
}

fn try_opening_row(parser: &mut Parser, table: AstNode, line: &mut Line) -> Option<AstNode> {
    if line.blank {
        return None;
    }
    let cells = row(line.from_first_nonspace())?;

    let base = line.first_nonspace;
    let start_abs = line.source_offset(base);
    let end = line.len_without_ending();
    let end_abs = line.source_offset(end);

    append_row(
        parser,
        table,
        false,
        &cells,
        |off| line.source_offset(base + off),
        Span::new(start_abs, end_abs),
    );

    line.advance_offset(end - line.offset, false);
    let ast = table.get_mut(parser.arena);
    if end_abs > ast.span.end {
        ast.span.end = end_abs;
    }

    Some(table)
}

/// Appends a finished row node. Cells carry their text as unparsed inline
/// content, anchored at their source position.
fn append_row<F>(
    parser: &mut Parser,
    table: AstNode,
    header: bool,
    cells: &[RowCell],
    source: F,
    span: Span,
) where
    F: Fn(usize) -> usize,
{
    let mut row_ast = Ast::new(NodeValue::TableRow(header), span.start);
    row_ast.span = span;
    row_ast.open = false;
    let row_node = AstNode::create(parser.arena, row_ast);
    table.append(parser.arena, row_node);

    for cell in cells {
        let start = source(cell.start);
        let end = std::cmp::max(source(cell.end), start);
        let mut ast = Ast::new(NodeValue::TableCell, start);
        ast.span = Span::new(start, end);
        ast.content = cell.text.clone();
        ast.position_map.push_anchor(0, start);
        ast.open = false;
        let cell_node = AstNode::create(parser.arena, ast);
        row_node.append(parser.arena, cell_node);
    }
}

/// Splits one line into cells. Returns `None` unless the whole line
/// parses as a row with at least one cell and at least one unescaped
/// pipe.
pub(crate) fn row(input: &str) -> Option<Vec<RowCell>> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut cells = vec![];
    let mut offset = 0;
    let mut saw_pipe = false;

    if len > 0 && bytes[0] == b'|' {
        offset += 1;
        saw_pipe = true;
    }

    loop {
        let cell_matched = scanners::table_cell(&bytes[offset..]).unwrap_or(0);
        let mut pipe_matched = scanners::table_cell_end(&bytes[offset + cell_matched..]).unwrap_or(0);
        if pipe_matched > 0 {
            saw_pipe = true;
        }

        if cell_matched > 0 || pipe_matched > 0 {
            let raw = &input[offset..offset + cell_matched];
            let trimmed = strings::trim_slice(raw);
            let lead = raw.len() - raw.trim_start_matches(|c| c == ' ' || c == '\t').len();
            cells.push(RowCell {
                text: unescape_pipes(trimmed),
                start: offset + lead,
                end: offset + lead + trimmed.len(),
            });
        }

        offset += cell_matched + pipe_matched;

        if pipe_matched == 0 {
            pipe_matched = scanners::table_row_end(&bytes[offset..]).unwrap_or(0);
            offset += pipe_matched;
        }

        if !(offset != len && pipe_matched > 0) {
            break;
        }
    }

    if offset != len || cells.is_empty() || !saw_pipe {
        None
    } else {
        Some(cells)
    }
}

/// `\|` unescapes inside cells; any other escape is left for the inline
/// parser.
fn unescape_pipes(cell: &str) -> String {
    let bytes = cell.as_bytes();
    let mut out = String::with_capacity(cell.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'|') {
            out.push('|');
            i += 2;
        } else {
            let ch_len = next_char_len(bytes[i]);
            out.push_str(&cell[i..i + ch_len]);
            i += ch_len;
        }
    }
    out
}

fn next_char_len(first: u8) -> usize {
    match first {
        b if b < 0x80 => 1,
        b if b >= 0xf0 => 4,
        b if b >= 0xe0 => 3,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_cells() {
        let cells = row("| a | b |\n").unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].text, "a");
        assert_eq!(&"| a | b |\n"[cells[1].start..cells[1].end], "b");
    }

    #[test]
    fn unclosed_is_not_a_row() {
        assert!(row("not a table").is_none());
        assert!(row("not a table\n").is_none());
    }

    #[test]
    fn escaped_pipe_alone_is_not_a_row() {
        assert!(row("a \\| b\n").is_none());
    }

    #[test]
    fn escaped_pipe_stays_in_cell() {
        let cells = row("| a \\| b |\n").unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].text, "a | b");
    }

    #[test]
    fn leading_pipe_optional() {
        let cells = row("a | b\n").unwrap();
        assert_eq!(cells.len(), 2);
    }
}
