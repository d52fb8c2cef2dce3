use crate::nodes::{NodeValue, Span};
use crate::position::LineColumn;
use crate::{parse_document, ParseOptions};

#[test]
fn block_spans() {
    let doc = parse_document("# Hi\n\npara\n", &ParseOptions::default());
    let arena = doc.arena();

    let spans: Vec<Span> = doc
        .root()
        .children(arena)
        .map(|n| n.get(arena).span)
        .collect();
    assert_eq!(spans, vec![Span::new(0, 4), Span::new(6, 10)]);
}

#[test]
fn document_span_covers_input() {
    let input = "a\n\nb\n";
    let doc = parse_document(input, &ParseOptions::default());
    assert_eq!(doc.root().get(doc.arena()).span, Span::new(0, input.len()));
}

#[test]
fn inline_spans() {
    let doc = parse_document("x *ab* y\n", &ParseOptions::default());
    let arena = doc.arena();

    let paragraph = doc.root().first_child(arena).unwrap();
    let spans: Vec<(bool, Span)> = paragraph
        .children(arena)
        .map(|n| {
            let ast = n.get(arena);
            (matches!(ast.value, NodeValue::Emph), ast.span)
        })
        .collect();
    assert_eq!(
        spans,
        vec![
            (false, Span::new(0, 2)),
            (true, Span::new(2, 6)),
            (false, Span::new(6, 8)),
        ]
    );
}

#[test]
fn fenced_code_span_includes_fences() {
    let doc = parse_document("```\nab\n```\n", &ParseOptions::default());
    let arena = doc.arena();
    let code = doc.root().first_child(arena).unwrap();
    assert!(matches!(code.get(arena).value, NodeValue::CodeBlock(..)));
    assert_eq!(code.get(arena).span, Span::new(0, 10));
}

#[test]
fn container_spans_cover_children() {
    let doc = parse_document("> a\n> b\n", &ParseOptions::default());
    let arena = doc.arena();

    let quote = doc.root().first_child(arena).unwrap();
    let paragraph = quote.first_child(arena).unwrap();

    assert_eq!(quote.get(arena).span, Span::new(0, 7));
    assert_eq!(paragraph.get(arena).span, Span::new(2, 7));
    assert!(quote.get(arena).span.contains(&paragraph.get(arena).span));
}

#[test]
fn locator_translates_offsets() {
    let mut options = ParseOptions::default();
    options.locator = true;

    let doc = parse_document("ab\ncd\n", &options);
    assert_eq!(doc.locate(0), Some(LineColumn { line: 1, column: 1 }));
    assert_eq!(doc.locate(4), Some(LineColumn { line: 2, column: 2 }));
}

#[test]
fn locator_is_opt_in() {
    let doc = parse_document("ab\n", &ParseOptions::default());
    assert_eq!(doc.locate(0), None);
}
