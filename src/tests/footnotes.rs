use crate::tests::{html, html_opts};

#[test]
fn single_footnote() {
    html_opts!(
        [footnotes],
        "Here.[^note]\n\n[^note]: Something.\n",
        concat!(
            "<p>Here.<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1\">1</a></sup></p>\n",
            "<section class=\"footnotes\" data-footnotes>\n",
            "<ol>\n",
            "<li id=\"fn-1\">\n",
            "<p>Something. <a href=\"#fnref-1\" class=\"footnote-backref\">\u{21a9}</a></p>\n",
            "</li>\n",
            "</ol>\n",
            "</section>\n"
        ),
    );
}

#[test]
fn numbered_by_first_use() {
    html_opts!(
        [footnotes],
        "B[^b] A[^a]\n\n[^a]: aaa\n\n[^b]: bbb\n",
        concat!(
            "<p>B<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1\">1</a></sup> ",
            "A<sup class=\"footnote-ref\"><a href=\"#fn-2\" id=\"fnref-2\">2</a></sup></p>\n",
            "<section class=\"footnotes\" data-footnotes>\n",
            "<ol>\n",
            "<li id=\"fn-1\">\n",
            "<p>bbb <a href=\"#fnref-1\" class=\"footnote-backref\">\u{21a9}</a></p>\n",
            "</li>\n",
            "<li id=\"fn-2\">\n",
            "<p>aaa <a href=\"#fnref-2\" class=\"footnote-backref\">\u{21a9}</a></p>\n",
            "</li>\n",
            "</ol>\n",
            "</section>\n"
        ),
    );
}

#[test]
fn repeated_reference_gets_both_backrefs() {
    html_opts!(
        [footnotes],
        "A[^n] B[^n]\n\n[^n]: x\n",
        concat!(
            "<p>A<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1\">1</a></sup> ",
            "B<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1-2\">1</a></sup></p>\n",
            "<section class=\"footnotes\" data-footnotes>\n",
            "<ol>\n",
            "<li id=\"fn-1\">\n",
            "<p>x <a href=\"#fnref-1\" class=\"footnote-backref\">\u{21a9}</a>",
            " <a href=\"#fnref-1-2\" class=\"footnote-backref\">\u{21a9}",
            "<sup class=\"footnote-ref\">2</sup></a></p>\n",
            "</li>\n",
            "</ol>\n",
            "</section>\n"
        ),
    );
}

#[test]
fn multi_paragraph_definition() {
    html_opts!(
        [footnotes],
        "r[^a]\n\n[^a]: one\n\n    two\n",
        concat!(
            "<p>r<sup class=\"footnote-ref\"><a href=\"#fn-1\" id=\"fnref-1\">1</a></sup></p>\n",
            "<section class=\"footnotes\" data-footnotes>\n",
            "<ol>\n",
            "<li id=\"fn-1\">\n",
            "<p>one</p>\n",
            "<p>two <a href=\"#fnref-1\" class=\"footnote-backref\">\u{21a9}</a></p>\n",
            "</li>\n",
            "</ol>\n",
            "</section>\n"
        ),
    );
}

#[test]
fn unused_definition_is_dropped() {
    html_opts!([footnotes], "text\n\n[^unused]: gone\n", "<p>text</p>\n");
}

#[test]
fn undefined_reference_stays_literal() {
    html_opts!([footnotes], "x[^nope]\n", "<p>x[^nope]</p>\n");
}

#[test]
fn off_by_default() {
    html("x[^nope]\n", "<p>x[^nope]</p>\n");
}
