use crate::tests::{html, html_opts};

#[test]
fn paragraphs() {
    html("hello\n\nworld\n", "<p>hello</p>\n<p>world</p>\n");
}

#[test]
fn emphasis() {
    html(
        "*a* **b** ***c***\n",
        "<p><em>a</em> <strong>b</strong> <em><strong>c</strong></em></p>\n",
    );
}

#[test]
fn intraword_underscores_do_not_emphasize() {
    html("mother_in_law\n", "<p>mother_in_law</p>\n");
}

#[test]
fn soft_break() {
    html("foo\nbar\n", "<p>foo\nbar</p>\n");
}

#[test]
fn hard_break_trailing_spaces() {
    html("foo  \nbar\n", "<p>foo<br />\nbar</p>\n");
}

#[test]
fn hard_break_backslash() {
    html("foo\\\nbar\n", "<p>foo<br />\nbar</p>\n");
}

#[test]
fn backslash_escapes() {
    html("\\*not emphasis\\*\n", "<p>*not emphasis*</p>\n");
}

#[test]
fn entities() {
    html("&amp; &copy; &#35;\n", "<p>&amp; © #</p>\n");
}

#[test]
fn code_span_protects_contents() {
    html("`a *b* c`\n", "<p><code>a *b* c</code></p>\n");
}

#[test]
fn atx_heading() {
    html("## Hi\n", "<h2>Hi</h2>\n");
}

#[test]
fn setext_heading() {
    html("Title\n=====\n", "<h1>Title</h1>\n");
}

#[test]
fn thematic_break() {
    html("---\n", "<hr />\n");
}

#[test]
fn block_quote() {
    html("> quoted\n", "<blockquote>\n<p>quoted</p>\n</blockquote>\n");
}

#[test]
fn fenced_code_block() {
    html(
        "```rust\nfn main() {}\n```\n",
        "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n",
    );
}

#[test]
fn indented_code_block() {
    html("    code\n", "<pre><code>code\n</code></pre>\n");
}

#[test]
fn tight_list() {
    html("- a\n- b\n", "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n");
}

#[test]
fn loose_list() {
    html(
        "- a\n\n- b\n",
        concat!(
            "<ul>\n",
            "<li>\n<p>a</p>\n</li>\n",
            "<li>\n<p>b</p>\n</li>\n",
            "</ul>\n"
        ),
    );
}

#[test]
fn ordered_list() {
    html("1. one\n2. two\n", "<ol>\n<li>one</li>\n<li>two</li>\n</ol>\n");
}

#[test]
fn ordered_list_start() {
    html("5. x\n", "<ol start=\"5\">\n<li>x</li>\n</ol>\n");
}

#[test]
fn nested_lists() {
    html(
        "- a\n  - b\n",
        "<ul>\n<li>a\n<ul>\n<li>b</li>\n</ul>\n</li>\n</ul>\n",
    );
}

#[test]
fn inline_link() {
    html(
        "[text](/url \"title\")\n",
        "<p><a href=\"/url\" title=\"title\">text</a></p>\n",
    );
}

#[test]
fn reference_link() {
    html(
        "[foo]\n\n[foo]: /url\n",
        "<p><a href=\"/url\">foo</a></p>\n",
    );
}

#[test]
fn image() {
    html(
        "![alt *text*](/img.png)\n",
        "<p><img src=\"/img.png\" alt=\"alt text\" /></p>\n",
    );
}

#[test]
fn angle_autolink() {
    html(
        "<https://example.com>\n",
        "<p><a href=\"https://example.com\">https://example.com</a></p>\n",
    );
}

#[test]
fn email_angle_autolink() {
    html(
        "<user@example.com>\n",
        "<p><a href=\"mailto:user@example.com\">user@example.com</a></p>\n",
    );
}

#[test]
fn dangerous_url_href_is_dropped() {
    html("[x](javascript:alert(1))\n", "<p><a href=\"\">x</a></p>\n");
    html_opts!(
        [unsafe_html],
        "[x](javascript:alert(1))\n",
        "<p><a href=\"javascript:alert(1)\">x</a></p>\n",
    );
}

#[test]
fn inline_html_is_omitted_by_default() {
    html(
        "a <b>c</b>\n",
        "<p>a <!-- raw HTML omitted -->c<!-- raw HTML omitted --></p>\n",
    );
    html_opts!([unsafe_html], "a <b>c</b>\n", "<p>a <b>c</b></p>\n");
}

#[test]
fn html_block_is_omitted_by_default() {
    html("<div>\nx\n</div>\n", "<!-- raw HTML omitted -->\n");
    html_opts!([unsafe_html], "<div>\nx\n</div>\n", "<div>\nx\n</div>\n");
}

#[test]
fn link_cannot_contain_link() {
    html(
        "[a [b](/inner) c](/outer)\n",
        "<p>[a <a href=\"/inner\">b</a> c](/outer)</p>\n",
    );
}

#[test]
fn setext_needs_paragraph() {
    html("---\n===\n", "<hr />\n<p>===</p>\n");
}

#[test]
fn multibyte_line_starts() {
    html("été\n", "<p>été</p>\n");
    html("- α\n", "<ul>\n<li>α</li>\n</ul>\n");
}

#[test]
fn lazy_continuation() {
    html(
        "> a\nb\n",
        "<blockquote>\n<p>a\nb</p>\n</blockquote>\n",
    );
}
