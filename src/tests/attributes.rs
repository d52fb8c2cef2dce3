use crate::tests::{html, html_opts, html_opts_i};

#[test]
fn heading_attributes() {
    html_opts!(
        [attributes],
        "# Title {#custom .big}\n",
        "<h1 id=\"custom\" class=\"big\">Title</h1>\n",
    );
}

#[test]
fn heading_properties() {
    html_opts!(
        [attributes],
        "# T {#a data-x=\"v\"}\n",
        "<h1 id=\"a\" data-x=\"v\">T</h1>\n",
    );
}

#[test]
fn link_attributes() {
    html_opts!(
        [attributes],
        "[x](/y){.btn}\n",
        "<p><a href=\"/y\" class=\"btn\">x</a></p>\n",
    );
}

#[test]
fn image_attributes() {
    html_opts!(
        [attributes],
        "![a](/i.png){#pic}\n",
        "<p><img src=\"/i.png\" alt=\"a\" id=\"pic\" /></p>\n",
    );
}

#[test]
fn code_fence_attributes() {
    html_opts!(
        [attributes],
        "```rust {#ex}\nfn f() {}\n```\n",
        "<pre><code id=\"ex\" class=\"language-rust\">fn f() {}\n</code></pre>\n",
    );
}

#[test]
fn id_prefix() {
    html_opts_i("# T {#x}\n", "<h1 id=\"user-x\">T</h1>\n", |opts| {
        opts.attributes = true;
        opts.attribute_prefix = Some("user-".to_string());
    });
}

#[test]
fn malformed_block_is_literal() {
    html_opts!([attributes], "# T {#}\n", "<h1>T {#}</h1>\n");
}

#[test]
fn off_by_default() {
    html("# T {#x}\n", "<h1>T {#x}</h1>\n");
}
