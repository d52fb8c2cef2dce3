use crate::tests::{html, html_opts};

#[test]
fn www_autolink() {
    html_opts!(
        [autolink],
        "Visit www.example.com for info.\n",
        "<p>Visit <a href=\"http://www.example.com\">www.example.com</a> for info.</p>\n",
    );
}

#[test]
fn url_autolink() {
    html_opts!(
        [autolink],
        "see https://example.com/x today\n",
        "<p>see <a href=\"https://example.com/x\">https://example.com/x</a> today</p>\n",
    );
}

#[test]
fn email_autolink() {
    html_opts!(
        [autolink],
        "ping a.b@example.com!\n",
        "<p>ping <a href=\"mailto:a.b@example.com\">a.b@example.com</a>!</p>\n",
    );
}

#[test]
fn trailing_punctuation_excluded() {
    html_opts!(
        [autolink],
        "(at www.example.com).\n",
        "<p>(at <a href=\"http://www.example.com\">www.example.com</a>).</p>\n",
    );
}

#[test]
fn not_inside_explicit_links() {
    html_opts!(
        [autolink],
        "[www.example.com](/x)\n",
        "<p><a href=\"/x\">www.example.com</a></p>\n",
    );
}

#[test]
fn not_inside_code_spans() {
    html_opts!(
        [autolink],
        "`www.example.com`\n",
        "<p><code>www.example.com</code></p>\n",
    );
}

#[test]
fn off_by_default() {
    html("www.example.com\n", "<p>www.example.com</p>\n");
}
