use crate::tests::{html, html_opts};

#[test]
fn inline_math() {
    html_opts!(
        [math],
        "Euler: $a+b$ done\n",
        "<p>Euler: <span data-math-style=\"inline\">a+b</span> done</p>\n",
    );
}

#[test]
fn inline_display_math() {
    html_opts!(
        [math],
        "$$x$$\n",
        "<p><span data-math-style=\"display\">x</span></p>\n",
    );
}

#[test]
fn math_block() {
    html_opts!(
        [math],
        "$$\nx = y\n$$\n",
        "<div data-math-style=\"display\">x = y\n</div>\n",
    );
}

#[test]
fn contents_are_html_escaped() {
    html_opts!(
        [math],
        "$a < b$\n",
        "<p><span data-math-style=\"inline\">a &lt; b</span></p>\n",
    );
}

#[test]
fn prices_are_not_math() {
    html_opts!([math], "$5 or $6\n", "<p>$5 or $6</p>\n");
}

#[test]
fn off_by_default() {
    html("$a+b$\n", "<p>$a+b$</p>\n");
    html("$$\nx\n$$\n", "<p>$$\nx\n$$</p>\n");
}
