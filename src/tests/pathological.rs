use ntest::timeout;

use crate::tests::html;

#[test]
#[timeout(4000)]
fn emphasis_mismatches() {
    let input = "*a_ ".repeat(50_000);
    html(
        &input,
        &format!("<p>{}</p>\n", input.trim_end()),
    );
}

#[test]
#[timeout(4000)]
fn unclosed_backticks() {
    let input = "`a".repeat(20_000);
    html(&input, &format!("<p>{}</p>\n", input));
}

#[test]
#[timeout(4000)]
fn unclosed_links() {
    let input = "[".repeat(20_000);
    html(&input, &format!("<p>{}</p>\n", input));
}

#[test]
#[timeout(4000)]
fn nested_strong_emph() {
    let n = 1_000;
    let input = format!(
        "{}baz{}",
        "*a **a ".repeat(n),
        " a** a*".repeat(n)
    );
    let expected = format!(
        "<p>{}baz{}</p>\n",
        "<em>a <strong>a ".repeat(n),
        " a</strong> a</em>".repeat(n)
    );
    html(&input, &expected);
}

#[test]
#[timeout(4000)]
fn many_link_closers_with_no_openers() {
    let input = "]".repeat(20_000);
    html(&input, &format!("<p>{}</p>\n", input));
}
