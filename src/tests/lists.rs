use crate::tests::{html, html_opts};

#[test]
fn lower_alpha() {
    html_opts!(
        [extra_list_styles],
        "a. Apple\nb. Banana\n",
        "<ol type=\"a\">\n<li>Apple</li>\n<li>Banana</li>\n</ol>\n",
    );
}

#[test]
fn upper_alpha() {
    html_opts!(
        [extra_list_styles],
        "A. First\nB. Second\n",
        "<ol type=\"A\">\n<li>First</li>\n<li>Second</li>\n</ol>\n",
    );
}

#[test]
fn alpha_start() {
    html_opts!(
        [extra_list_styles],
        "c. Carrot\n",
        "<ol start=\"3\" type=\"a\">\n<li>Carrot</li>\n</ol>\n",
    );
}

#[test]
fn lower_roman() {
    html_opts!(
        [extra_list_styles],
        "i. one\nii. two\n",
        "<ol type=\"i\">\n<li>one</li>\n<li>two</li>\n</ol>\n",
    );
}

#[test]
fn upper_roman_start() {
    html_opts!(
        [extra_list_styles],
        "IV. fourth\nV. fifth\n",
        "<ol start=\"4\" type=\"I\">\n<li>fourth</li>\n<li>fifth</li>\n</ol>\n",
    );
}

#[test]
fn lone_i_downgrades_to_alpha() {
    html_opts!(
        [extra_list_styles],
        "i. x\nj. y\n",
        "<ol start=\"9\" type=\"a\">\n<li>x</li>\n<li>y</li>\n</ol>\n",
    );
}

#[test]
fn roman_continues_alpha_list() {
    html_opts!(
        [extra_list_styles],
        "h. x\ni. y\n",
        "<ol start=\"8\" type=\"a\">\n<li>x</li>\n<li>y</li>\n</ol>\n",
    );
}

#[test]
fn lower_greek() {
    html_opts!(
        [extra_list_styles],
        "α. alpha\nβ. beta\n",
        concat!(
            "<ol style=\"list-style-type: lower-greek\">\n",
            "<li>alpha</li>\n",
            "<li>beta</li>\n",
            "</ol>\n"
        ),
    );
}

#[test]
fn style_change_starts_a_new_list() {
    html_opts!(
        [extra_list_styles],
        "a. letter\n1. number\n",
        "<ol type=\"a\">\n<li>letter</li>\n</ol>\n<ol>\n<li>number</li>\n</ol>\n",
    );
}

#[test]
fn paren_delimiter() {
    html_opts!(
        [extra_list_styles],
        "a) x\nb) y\n",
        "<ol type=\"a\">\n<li>x</li>\n<li>y</li>\n</ol>\n",
    );
}

#[test]
fn off_by_default() {
    html("a. Apple\n", "<p>a. Apple</p>\n");
}
