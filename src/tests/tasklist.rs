use crate::tests::{html, html_opts};

#[test]
fn checked_and_unchecked() {
    html_opts!(
        [tasklist],
        "- [x] done\n- [ ] todo\n",
        concat!(
            "<ul>\n",
            "<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> done</li>\n",
            "<li><input type=\"checkbox\" disabled=\"\" /> todo</li>\n",
            "</ul>\n"
        ),
    );
}

#[test]
fn uppercase_x() {
    html_opts!(
        [tasklist],
        "- [X] shout\n",
        "<ul>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> shout</li>\n</ul>\n",
    );
}

#[test]
fn ordered_items_work_too() {
    html_opts!(
        [tasklist],
        "1. [x] first\n",
        "<ol>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> first</li>\n</ol>\n",
    );
}

#[test]
fn needs_a_list_item() {
    html_opts!([tasklist], "[x] nope\n", "<p>[x] nope</p>\n");
}

#[test]
fn off_by_default() {
    html("- [x] n\n", "<ul>\n<li>[x] n</li>\n</ul>\n");
}
