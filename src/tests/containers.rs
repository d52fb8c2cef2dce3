use crate::tests::{html, html_opts};

#[test]
fn named_container() {
    html_opts!(
        [custom_containers],
        "::: warning\nMind the gap.\n:::\n",
        "<div class=\"warning\">\n<p>Mind the gap.</p>\n</div>\n",
    );
}

#[test]
fn contains_blocks() {
    html_opts!(
        [custom_containers],
        "::: aside\n# Heading\n\n- a\n- b\n:::\n",
        concat!(
            "<div class=\"aside\">\n",
            "<h1>Heading</h1>\n",
            "<ul>\n",
            "<li>a</li>\n",
            "<li>b</li>\n",
            "</ul>\n",
            "</div>\n"
        ),
    );
}

#[test]
fn blank_separated_list_inside_is_loose() {
    html_opts!(
        [custom_containers],
        "::: x\n- a\n\n- b\n:::\n",
        concat!(
            "<div class=\"x\">\n",
            "<ul>\n",
            "<li>\n<p>a</p>\n</li>\n",
            "<li>\n<p>b</p>\n</li>\n",
            "</ul>\n",
            "</div>\n"
        ),
    );
}

#[test]
fn nests_with_longer_fences() {
    html_opts!(
        [custom_containers],
        ":::: outer\n::: inner\nx\n:::\n::::\n",
        concat!(
            "<div class=\"outer\">\n",
            "<div class=\"inner\">\n",
            "<p>x</p>\n",
            "</div>\n",
            "</div>\n"
        ),
    );
}

#[test]
fn unclosed_container_runs_to_end() {
    html_opts!(
        [custom_containers],
        "::: note\nstill inside\n",
        "<div class=\"note\">\n<p>still inside</p>\n</div>\n",
    );
}

#[test]
fn with_attributes() {
    html_opts!(
        [custom_containers, attributes],
        "::: note {#n .x}\nText.\n:::\n",
        "<div id=\"n\" class=\"note x\">\n<p>Text.</p>\n</div>\n",
    );
}

#[test]
fn off_by_default() {
    html("::: warning\nx\n:::\n", "<p>::: warning\nx\n:::</p>\n");
}
