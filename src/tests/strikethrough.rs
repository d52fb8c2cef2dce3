use crate::tests::{html, html_opts};

#[test]
fn double_tilde() {
    html_opts!(
        [strikethrough],
        "This is ~~crossed out~~.\n",
        "<p>This is <del>crossed out</del>.</p>\n",
    );
}

#[test]
fn single_tilde() {
    html_opts!([strikethrough], "~x~\n", "<p><del>x</del></p>\n");
}

#[test]
fn mismatched_runs_stay_literal() {
    html_opts!(
        [strikethrough],
        "~~a~ and ~~b~~\n",
        "<p>~~a~ and <del>b</del></p>\n",
    );
}

#[test]
fn mismatch_does_not_stop_later_delimiters() {
    html_opts!(
        [strikethrough],
        "~~a~ *em* ~~b~~\n",
        "<p>~~a~ <em>em</em> <del>b</del></p>\n",
    );
}

#[test]
fn combines_with_emphasis() {
    html_opts!(
        [strikethrough],
        "*~~x~~*\n",
        "<p><em><del>x</del></em></p>\n",
    );
}

#[test]
fn off_by_default() {
    html("~~x~~\n", "<p>~~x~~</p>\n");
}
