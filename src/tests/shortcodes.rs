use crate::tests::{html, html_opts};

#[test]
fn known_shortcode() {
    html_opts!([emoji], "Hello :smile:!\n", "<p>Hello 😄!</p>\n");
}

#[test]
fn unknown_shortcode_stays_literal() {
    html_opts!([emoji], ":not_a_real_code_xyz:\n", "<p>:not_a_real_code_xyz:</p>\n");
}

#[test]
fn bare_colons_stay_literal() {
    html_opts!([emoji], "a : b :: c\n", "<p>a : b :: c</p>\n");
}

#[test]
fn in_image_alt_text() {
    html_opts!(
        [emoji],
        "![:smile:](/i.png)\n",
        "<p><img src=\"/i.png\" alt=\"😄\" /></p>\n",
    );
}

#[test]
fn off_by_default() {
    html(":smile:\n", "<p>:smile:</p>\n");
}
