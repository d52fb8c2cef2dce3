use crate::tests::{html, html_opts, html_opts_i};

#[test]
fn auto_identifiers() {
    html_opts!(
        [auto_identifiers],
        "# My Title\n",
        "<h1 id=\"my-title\">My Title</h1>\n",
    );
}

#[test]
fn duplicates_get_suffixes() {
    html_opts!(
        [auto_identifiers],
        "# A\n\n# A\n",
        "<h1 id=\"a\">A</h1>\n<h1 id=\"a-1\">A</h1>\n",
    );
}

#[test]
fn punctuation_is_dropped() {
    html_opts!(
        [auto_identifiers],
        "## Ticks & Tricks\n",
        "<h2 id=\"ticks--tricks\">Ticks &amp; Tricks</h2>\n",
    );
}

#[test]
fn explicit_id_wins() {
    html_opts!(
        [auto_identifiers, attributes],
        "# My Title {#mine}\n",
        "<h1 id=\"mine\">My Title</h1>\n",
    );
}

#[test]
fn heading_references() {
    html_opts!(
        [heading_references],
        "# My Title\n\n[My Title]\n",
        "<h1>My Title</h1>\n<p><a href=\"#my-title\">My Title</a></p>\n",
    );
}

#[test]
fn explicit_definition_beats_heading() {
    html_opts!(
        [heading_references],
        "# Docs\n\n[Docs]\n\n[Docs]: /elsewhere\n",
        "<h1>Docs</h1>\n<p><a href=\"/elsewhere\">Docs</a></p>\n",
    );
}

#[test]
fn reference_honors_prefix() {
    html_opts_i(
        "# A B\n\n[A B]\n",
        "<h1 id=\"user-a-b\">A B</h1>\n<p><a href=\"#user-a-b\">A B</a></p>\n",
        |opts| {
            opts.auto_identifiers = true;
            opts.heading_references = true;
            opts.attribute_prefix = Some("user-".to_string());
        },
    );
}

#[test]
fn off_by_default() {
    html("# My Title\n", "<h1>My Title</h1>\n");
}
