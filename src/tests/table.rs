use crate::tests::{html, html_opts};

#[test]
fn basic_table() {
    html_opts!(
        [table],
        "| a | b |\n|---|---|\n| 1 | 2 |\n",
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "<th>b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>1</td>\n",
            "<td>2</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn alignments() {
    html_opts!(
        [table],
        "| l | c | r |\n|:--|:-:|--:|\n| 1 | 2 | 3 |\n",
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th align=\"left\">l</th>\n",
            "<th align=\"center\">c</th>\n",
            "<th align=\"right\">r</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td align=\"left\">1</td>\n",
            "<td align=\"center\">2</td>\n",
            "<td align=\"right\">3</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn short_row_is_padded() {
    html_opts!(
        [table],
        "| a | b |\n|---|---|\n| 1 |\n",
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "<th>b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>1</td>\n",
            "<td></td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn long_row_is_truncated() {
    html_opts!(
        [table],
        "| a | b |\n|---|---|\n| 1 | 2 | 3 |\n",
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "<th>b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "<tbody>\n",
            "<tr>\n",
            "<td>1</td>\n",
            "<td>2</td>\n",
            "</tr>\n",
            "</tbody>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn header_only_table_has_no_tbody() {
    html_opts!(
        [table],
        "| a |\n|---|\n",
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a</th>\n",
            "</tr>\n",
            "</thead>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn column_mismatch_is_not_a_table() {
    html_opts!(
        [table],
        "| a |\n|---|---|\n",
        "<p>| a |\n|---|---|</p>\n",
    );
}

#[test]
fn cells_hold_inlines() {
    html_opts!(
        [table],
        "| *x* |\n|---|\n",
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th><em>x</em></th>\n",
            "</tr>\n",
            "</thead>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn escaped_pipes_stay_in_cells() {
    html_opts!(
        [table],
        "| a\\|b |\n|---|\n",
        concat!(
            "<table>\n",
            "<thead>\n",
            "<tr>\n",
            "<th>a|b</th>\n",
            "</tr>\n",
            "</thead>\n",
            "</table>\n"
        ),
    );
}

#[test]
fn off_by_default() {
    html("| a |\n|---|\n", "<p>| a |\n|---|</p>\n");
}
