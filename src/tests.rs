mod attributes;
mod autolink;
mod containers;
mod core;
mod footnotes;
mod header_ids;
mod lists;
mod math;
mod pathological;
mod shortcodes;
mod spans;
mod strikethrough;
mod table;
mod tasklist;

use pretty_assertions::assert_eq;

use crate::{markdown_to_html, ParseOptions};

#[track_caller]
fn compare_strs(output: &str, expected: &str, kind: &str, input: &str) {
    if output != expected {
        println!("Running {} test", kind);
        println!("Given:");
        println!("==============================");
        println!("{}", input);
        println!("==============================");
        println!();
        println!("Got:");
        println!("==============================");
        println!("{}", output);
        println!("==============================");
        println!();
    }
    assert_eq!(output, expected);
}

#[track_caller]
pub(crate) fn html(input: &str, expected: &str) {
    html_opts_i(input, expected, |_| ());
}

#[track_caller]
pub(crate) fn html_opts_i<F>(input: &str, expected: &str, opts: F)
where
    F: Fn(&mut ParseOptions),
{
    let mut options = ParseOptions::default();
    opts(&mut options);

    let output = markdown_to_html(input, &options);
    compare_strs(&output, expected, "html", input);
}

/// Renders `input` with the named [`ParseOptions`] toggles set and compares
/// against the expected HTML.
macro_rules! html_opts {
    ([$($opt:ident),*], $lhs:expr, $rhs:expr $(,)?) => {
        crate::tests::html_opts_i($lhs, $rhs, |opts| {
            $(opts.$opt = true;)*
        })
    };
}

pub(crate) use html_opts;
