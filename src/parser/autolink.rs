//! Bare autolinks.
//!
//! A postprocessing pass over finished text nodes that recognizes URLs,
//! `www.` domains and email addresses written without angle brackets. A
//! match splits the text node in three: the text before, a link node, and
//! the text after, which is scanned again for further matches.

use lazy_static::lazy_static;
use unicode_categories::UnicodeCategories;

use crate::ctype::{isalnum, isalpha, isspace};
use crate::nodes::{Arena, Ast, AstNode, NodeLink, NodeValue, Span};

/// A recognized bare link: how far it reaches back before the trigger
/// character, how far past it, and the resolved destination.
struct BareLink {
    rewind: usize,
    link_end: usize,
    url: String,
}

pub(crate) fn process_autolinks(arena: &mut Arena, node: AstNode) {
    let mut cur = Some(node);
    while let Some(n) = cur {
        cur = process_one(arena, n);
    }
}

/// Handles the first match in one text node; returns the split-off
/// remainder, if any.
fn process_one(arena: &mut Arena, node: AstNode) -> Option<AstNode> {
    let (contents, span) = {
        let ast = node.get(arena);
        match ast.value {
            NodeValue::Text(ref t) => (t.clone(), ast.span),
            _ => return None,
        }
    };
    let len = contents.len();

    let mut i = 0;
    let mut matched = None;
    while i < len {
        matched = match contents.as_bytes()[i] {
            b':' => url_match(&contents, i),
            b'w' => www_match(&contents, i),
            b'@' => email_match(&contents, i),
            _ => None,
        };
        if matched.is_some() {
            break;
        }
        i += 1;
    }

    let m = matched?;
    let start = i - m.rewind;
    let end = i + m.link_end;

    // Spans within a text node run linearly: everything that reaches this
    // pass came from a single line.
    let link_span = Span::new(span.start + start, span.start + end);
    let link = make_inline(
        arena,
        NodeValue::Link(NodeLink {
            url: m.url,
            title: String::new(),
            attributes: None,
        }),
        link_span,
    );
    let text = make_inline(
        arena,
        NodeValue::Text(contents[start..end].to_string()),
        link_span,
    );
    link.append(arena, text);
    node.insert_after(arena, link);

    let remainder = if end < len {
        let rest = make_inline(
            arena,
            NodeValue::Text(contents[end..].to_string()),
            Span::new(span.start + end, span.end),
        );
        link.insert_after(arena, rest);
        Some(rest)
    } else {
        None
    };

    if start == 0 {
        node.detach(arena);
    } else {
        let ast = node.get_mut(arena);
        if let Some(t) = ast.value.text_mut() {
            t.truncate(start);
        }
        ast.span.end = span.start + start;
    }

    remainder
}

fn make_inline(arena: &mut Arena, value: NodeValue, span: Span) -> AstNode {
    let mut ast = Ast::new(value, span.start);
    ast.span = span;
    ast.open = false;
    AstNode::create(arena, ast)
}

fn www_match(contents: &str, i: usize) -> Option<BareLink> {
    lazy_static! {
        static ref WWW_DELIMS: [bool; 256] = {
            let mut sc = [false; 256];
            for c in &[b'*', b'_', b'~', b'(', b'['] {
                sc[*c as usize] = true;
            }
            sc
        };
    }

    if i > 0
        && !isspace(contents.as_bytes()[i - 1])
        && !WWW_DELIMS[contents.as_bytes()[i - 1] as usize]
    {
        return None;
    }

    if !contents[i..].starts_with("www.") {
        return None;
    }

    let mut link_end = check_domain(&contents[i..])?;

    while i + link_end < contents.len() && !isspace(contents.as_bytes()[i + link_end]) {
        link_end += 1;
    }

    link_end = autolink_delim(&contents[i..], link_end);

    let mut url = "http://".to_string();
    url += &contents[i..i + link_end];

    Some(BareLink {
        rewind: 0,
        link_end,
        url,
    })
}

/// A domain is runs of host characters joined by dots, with at least one
/// dot and no underscore in the last two labels. Returns the length
/// matched.
fn check_domain(data: &str) -> Option<usize> {
    let mut np = 0;
    let mut uscore1 = 0;
    let mut uscore2 = 0;

    for (i, c) in data.char_indices() {
        if c == '_' {
            uscore2 += 1;
        } else if c == '.' {
            uscore1 = uscore2;
            uscore2 = 0;
            np += 1;
        } else if !is_valid_hostchar(c) && c != '-' {
            if uscore1 == 0 && uscore2 == 0 && np > 0 {
                return Some(i);
            }
            return None;
        }
    }

    if uscore1 == 0 && uscore2 == 0 && np > 0 {
        Some(data.len())
    } else {
        None
    }
}

fn is_valid_hostchar(ch: char) -> bool {
    !ch.is_whitespace() && !ch.is_punctuation()
}

/// Backs the match off trailing punctuation, an unbalanced closing paren,
/// or a trailing entity reference, and cuts it at a `<`.
fn autolink_delim(data: &str, mut link_end: usize) -> usize {
    lazy_static! {
        static ref LINK_END_ASSORTMENT: [bool; 256] = {
            let mut sc = [false; 256];
            for c in &[b'?', b'!', b'.', b',', b':', b'*', b'_', b'~', b'\'', b'"'] {
                sc[*c as usize] = true;
            }
            sc
        };
    }

    for i in 0..link_end {
        if data.as_bytes()[i] == b'<' {
            link_end = i;
            break;
        }
    }

    while link_end > 0 {
        let cclose = data.as_bytes()[link_end - 1];

        let copen = if cclose == b')' { Some(b'(') } else { None };

        if LINK_END_ASSORTMENT[cclose as usize] {
            link_end -= 1;
        } else if cclose == b';' {
            let mut new_end = link_end - 2;

            while new_end > 0 && isalpha(data.as_bytes()[new_end]) {
                new_end -= 1;
            }

            if new_end < link_end - 2 && data.as_bytes()[new_end] == b'&' {
                link_end = new_end;
            } else {
                link_end -= 1;
            }
        } else if let Some(copen) = copen {
            let mut opening = 0;
            let mut closing = 0;
            for i in 0..link_end {
                if data.as_bytes()[i] == copen {
                    opening += 1;
                } else if data.as_bytes()[i] == cclose {
                    closing += 1;
                }
            }

            if closing <= opening {
                break;
            }

            link_end -= 1;
        } else {
            break;
        }
    }

    link_end
}

fn url_match(contents: &str, i: usize) -> Option<BareLink> {
    const SCHEMES: [&str; 3] = ["http", "https", "ftp"];

    let size = contents.len();

    if size - i < 4 || contents.as_bytes()[i + 1] != b'/' || contents.as_bytes()[i + 2] != b'/' {
        return None;
    }

    let mut rewind = 0;
    while rewind < i && isalpha(contents.as_bytes()[i - rewind - 1]) {
        rewind += 1;
    }

    if !SCHEMES
        .iter()
        .any(|s| size - i + rewind >= s.len() && &contents[i - rewind..i] == *s)
    {
        return None;
    }

    let mut link_end = check_domain(&contents[i + 3..])?;

    while link_end < size - i && !isspace(contents.as_bytes()[i + link_end]) {
        link_end += 1;
    }

    link_end = autolink_delim(&contents[i..], link_end);

    let url = contents[i - rewind..i + link_end].to_string();

    Some(BareLink {
        rewind,
        link_end,
        url,
    })
}

fn email_match(contents: &str, i: usize) -> Option<BareLink> {
    lazy_static! {
        static ref EMAIL_OK_SET: [bool; 256] = {
            let mut sc = [false; 256];
            for c in &[b'.', b'+', b'-', b'_'] {
                sc[*c as usize] = true;
            }
            sc
        };
    }

    let size = contents.len();

    let mut rewind = 0;
    let mut ns = 0;

    while rewind < i {
        let c = contents.as_bytes()[i - rewind - 1];

        if isalnum(c) || EMAIL_OK_SET[c as usize] {
            rewind += 1;
            continue;
        }

        if c == b'/' {
            ns += 1;
        }

        break;
    }

    if rewind == 0 || ns > 0 {
        return None;
    }

    let mut link_end = 0;
    let mut nb = 0;
    let mut np = 0;

    while link_end < size - i {
        let c = contents.as_bytes()[i + link_end];

        if isalnum(c) {
            // empty
        } else if c == b'@' {
            nb += 1;
        } else if c == b'.' && link_end < size - i - 1 {
            np += 1;
        } else if c != b'-' && c != b'_' {
            break;
        }

        link_end += 1;
    }

    if link_end < 2
        || nb != 1
        || np == 0
        || (!isalpha(contents.as_bytes()[i + link_end - 1])
            && contents.as_bytes()[i + link_end - 1] != b'.')
    {
        return None;
    }

    link_end = autolink_delim(&contents[i..], link_end);

    let mut url = "mailto:".to_string();
    url += &contents[i - rewind..i + link_end];

    Some(BareLink {
        rewind,
        link_end,
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links_in(input: &str) -> Vec<(String, String)> {
        let mut arena = Arena::new();
        let mut ast = Ast::new(NodeValue::Paragraph, 0);
        ast.span = Span::new(0, input.len());
        let root = AstNode::create(&mut arena, ast);
        let mut text_ast = Ast::new(NodeValue::Text(input.to_string()), 0);
        text_ast.span = Span::new(0, input.len());
        let text = AstNode::create(&mut arena, text_ast);
        root.append(&mut arena, text);

        process_autolinks(&mut arena, text);

        root.children(&arena)
            .filter_map(|n| match n.get(&arena).value {
                NodeValue::Link(ref nl) => {
                    let label = n
                        .first_child(&arena)
                        .and_then(|c| c.get(&arena).value.text().cloned())
                        .unwrap_or_default();
                    Some((nl.url.clone(), label))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn bare_url() {
        assert_eq!(
            links_in("see https://example.com/x for details"),
            vec![(
                "https://example.com/x".to_string(),
                "https://example.com/x".to_string()
            )]
        );
    }

    #[test]
    fn www_gets_a_scheme() {
        assert_eq!(
            links_in("www.example.com."),
            vec![(
                "http://www.example.com".to_string(),
                "www.example.com".to_string()
            )]
        );
    }

    #[test]
    fn email_gets_mailto() {
        assert_eq!(
            links_in("mail foo.bar@example.com today"),
            vec![(
                "mailto:foo.bar@example.com".to_string(),
                "foo.bar@example.com".to_string()
            )]
        );
    }

    #[test]
    fn trailing_punctuation_backs_off() {
        assert_eq!(
            links_in("(see www.example.com)"),
            vec![(
                "http://www.example.com".to_string(),
                "www.example.com".to_string()
            )]
        );
    }

    #[test]
    fn several_matches_in_one_node() {
        let links = links_in("http://a.com and www.b.org here");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].0, "http://a.com");
        assert_eq!(links[1].0, "http://www.b.org");
    }

    #[test]
    fn plain_words_are_left_alone() {
        assert!(links_in("nothing wwwish here: x@y, http:/nope").is_empty());
    }
}
