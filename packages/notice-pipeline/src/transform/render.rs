//! Markup serialization with rewrite hooks.
//!
//! `scraper` exposes a read-only tree, so rewriting happens while serializing:
//! link attributes pass through a [`LinkRewriter`] and one element (by id) can
//! have its children swapped for prepared markup.

use scraper::{ElementRef, Node};

use super::links::LinkRewriter;
use crate::enumerate::listing::element_text;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Hooks applied while rendering.
#[derive(Default)]
pub struct RenderOptions<'a> {
    /// Rewrite `a[href]` and `img[src]`
    pub links: Option<&'a LinkRewriter>,

    /// Replace the children of the element with this id by raw markup
    pub replace_children: Option<(&'a str, &'a str)>,
}

/// Render state carried across elements.
#[derive(Debug, Default)]
pub struct RenderState {
    /// Visible text of the first anchor whose href was rewritten
    pub first_rewritten_link: Option<String>,
}

/// Serialize an element and its subtree.
pub fn render_element(
    el: ElementRef<'_>,
    options: &RenderOptions<'_>,
    state: &mut RenderState,
    out: &mut String,
) {
    let element = el.value();
    let name = element.name();

    out.push('<');
    out.push_str(name);
    for (key, value) in element.attrs() {
        let rewritten = options
            .links
            .filter(|_| is_link_attr(name, key))
            .and_then(|links| links.rewrite(value));

        if rewritten.is_some() && name == "a" && state.first_rewritten_link.is_none() {
            let text = element_text(&el);
            if !text.is_empty() {
                state.first_rewritten_link = Some(text);
            }
        }

        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attr(rewritten.as_deref().unwrap_or(value), out);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    match options.replace_children {
        Some((id, inner)) if element.id() == Some(id) => out.push_str(inner),
        _ => render_children(el, name, options, state, out),
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Serialize only the children of an element.
pub fn render_children(
    el: ElementRef<'_>,
    parent_name: &str,
    options: &RenderOptions<'_>,
    state: &mut RenderState,
    out: &mut String,
) {
    let raw_text = RAW_TEXT_ELEMENTS.contains(&parent_name);

    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                if raw_text {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    render_element(child_el, options, state, out);
                }
            }
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            _ => {}
        }
    }
}

fn is_link_attr(element: &str, attr: &str) -> bool {
    matches!((element, attr), ("a", "href") | ("img", "src"))
}

pub(crate) fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

pub(crate) fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
