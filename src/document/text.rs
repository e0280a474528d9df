//! Text flattening helpers

use regex::Regex;
use scraper::ElementRef;
use scraper::node::{Element, Node};
use std::sync::LazyLock;

use super::DomNode;

/// Inline citation markers such as `[12]`, `[a]` or `[citation needed]`
static REFERENCE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\s*(?:\d+|[a-z]|note \d+|citation needed|clarification needed)\s*\]")
        .expect("static reference marker pattern is valid")
});

/// Concatenate all descendant text of `element`, skipping subtrees rooted at
/// elements for which `skip` returns true, then collapse whitespace.
pub fn flatten_text(element: ElementRef<'_>, skip: impl Fn(&Element) -> bool) -> String {
    let mut raw = String::new();
    collect_text(*element, &skip, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(node: DomNode<'_>, skip: &impl Fn(&Element) -> bool, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if !skip(element) => collect_text(child, skip, out),
            _ => {}
        }
    }
}

/// Collapse every whitespace run to one space and trim the ends
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove bracketed citation markers left in flattened text
pub fn strip_reference_markers(input: &str) -> String {
    let stripped = REFERENCE_MARKER.replace_all(input, "");
    // Markers sit before punctuation, so the removal can leave "word ." behind
    collapse_whitespace(&stripped)
        .replace(" .", ".")
        .replace(" ,", ",")
}
