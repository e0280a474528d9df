//! # Document Model Module
//!
//! This module wraps a parsed article page and exposes the small set of
//! structural queries the section engine needs: the ordered list of headings,
//! a classification of sibling nodes, and flattened text.
//!
//! ## Key Components
//!
//! - `ArticleDocument`: Owns the parsed HTML tree for one article
//! - `Heading`: A heading normalized to one representation, whether it appears
//!   bare (`<h2>`) or wrapped in a `div.mw-heading` container
//! - `NodeKind`: Tagged classification of a sibling node
//!
//! A heading wrapped in a container is always walked from the container, so
//! edit links and other controls inside the wrapper never leak into content.

mod text;

pub use text::{collapse_whitespace, flatten_text, strip_reference_markers};

use ego_tree::NodeRef;
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// A borrowed node in a parsed document tree
pub type DomNode<'a> = NodeRef<'a, Node>;

/// Level assumed for a heading whose level cannot be determined
pub const DEFAULT_HEADING_LEVEL: u8 = 2;

/// Class carried by the MediaWiki heading wrapper `div`
const HEADING_WRAPPER_CLASS: &str = "mw-heading";

/// Class carried by the legacy inline label `span` inside a heading
const HEADLINE_CLASS: &str = "mw-headline";

/// Class carried by the "[edit]" control inside or beside a heading
const EDIT_SECTION_CLASS: &str = "mw-editsection";

static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6").expect("static heading selector is valid")
});

static HEADLINE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!("span.{HEADLINE_CLASS}")).expect("static headline selector is valid")
});

/// Structural classification of a node encountered while walking siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A heading element, or a wrapper container holding one
    Heading {
        /// Nesting depth, 1 (article title) through 6
        level: u8,
    },

    /// A `<p>` element
    Paragraph,

    /// A `<ul>`, `<ol>` or `<dl>` element
    List,

    /// A generic block container (`div`, `section`, `table`, ...)
    Container,

    /// Text, comments, and any other element
    Other,
}

/// A heading normalized at the adapter boundary
#[derive(Debug, Clone)]
pub struct Heading<'a> {
    element: ElementRef<'a>,
    anchor: ElementRef<'a>,
    level: Option<u8>,
    identifier: Option<String>,
    label: Option<String>,
    text: String,
}

impl<'a> Heading<'a> {
    fn from_element(element: ElementRef<'a>) -> Self {
        let anchor = element
            .parent()
            .and_then(ElementRef::wrap)
            .filter(|parent| is_heading_wrapper(parent.value()))
            .unwrap_or(element);

        let headline = element.select(&HEADLINE_SELECTOR).next();
        let identifier = headline
            .and_then(|span| span.value().id())
            .or_else(|| element.value().id())
            .map(str::to_string);
        let label = headline.map(|span| flatten_text(span, is_edit_control));

        Self {
            element,
            anchor,
            level: heading_level(element.value().name()),
            identifier,
            label,
            text: flatten_text(element, is_edit_control),
        }
    }

    /// Heading level, if the element name carries one
    pub fn level(&self) -> Option<u8> {
        self.level
    }

    /// Heading level, falling back to [`DEFAULT_HEADING_LEVEL`]
    pub fn effective_level(&self) -> u8 {
        self.level.unwrap_or(DEFAULT_HEADING_LEVEL)
    }

    /// Anchor identifier from the inline label, or from the heading itself
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Text of the inline label element, when the heading has one
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Visible heading text with edit controls removed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the heading sits inside a wrapper container
    pub fn is_wrapped(&self) -> bool {
        self.anchor.id() != self.element.id()
    }

    /// First sibling after the heading, or after its wrapper when wrapped
    pub fn content_start(&self) -> Option<DomNode<'a>> {
        self.anchor.next_sibling()
    }

    /// Identity check against another heading of the same document
    pub fn same_node(&self, other: &Heading<'_>) -> bool {
        self.element.id() == other.element.id()
    }

    /// `(identifier, inline label, visible text)`
    pub fn labels(&self) -> (Option<&str>, Option<&str>, &str) {
        (self.identifier(), self.label(), self.text())
    }
}

/// A parsed article page
pub struct ArticleDocument {
    html: Html,
}

impl ArticleDocument {
    /// Parse a full HTML document
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Parse an HTML fragment, mainly useful for tests and snippets
    pub fn parse_fragment(html: &str) -> Self {
        Self {
            html: Html::parse_fragment(html),
        }
    }

    /// Every `h1`..`h6` in document order
    pub fn headings(&self) -> Vec<Heading<'_>> {
        self.html
            .select(&HEADING_SELECTOR)
            .map(Heading::from_element)
            .collect()
    }

    /// Underlying parsed tree
    pub fn html(&self) -> &Html {
        &self.html
    }
}

/// Classify a node for sibling walking
pub fn classify(node: DomNode<'_>) -> NodeKind {
    let Some(element) = node.value().as_element() else {
        return NodeKind::Other;
    };

    if let Some(level) = heading_level(element.name()) {
        return NodeKind::Heading { level };
    }

    if is_heading_wrapper(element) {
        return wrapped_heading_level(node)
            .map(|level| NodeKind::Heading { level })
            .unwrap_or(NodeKind::Container);
    }

    match element.name() {
        "p" => NodeKind::Paragraph,
        "ul" | "ol" | "dl" => NodeKind::List,
        "div" | "section" | "table" | "figure" | "aside" | "blockquote" => NodeKind::Container,
        _ => NodeKind::Other,
    }
}

/// Heading level of a node, looking through a wrapper container
pub fn level_of(node: DomNode<'_>) -> Option<u8> {
    match classify(node) {
        NodeKind::Heading { level } => Some(level),
        _ => None,
    }
}

/// Whether a node ends a span regardless of level: any heading, or any
/// heading wrapper even when it holds no heading element
pub fn is_heading_boundary(node: DomNode<'_>) -> bool {
    matches!(classify(node), NodeKind::Heading { .. })
        || node.value().as_element().is_some_and(is_heading_wrapper)
}

/// Next sibling of any node
pub fn next_sibling(node: DomNode<'_>) -> Option<DomNode<'_>> {
    node.next_sibling()
}

/// Level encoded in an element name such as `h3`
pub fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn wrapped_heading_level(node: DomNode<'_>) -> Option<u8> {
    node.descendants()
        .skip(1)
        .filter_map(|n| n.value().as_element())
        .find_map(|e| heading_level(e.name()))
}

fn is_heading_wrapper(element: &Element) -> bool {
    element.name() == "div" && element.classes().any(|c| c == HEADING_WRAPPER_CLASS)
}

fn is_edit_control(element: &Element) -> bool {
    element.classes().any(|c| c == EDIT_SECTION_CLASS)
}
