//! Section span extraction
//!
//! Given a resolved heading, walk its following siblings and collect the text
//! that belongs to the section. Deeper subheadings are absorbed; a heading of
//! the same or a higher level closes the span.

use scraper::ElementRef;
use scraper::node::Element;
use serde::{Deserialize, Serialize};

use crate::document::{
    DomNode, Heading, NodeKind, classify, flatten_text, is_heading_boundary, next_sibling,
    strip_reference_markers,
};

/// Which node kinds contribute text, and how it is cleaned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractPolicy {
    /// Flatten list items into "- " prefixed lines
    pub include_lists: bool,

    /// Drop inline citation markers such as `[3]`
    pub strip_references: bool,
}

/// Extracts the text belonging to a heading
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionExtractor {
    policy: ExtractPolicy,
}

impl SectionExtractor {
    /// Create an extractor with the given policy
    pub fn new(policy: ExtractPolicy) -> Self {
        Self { policy }
    }

    /// Collect the section and all of its subsections.
    ///
    /// Stops at the first heading whose level is less than or equal to the
    /// starting heading's level. Returns `None` when nothing was captured.
    pub fn extract(&self, heading: &Heading<'_>) -> Option<String> {
        let start_level = heading.effective_level();
        let mut lines = Vec::new();

        for node in siblings_after(heading) {
            match classify(node) {
                NodeKind::Heading { level } if level <= start_level => break,
                kind => self.capture(node, kind, &mut lines),
            }
        }

        join_lines(lines)
    }

    /// Collect content up to the next heading of any level.
    ///
    /// Used when the level-aware walk finds nothing, typically because the
    /// document's heading levels are inconsistent.
    pub fn extract_bounded(&self, heading: &Heading<'_>) -> Option<String> {
        let mut lines = Vec::new();

        for node in siblings_after(heading) {
            if is_heading_boundary(node) {
                break;
            }
            self.capture(node, classify(node), &mut lines);
        }

        join_lines(lines)
    }

    /// Level-aware extraction, then the bounded walk when it yields nothing
    pub fn extract_with_fallback(&self, heading: &Heading<'_>) -> Option<String> {
        self.extract(heading)
            .or_else(|| self.extract_bounded(heading))
    }

    fn capture(&self, node: DomNode<'_>, kind: NodeKind, lines: &mut Vec<String>) {
        let Some(element) = ElementRef::wrap(node) else {
            return;
        };
        match kind {
            NodeKind::Paragraph => {
                let text = self.clean(element);
                if !text.is_empty() {
                    lines.push(text);
                }
            }
            NodeKind::List if self.policy.include_lists => {
                for item in element.children().filter_map(ElementRef::wrap) {
                    if !matches!(item.value().name(), "li" | "dt" | "dd") {
                        continue;
                    }
                    let text = self.clean(item);
                    if !text.is_empty() {
                        lines.push(format!("- {text}"));
                    }
                }
            }
            _ => {}
        }
    }

    fn clean(&self, element: ElementRef<'_>) -> String {
        if self.policy.strip_references {
            strip_reference_markers(&flatten_text(element, is_reference))
        } else {
            flatten_text(element, |_| false)
        }
    }
}

fn siblings_after<'a>(heading: &Heading<'a>) -> impl Iterator<Item = DomNode<'a>> {
    std::iter::successors(heading.content_start(), |node| next_sibling(*node))
}

fn is_reference(element: &Element) -> bool {
    element.name() == "sup" && element.classes().any(|c| c == "reference")
}

fn join_lines(lines: Vec<String>) -> Option<String> {
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ArticleDocument;

    fn heading_by_text<'a>(headings: &'a [Heading<'a>], text: &str) -> &'a Heading<'a> {
        headings.iter().find(|h| h.text() == text).unwrap()
    }

    #[test]
    fn test_subsection_absorbed_until_same_level() {
        let doc = ArticleDocument::parse_fragment(
            r#"<h2>Causes</h2>
               <p>Intro.</p>
               <h3>Genetics</h3>
               <p>Sub content.</p>
               <h2>Diagnosis</h2>
               <p>Other.</p>"#,
        );
        let headings = doc.headings();
        let text = SectionExtractor::default()
            .extract(heading_by_text(&headings, "Causes"))
            .unwrap();
        assert_eq!(text, "Intro.\nSub content.");
    }

    #[test]
    fn test_deeper_heading_is_not_a_boundary() {
        let doc = ArticleDocument::parse_fragment(
            r#"<h2>Treatment</h2><h4>Surgery</h4><p>Resection.</p><h1>Next</h1><p>Nope.</p>"#,
        );
        let headings = doc.headings();
        let text = SectionExtractor::default()
            .extract(heading_by_text(&headings, "Treatment"))
            .unwrap();
        assert_eq!(text, "Resection.");
    }

    #[test]
    fn test_wrapped_headings_bound_the_span() {
        let doc = ArticleDocument::parse_fragment(
            r#"<div class="mw-heading mw-heading2"><h2 id="Causes">Causes</h2><span class="mw-editsection">[edit]</span></div>
               <p>X is caused by Y.</p>
               <div class="mw-heading mw-heading3"><h3 id="Genes">Genes</h3></div>
               <p>Gene Z.</p>
               <div class="mw-heading mw-heading2"><h2 id="Diagnosis">Diagnosis</h2></div>
               <p>Diagnosed via Z.</p>"#,
        );
        let headings = doc.headings();
        let text = SectionExtractor::default()
            .extract(heading_by_text(&headings, "Causes"))
            .unwrap();
        assert_eq!(text, "X is caused by Y.\nGene Z.");
        assert!(!text.contains("edit"));
    }

    #[test]
    fn test_lists_skipped_unless_enabled() {
        let html = r#"<h2>Signs</h2><p>Common signs:</p><ul><li>Fever</li><li> Rash </li></ul><h2>End</h2>"#;
        let doc = ArticleDocument::parse_fragment(html);
        let headings = doc.headings();
        let signs = heading_by_text(&headings, "Signs");

        assert_eq!(
            SectionExtractor::default().extract(signs).as_deref(),
            Some("Common signs:")
        );

        let with_lists = SectionExtractor::new(ExtractPolicy {
            include_lists: true,
            ..Default::default()
        });
        assert_eq!(
            with_lists.extract(signs).as_deref(),
            Some("Common signs:\n- Fever\n- Rash")
        );
    }

    #[test]
    fn test_empty_paragraphs_yield_none() {
        let doc = ArticleDocument::parse_fragment(
            r#"<h2>Prognosis</h2><p>   </p><table><tr><td>x</td></tr></table><h2>Next</h2>"#,
        );
        let headings = doc.headings();
        assert!(
            SectionExtractor::default()
                .extract(heading_by_text(&headings, "Prognosis"))
                .is_none()
        );
    }

    #[test]
    fn test_bounded_stops_at_any_heading() {
        let doc = ArticleDocument::parse_fragment(
            r#"<h3>Outcome</h3><p>First.</p><h5>Detail</h5><p>Second.</p>"#,
        );
        let headings = doc.headings();
        let outcome = heading_by_text(&headings, "Outcome");
        let extractor = SectionExtractor::default();
        assert_eq!(extractor.extract(outcome).as_deref(), Some("First.\nSecond."));
        assert_eq!(extractor.extract_bounded(outcome).as_deref(), Some("First."));
    }

    #[test]
    fn test_fallback_cannot_cross_a_heading() {
        // An h1 right after the h2 closes both walks immediately
        let doc = ArticleDocument::parse_fragment(r#"<h2>Causes</h2><h1>Title</h1><p>Late.</p>"#);
        let headings = doc.headings();
        let causes = heading_by_text(&headings, "Causes");
        assert!(SectionExtractor::default().extract_with_fallback(causes).is_none());
    }

    #[test]
    fn test_strip_references() {
        let doc = ArticleDocument::parse_fragment(
            r#"<h2>Epidemiology</h2><p>Affects 1 in 5000<sup class="reference"><a>[4]</a></sup> births [citation needed].</p>"#,
        );
        let headings = doc.headings();
        let extractor = SectionExtractor::new(ExtractPolicy {
            strip_references: true,
            ..Default::default()
        });
        assert_eq!(
            extractor
                .extract(heading_by_text(&headings, "Epidemiology"))
                .as_deref(),
            Some("Affects 1 in 5000 births.")
        );
    }
}
