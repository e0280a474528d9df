//! Heading resolution for canonical sections
//!
//! Resolution runs two strategies in order and the first hit wins:
//!
//! 1. Exact structural match: a heading of level 2-6 whose normalized
//!    identifier or inline label equals a normalized variant.
//! 2. Text fallback: the first heading of any level whose normalized visible
//!    text contains a normalized variant.
//!
//! Both strategies scan in document order, so the same document and variant
//! set always resolve to the same heading.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::catalog::{SectionSpec, normalize_title};
use crate::document::Heading;

/// How the text fallback compares a variant against heading text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMatch {
    /// Plain substring containment
    #[default]
    Substring,

    /// Containment on whole-word boundaries only
    WholeWord,
}

/// Which strategy produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Inline identifier equalled a variant
    Identifier,

    /// Inline label text equalled a variant
    Label,

    /// Visible text contained a variant
    TextFallback,
}

/// A resolved heading and the strategy that found it
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'h, 'a> {
    /// The matched heading
    pub heading: &'h Heading<'a>,

    /// How it was matched
    pub strategy: MatchStrategy,
}

/// Locates the heading that introduces a canonical section
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingResolver {
    fallback: FallbackMatch,
}

impl HeadingResolver {
    /// Create a resolver with the given fallback policy
    pub fn new(fallback: FallbackMatch) -> Self {
        Self { fallback }
    }

    /// Resolve `spec` against headings listed in document order
    pub fn resolve<'h, 'a>(
        &self,
        headings: &'h [Heading<'a>],
        spec: &SectionSpec,
    ) -> Option<Resolved<'h, 'a>> {
        let variants = spec.normalized_titles();
        if variants.is_empty() {
            return None;
        }

        let found = self
            .structural_match(headings, &variants)
            .or_else(|| self.text_match(headings, &variants));

        if let Some(resolved) = &found {
            trace!(
                section = %spec.name,
                heading = %resolved.heading.text(),
                strategy = ?resolved.strategy,
                "Resolved section heading"
            );
        }
        found
    }

    fn structural_match<'h, 'a>(
        &self,
        headings: &'h [Heading<'a>],
        variants: &[String],
    ) -> Option<Resolved<'h, 'a>> {
        headings
            .iter()
            .filter(|h| (2..=6).contains(&h.effective_level()))
            .find_map(|heading| {
                let strategy = if matches_exact(heading.identifier(), variants) {
                    MatchStrategy::Identifier
                } else if matches_exact(heading.label(), variants) {
                    MatchStrategy::Label
                } else {
                    return None;
                };
                Some(Resolved { heading, strategy })
            })
    }

    fn text_match<'h, 'a>(
        &self,
        headings: &'h [Heading<'a>],
        variants: &[String],
    ) -> Option<Resolved<'h, 'a>> {
        headings
            .iter()
            .find(|heading| {
                let text = normalize_title(heading.text());
                variants.iter().any(|v| self.contains(&text, v))
            })
            .map(|heading| Resolved {
                heading,
                strategy: MatchStrategy::TextFallback,
            })
    }

    fn contains(&self, text: &str, variant: &str) -> bool {
        match self.fallback {
            FallbackMatch::Substring => text.contains(variant),
            // Both sides are normalized to single-space separated words
            FallbackMatch::WholeWord => format!(" {text} ").contains(&format!(" {variant} ")),
        }
    }
}

fn matches_exact(candidate: Option<&str>, variants: &[String]) -> bool {
    candidate
        .map(normalize_title)
        .is_some_and(|c| !c.is_empty() && variants.contains(&c))
}
