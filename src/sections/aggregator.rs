//! Canonical section aggregation

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::catalog::SectionCatalog;
use super::extractor::{ExtractPolicy, SectionExtractor};
use super::record::SectionRecord;
use super::resolver::{FallbackMatch, HeadingResolver};
use crate::document::ArticleDocument;

/// Default minimum number of populated sections for a record to be kept
pub const DEFAULT_MIN_SECTIONS: usize = 4;

/// Tunables for resolution, extraction and acceptance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Records with fewer populated sections are dropped
    pub min_sections: usize,

    /// Comparison used by the heading text fallback
    pub fallback_match: FallbackMatch,

    /// Node kinds and cleanup applied to captured text
    #[serde(flatten)]
    pub policy: ExtractPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_sections: DEFAULT_MIN_SECTIONS,
            fallback_match: FallbackMatch::default(),
            policy: ExtractPolicy::default(),
        }
    }
}

/// Runs resolution and extraction for every canonical section of an article
#[derive(Debug, Clone)]
pub struct SectionAggregator {
    catalog: SectionCatalog,
    resolver: HeadingResolver,
    extractor: SectionExtractor,
    min_sections: usize,
}

impl SectionAggregator {
    /// Create an aggregator over `catalog`
    pub fn new(catalog: SectionCatalog, options: ExtractOptions) -> Self {
        Self {
            catalog,
            resolver: HeadingResolver::new(options.fallback_match),
            extractor: SectionExtractor::new(options.policy),
            min_sections: options.min_sections,
        }
    }

    /// Acceptance threshold
    pub fn min_sections(&self) -> usize {
        self.min_sections
    }

    /// Extract every canonical section that can be found, without applying
    /// the acceptance threshold
    pub fn collect(&self, document: &ArticleDocument, article: &str) -> SectionRecord {
        let headings = document.headings();
        let mut sections = Vec::new();

        for spec in self.catalog.sections() {
            let Some(resolved) = self.resolver.resolve(&headings, spec) else {
                debug!(article, section = %spec.name, "No matching heading");
                continue;
            };
            match self.extractor.extract_with_fallback(resolved.heading) {
                Some(text) => sections.push((spec.name.clone(), text)),
                None => debug!(article, section = %spec.name, "Heading found but section is empty"),
            }
        }

        SectionRecord::new(article, sections)
    }

    /// Extract the canonical sections and keep the record only when at least
    /// `min_sections` of them were populated
    pub fn aggregate(&self, document: &ArticleDocument, article: &str) -> Option<SectionRecord> {
        let record = self.collect(document, article);
        info!(article, matched = ?record.names(), "Matched sections");

        if record.len() < self.min_sections {
            info!(
                article,
                found = record.len(),
                required = self.min_sections,
                "Dropping sparse article"
            );
            return None;
        }
        Some(record)
    }
}
