//! # Section Extraction Module
//!
//! This module turns a parsed article into a record of canonical medical
//! sections. Heading wording varies between articles, so each canonical name
//! carries a set of accepted title variants.
//!
//! ## Key Components
//!
//! - `SectionCatalog`: Ordered canonical names with their title variants
//! - `HeadingResolver`: Finds the heading that introduces a section
//! - `SectionExtractor`: Collects the text between that heading and the next
//!   heading of the same or higher level
//! - `SectionAggregator`: Runs both for every canonical name and applies the
//!   minimum-section acceptance threshold
//! - `SectionRecord`: The per-article result
//!
//! ## Usage
//!
//! ```rust
//! use medscrape::document::ArticleDocument;
//! use medscrape::sections::{ExtractOptions, SectionAggregator, SectionCatalog};
//!
//! let html = r#"<h2 id="Causes">Causes</h2><p>X is caused by Y.</p>"#;
//! let document = ArticleDocument::parse(html);
//! let options = ExtractOptions { min_sections: 1, ..Default::default() };
//! let aggregator = SectionAggregator::new(SectionCatalog::default(), options);
//!
//! let record = aggregator.aggregate(&document, "Example").unwrap();
//! assert_eq!(record.get("Causes"), Some("X is caused by Y."));
//! ```

mod aggregator;
mod catalog;
mod extractor;
mod record;
mod resolver;

pub use aggregator::{DEFAULT_MIN_SECTIONS, ExtractOptions, SectionAggregator};
pub use catalog::{SectionCatalog, SectionSpec, normalize_title};
pub use extractor::{ExtractPolicy, SectionExtractor};
pub use record::{ARTICLE_KEY, SectionRecord};
pub use resolver::{FallbackMatch, HeadingResolver, MatchStrategy, Resolved};
