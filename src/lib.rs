//! # medscrape - Canonical section extraction for medical wiki articles
//!
//! This crate crawls a MediaWiki category listing, fetches each article and
//! extracts a fixed set of canonical medical sections (causes, diagnosis,
//! treatment and so on) into flat records suitable for building reference
//! datasets.
//!
//! ## Features
//!
//! - Heading resolution that tolerates both legacy `span.mw-headline` markup
//!   and the modern `div.mw-heading` wrappers
//! - Level-aware section extraction that absorbs subsections
//! - Configurable section catalog with title variants
//! - Paginated category crawling with de-duplication, offset/limit windows,
//!   randomized pacing and per-host request spacing
//! - JSON persistence with overwrite and append modes
//! - Async API with Tokio and structured logging with `tracing`
//!
//! ## Example
//!
//! ```rust,no_run
//! use medscrape::config::AppConfig;
//! use medscrape::crawler::{Crawler, HttpFetcher};
//! use medscrape::storage::{Storage, WriteMode};
//!
//! #[tokio::main]
//! async fn main() -> medscrape::Result<()> {
//!     let config = AppConfig::default();
//!     let fetcher = HttpFetcher::new(&config.crawler)?;
//!     let crawler = Crawler::new(fetcher, config.crawler.clone(), config.aggregator());
//!
//!     let report = crawler.run().await?;
//!     Storage::new("rare_diseases.json")
//!         .save(&report.records, WriteMode::Overwrite)
//!         .await?;
//!     Ok(())
//! }
//! ```

mod error;

pub mod config;
pub mod crawler;
pub mod document;
pub mod sections;
pub mod storage;

pub use error::{Error, Result};

/// Re-export of commonly used types
pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::crawler::{CrawlReport, Crawler, CrawlerConfig, HttpFetcher};
    pub use crate::document::ArticleDocument;
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::sections::{SectionAggregator, SectionCatalog, SectionRecord};
    pub use crate::storage::{Storage, WriteMode};
}
