//! Category crawler
//!
//! This module walks a paginated wiki category listing, collects article
//! identifiers, and scrapes a window of those articles through the section
//! aggregator.
//!
//! ## Key Components
//!
//! - `Crawler`: Drives listing and scraping for one run
//! - `DocumentSource`: Seam for page fetching, implemented by `HttpFetcher`
//! - `CrawlerConfig`: Start page, window, pacing and HTTP settings
//! - `CrawlReport`: Counters and accepted records from a run

mod category;
mod config;
mod driver;
mod error;
mod fetch;
mod state;

pub use category::{CategoryPage, parse_category_page};
pub use config::{CrawlerConfig, CrawlerConfigBuilder, PacingRange};
pub use driver::{ArticleOutcome, CancelToken, CrawlEvent, CrawlReport, Crawler};
pub use error::CrawlError;
pub use fetch::{DocumentSource, HttpFetcher};
pub use state::{CrawlState, dedup_key};
