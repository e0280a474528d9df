//! # Crawler Configuration Module
//!
//! This module provides configuration options for the category crawler,
//! including the listing to start from, the window of articles to scrape,
//! request pacing, and HTTP client settings. It uses a builder pattern for
//! flexible configuration.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: The main configuration struct with crawler parameters
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration
//! - `PacingRange`: Randomized delay bounds between requests
//!
//! ## Features
//!
//! - Default configuration suitable for polite crawling of the rare-disease category
//! - Offset/limit window over the discovered article list
//! - Randomized pacing between category pages and between articles
//! - Minimum spacing per remote host, enforced across all workers
//! - User-agent and timeout customization

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::crawler::error::CrawlError;

/// Characters that would change the meaning of a title placed in a URL path
const TITLE_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Inclusive bounds, in milliseconds, for a randomized pause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingRange {
    /// Shortest pause
    pub min_ms: u64,

    /// Longest pause
    pub max_ms: u64,
}

impl PacingRange {
    /// Create a range from bounds in milliseconds
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A range that never pauses
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// Draw a delay uniformly from the range
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }

    /// Sleep for a randomly drawn delay
    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Configuration for the crawler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// First category listing page
    pub category_url: String,

    /// Prefix that article identifiers are appended to
    pub article_base_url: String,

    /// User agent to use for requests
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Index of the first discovered article to scrape
    pub offset: usize,

    /// Number of articles to scrape
    pub limit: usize,

    /// Number of article fetches in flight at once
    pub workers: usize,

    /// Minimum spacing in milliseconds between requests to the same host
    pub host_interval_ms: u64,

    /// Pause after each category page
    pub category_delay: PacingRange,

    /// Pause after each article
    pub article_delay: PacingRange,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            category_url: "https://en.wikipedia.org/wiki/Category:Rare_diseases".to_string(),
            article_base_url: "https://en.wikipedia.org/wiki/".to_string(),
            user_agent: format!("medscrape/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 15,
            offset: 0,
            limit: 200,
            workers: 1,
            host_interval_ms: 500,
            category_delay: PacingRange::new(500, 1000),
            article_delay: PacingRange::new(1000, 2000),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the first category listing page
    pub fn category_url(mut self, category_url: impl Into<String>) -> Self {
        self.config.category_url = category_url.into();
        self
    }

    /// Set the prefix article identifiers are appended to
    pub fn article_base_url(mut self, article_base_url: impl Into<String>) -> Self {
        self.config.article_base_url = article_base_url.into();
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the index of the first article to scrape
    pub fn offset(mut self, offset: usize) -> Self {
        self.config.offset = offset;
        self
    }

    /// Set the number of articles to scrape
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.limit = limit;
        self
    }

    /// Set the number of concurrent article fetches
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the minimum spacing between requests to one host
    pub fn host_interval_ms(mut self, host_interval_ms: u64) -> Self {
        self.config.host_interval_ms = host_interval_ms;
        self
    }

    /// Set the pause after each category page
    pub fn category_delay(mut self, category_delay: PacingRange) -> Self {
        self.config.category_delay = category_delay;
        self
    }

    /// Set the pause after each article
    pub fn article_delay(mut self, article_delay: PacingRange) -> Self {
        self.config.article_delay = article_delay;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the per-host spacing as a Duration
    pub fn host_interval(&self) -> Duration {
        Duration::from_millis(self.host_interval_ms)
    }

    /// One past the last discovered index that will be scraped
    pub fn window_end(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }

    /// Parsed category start URL
    pub fn category_start(&self) -> Result<Url, CrawlError> {
        Ok(Url::parse(&self.category_url)?)
    }

    /// URL of an article identified by its decoded page title
    pub fn article_url(&self, title: &str) -> Result<Url, CrawlError> {
        // Joining would read titles like "Foo:Bar" as a scheme, so concatenate
        let path = title.trim().replace(' ', "_");
        let path = utf8_percent_encode(&path, TITLE_ENCODE_SET);
        Ok(Url::parse(&format!("{}{}", self.article_base_url, path))?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), CrawlError> {
        self.category_start()?;
        Url::parse(&self.article_base_url)?;
        if self.limit == 0 {
            return Err(CrawlError::Config("limit must be greater than 0".to_string()));
        }
        if self.workers == 0 {
            return Err(CrawlError::Config("workers must be greater than 0".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(CrawlError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        for (name, range) in [
            ("category_delay", self.category_delay),
            ("article_delay", self.article_delay),
        ] {
            if range.min_ms > range.max_ms {
                return Err(CrawlError::Config(format!(
                    "{name}: min_ms ({}) exceeds max_ms ({})",
                    range.min_ms, range.max_ms
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CrawlerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_end(), 200);
    }

    #[test]
    fn test_builder_overrides() {
        let config = CrawlerConfig::builder()
            .offset(10)
            .limit(5)
            .workers(3)
            .user_agent("test-agent/1.0")
            .article_delay(PacingRange::none())
            .build();
        assert_eq!(config.window_end(), 15);
        assert_eq!(config.workers, 3);
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert_eq!(config.article_delay, PacingRange::none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(CrawlerConfig::builder().limit(0).build().validate().is_err());
        assert!(CrawlerConfig::builder().workers(0).build().validate().is_err());
        assert!(
            CrawlerConfig::builder()
                .category_delay(PacingRange::new(900, 100))
                .build()
                .validate()
                .is_err()
        );
        assert!(
            CrawlerConfig::builder()
                .category_url("not a url")
                .build()
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_article_url() {
        let config = CrawlerConfig::default();
        assert_eq!(
            config.article_url("Fabry disease").unwrap().as_str(),
            "https://en.wikipedia.org/wiki/Fabry_disease"
        );
        assert_eq!(
            config.article_url("Ehlers–Danlos syndromes").unwrap().as_str(),
            "https://en.wikipedia.org/wiki/Ehlers%E2%80%93Danlos_syndromes"
        );
        assert_eq!(
            config.article_url("Why? 100% sure").unwrap().as_str(),
            "https://en.wikipedia.org/wiki/Why%3F_100%25_sure"
        );
        assert!(config.article_url("HIV:AIDS").is_ok());
    }

    #[test]
    fn test_pacing_sample_within_bounds() {
        let range = PacingRange::new(5, 10);
        for _ in 0..50 {
            let delay = range.sample();
            assert!(delay >= Duration::from_millis(5) && delay <= Duration::from_millis(10));
        }
        assert_eq!(PacingRange::none().sample(), Duration::ZERO);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CrawlerConfig = toml::from_str(
            r#"
            limit = 25
            article_delay = { min_ms = 0, max_ms = 10 }
            "#,
        )
        .unwrap();
        assert_eq!(config.limit, 25);
        assert_eq!(config.offset, 0);
        assert_eq!(config.article_delay, PacingRange::new(0, 10));
        assert_eq!(config.category_delay, PacingRange::new(500, 1000));
    }
}
