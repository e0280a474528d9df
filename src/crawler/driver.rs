//! Category crawl driver
//!
//! The driver moves through three phases: `Listing` follows category pages
//! and accumulates identifiers, `Scraping` fetches and aggregates every
//! article in the configured window, and `Done` ends the run. Fetch failures
//! are logged and skipped in both phases; a run always finishes with whatever
//! records were gathered.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use url::Url;

use crate::crawler::CrawlerConfig;
use crate::crawler::category::parse_category_page;
use crate::crawler::error::CrawlError;
use crate::crawler::fetch::DocumentSource;
use crate::crawler::state::CrawlState;
use crate::document::ArticleDocument;
use crate::sections::{SectionAggregator, SectionRecord};

/// Shared flag that stops a crawl before its next fetch
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress notifications emitted while crawling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    /// A category page was parsed
    CategoryPage {
        /// 1-based page number
        page: usize,
        /// Distinct identifiers collected so far
        collected: usize,
    },

    /// Listing finished and scraping is about to start
    ListingComplete {
        /// Distinct identifiers collected
        collected: usize,
        /// Articles in the scrape window
        window: usize,
    },

    /// An article was processed
    Article {
        /// 1-based position within the window
        index: usize,
        /// Window size
        total: usize,
        /// Article identifier
        title: String,
        /// What happened to it
        outcome: ArticleOutcome,
    },
}

/// Result of processing one article
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOutcome {
    /// Record kept with this many sections
    Kept(usize),
    /// Too few sections were found
    Dropped,
    /// The page could not be fetched
    FetchFailed(String),
    /// Skipped because the crawl was cancelled
    Cancelled,
}

/// Summary of a crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Category pages successfully parsed
    pub category_pages: usize,
    /// Distinct identifiers collected (after truncation to the window end)
    pub collected: usize,
    /// Articles whose fetch was attempted
    pub attempted: usize,
    /// Article fetches that failed
    pub fetch_failures: usize,
    /// Articles dropped for having too few sections
    pub dropped: usize,
    /// Whether the run stopped early
    pub cancelled: bool,
    /// Accepted records in discovery order
    #[serde(skip)]
    pub records: Vec<SectionRecord>,
}

impl CrawlReport {
    fn start() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            category_pages: 0,
            collected: 0,
            attempted: 0,
            fetch_failures: 0,
            dropped: 0,
            cancelled: false,
            records: Vec::new(),
        }
    }
}

enum Phase {
    Listing(Url),
    Scraping,
    Done,
}

/// Crawls a category listing and aggregates each article in the window
pub struct Crawler<S> {
    source: S,
    config: CrawlerConfig,
    aggregator: SectionAggregator,
    events: Option<mpsc::Sender<CrawlEvent>>,
    cancel: CancelToken,
}

impl<S: DocumentSource> Crawler<S> {
    /// Create a crawler reading pages from `source`
    pub fn new(source: S, config: CrawlerConfig, aggregator: SectionAggregator) -> Self {
        Self {
            source,
            config,
            aggregator,
            events: None,
            cancel: CancelToken::new(),
        }
    }

    /// Send progress events to `sender`
    pub fn with_events(mut self, sender: mpsc::Sender<CrawlEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Stop the crawl when `token` is cancelled
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run the full crawl starting from the configured category page
    #[instrument(skip(self), fields(category = %self.config.category_url))]
    pub async fn run(&self) -> Result<CrawlReport, CrawlError> {
        let start = self.config.category_start()?;
        Ok(self.run_from(start).await)
    }

    /// Run the full crawl starting from `start`
    pub async fn run_from(&self, start: Url) -> CrawlReport {
        let mut report = CrawlReport::start();
        let mut state = CrawlState::new();
        let mut phase = Phase::Listing(start);

        info!("Collecting article identifiers from category pages");
        loop {
            phase = match phase {
                Phase::Listing(url) => self.list_page(url, &mut state, &mut report).await,
                Phase::Scraping => {
                    self.scrape_window(&state, &mut report).await;
                    Phase::Done
                }
                Phase::Done => break,
            };
        }

        report.finished_at = Utc::now();
        info!(
            records = report.records.len(),
            pages = report.category_pages,
            failures = report.fetch_failures,
            dropped = report.dropped,
            "Crawl finished"
        );
        report
    }

    async fn list_page(&self, url: Url, state: &mut CrawlState, report: &mut CrawlReport) -> Phase {
        if self.cancel.is_cancelled() {
            report.cancelled = true;
            return Phase::Done;
        }

        let page_number = report.category_pages + 1;
        info!(page = page_number, %url, "Fetching category page");

        let html = match self.source.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(page = page_number, "Failed to fetch category page: {}", e);
                return self.finish_listing(state, report).await;
            }
        };

        let page = parse_category_page(&html, &url);
        let added = state.extend(page.articles);
        report.category_pages = page_number;
        info!(
            page = page_number,
            added,
            total = state.len(),
            "Collected article identifiers"
        );
        self.emit(CrawlEvent::CategoryPage {
            page: page_number,
            collected: state.len(),
        })
        .await;

        let window_end = self.config.window_end();
        if state.len() >= window_end {
            state.truncate(window_end);
            return self.finish_listing(state, report).await;
        }

        match page.next_page {
            Some(next) => {
                self.config.category_delay.pause().await;
                Phase::Listing(next)
            }
            None => self.finish_listing(state, report).await,
        }
    }

    async fn finish_listing(&self, state: &CrawlState, report: &mut CrawlReport) -> Phase {
        report.collected = state.len();
        let window = state.window(self.config.offset, self.config.limit).len();
        info!(
            collected = state.len(),
            window,
            pages = report.category_pages,
            "Listing complete"
        );
        self.emit(CrawlEvent::ListingComplete {
            collected: state.len(),
            window,
        })
        .await;
        Phase::Scraping
    }

    async fn scrape_window(&self, state: &CrawlState, report: &mut CrawlReport) {
        let window = state.window(self.config.offset, self.config.limit);
        let total = window.len();

        // `buffered` yields in input order, so records keep discovery order
        let mut results = stream::iter(window.iter().enumerate())
            .map(|(i, title)| async move { (i + 1, title, self.scrape_article(title).await) })
            .buffered(self.config.workers.max(1));

        while let Some((index, title, (outcome, record))) = results.next().await {
            match &outcome {
                ArticleOutcome::Kept(_) => report.attempted += 1,
                ArticleOutcome::Dropped => {
                    report.attempted += 1;
                    report.dropped += 1;
                }
                ArticleOutcome::FetchFailed(_) => {
                    report.attempted += 1;
                    report.fetch_failures += 1;
                }
                ArticleOutcome::Cancelled => report.cancelled = true,
            }
            report.records.extend(record);

            self.emit(CrawlEvent::Article {
                index,
                total,
                title: title.clone(),
                outcome,
            })
            .await;
        }
    }

    async fn scrape_article(&self, title: &str) -> (ArticleOutcome, Option<SectionRecord>) {
        if self.cancel.is_cancelled() {
            return (ArticleOutcome::Cancelled, None);
        }

        let url = match self.config.article_url(title) {
            Ok(url) => url,
            Err(e) => {
                warn!(article = title, "Cannot build article URL: {}", e);
                return (ArticleOutcome::FetchFailed(e.to_string()), None);
            }
        };

        info!(article = title, "Scraping article");
        let html = match self.source.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(article = title, "Failed to fetch article: {}", e);
                self.config.article_delay.pause().await;
                return (ArticleOutcome::FetchFailed(e.to_string()), None);
            }
        };

        let record = {
            let document = ArticleDocument::parse(&html);
            self.aggregator.aggregate(&document, title)
        };
        self.config.article_delay.pause().await;

        match record {
            Some(record) => (ArticleOutcome::Kept(record.len()), Some(record)),
            None => (ArticleOutcome::Dropped, None),
        }
    }

    /// Fetch and aggregate a single article, ignoring the crawl window.
    /// Unlike a crawl, a fetch failure here is returned to the caller.
    #[instrument(skip(self))]
    pub async fn scrape_single(&self, title: &str) -> Result<Option<SectionRecord>, CrawlError> {
        let html = self.fetch_article(title).await?;
        let document = ArticleDocument::parse(&html);
        Ok(self.aggregator.aggregate(&document, title))
    }

    /// Fetch the raw HTML of one article
    pub async fn fetch_article(&self, title: &str) -> Result<String, CrawlError> {
        let url = self.config.article_url(title)?;
        self.source.fetch(&url).await
    }

    async fn emit(&self, event: CrawlEvent) {
        if let Some(sender) = &self.events {
            // A closed receiver only means nobody is watching progress
            let _ = sender.send(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::PacingRange;
    use crate::sections::{ExtractOptions, SectionCatalog, SectionSpec};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    const BASE: &str = "https://wiki.test/wiki/";
    const CATEGORY: &str = "https://wiki.test/wiki/Category:Rare";

    /// In-memory pages keyed by URL; records every requested URL
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<String, String>,
        timeouts: HashSet<String>,
        cancel_on: Option<(String, CancelToken)>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn page(mut self, url: &str, html: String) -> Self {
            self.pages.insert(url.to_string(), html);
            self
        }

        fn timing_out(mut self, title: &str) -> Self {
            self.timeouts.insert(format!("{BASE}{}", title.replace(' ', "_")));
            self
        }

        /// Cancel `token` while serving the page of `title`
        fn cancelling_on(mut self, title: &str, token: CancelToken) -> Self {
            self.cancel_on = Some((format!("{BASE}{}", title.replace(' ', "_")), token));
            self
        }

        fn article(self, title: &str) -> Self {
            let url = format!("{BASE}{}", title.replace(' ', "_"));
            self.page(&url, article_html(title))
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl DocumentSource for FakeSource {
        async fn fetch(&self, url: &Url) -> Result<String, CrawlError> {
            self.requested.lock().unwrap().push(url.to_string());
            if let Some((trigger, token)) = &self.cancel_on {
                if trigger == url.as_str() {
                    token.cancel();
                }
            }
            if self.timeouts.contains(url.as_str()) {
                return Err(CrawlError::Timeout(url.to_string()));
            }
            self.pages.get(url.as_str()).cloned().ok_or(CrawlError::Status {
                status: 404,
                url: url.to_string(),
            })
        }
    }

    fn category_html(titles: &[String], next: Option<&str>) -> String {
        let links: String = titles
            .iter()
            .map(|t| format!(r#"<li><a href="/wiki/{}" title="{t}">{t}</a></li>"#, t.replace(' ', "_")))
            .collect();
        let next = next
            .map(|href| format!(r#"<a href="{href}">next page</a>"#))
            .unwrap_or_default();
        format!(
            r#"<html><body><div id="mw-pages">{next}<div class="mw-category-group"><ul>{links}</ul></div></div></body></html>"#
        )
    }

    fn article_html(title: &str) -> String {
        format!(
            r#"<html><body><h1>{title}</h1>
               <h2 id="Causes">Causes</h2><p>{title} is caused by Y.</p>
               <h2 id="Diagnosis">Diagnosis</h2><p>Diagnosed via Z.</p>
               </body></html>"#
        )
    }

    fn titles(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("Disease {i:02}")).collect()
    }

    fn crawler(source: FakeSource, offset: usize, limit: usize, workers: usize) -> Crawler<FakeSource> {
        let config = CrawlerConfig::builder()
            .category_url(CATEGORY)
            .article_base_url(BASE)
            .offset(offset)
            .limit(limit)
            .workers(workers)
            .category_delay(PacingRange::none())
            .article_delay(PacingRange::none())
            .build();
        let catalog = SectionCatalog::new(vec![
            SectionSpec::new("Causes", ["Causes"]),
            SectionSpec::new("Diagnosis", ["Diagnosis"]),
        ]);
        let options = ExtractOptions {
            min_sections: 2,
            ..Default::default()
        };
        Crawler::new(source, config, SectionAggregator::new(catalog, options))
    }

    fn article_urls(requested: &[String]) -> Vec<String> {
        requested
            .iter()
            .filter(|u| !u.contains("Category:"))
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn test_overlapping_pages_scraped_once() {
        let page_one = titles(0..5);
        let mut page_two = titles(0..5);
        page_two.extend(titles(5..8));

        let mut source = FakeSource::default()
            .page(CATEGORY, category_html(&page_one, Some("/wiki/Category:Rare?from=2")))
            .page(
                "https://wiki.test/wiki/Category:Rare?from=2",
                category_html(&page_two, None),
            );
        for title in titles(0..8) {
            source = source.article(&title);
        }

        let crawler = crawler(source, 0, 100, 1);
        let report = crawler.run().await.unwrap();

        assert_eq!(report.category_pages, 2);
        assert_eq!(report.collected, 8);
        assert_eq!(report.attempted, 8);
        assert_eq!(report.records.len(), 8);
        assert_eq!(article_urls(&crawler.source.requested()).len(), 8);
    }

    #[tokio::test]
    async fn test_window_scrapes_offset_slice_in_order() {
        let mut source = FakeSource::default()
            .page(CATEGORY, category_html(&titles(0..10), Some("/wiki/Category:Rare?from=2")))
            .page(
                "https://wiki.test/wiki/Category:Rare?from=2",
                category_html(&titles(10..20), Some("/wiki/Category:Rare?from=3")),
            );
        for title in titles(0..20) {
            source = source.article(&title);
        }

        let crawler = crawler(source, 10, 5, 1);
        let report = crawler.run().await.unwrap();

        // Listing stops once offset + limit identifiers are known
        assert_eq!(report.category_pages, 2);
        assert_eq!(report.collected, 15);
        let requested = crawler.source.requested();
        assert!(!requested.iter().any(|u| u.ends_with("from=3")));

        let expected: Vec<String> = titles(10..15)
            .iter()
            .map(|t| format!("{BASE}{}", t.replace(' ', "_")))
            .collect();
        assert_eq!(article_urls(&requested), expected);

        let articles: Vec<&str> = report.records.iter().map(SectionRecord::article).collect();
        assert_eq!(articles, titles(10..15));
    }

    #[tokio::test]
    async fn test_fetch_failure_skipped_and_sparse_dropped() {
        let listed = vec![
            "Good one".to_string(),
            "Missing page".to_string(),
            "Sparse page".to_string(),
        ];
        let source = FakeSource::default()
            .page(CATEGORY, category_html(&listed, None))
            .article("Good one")
            .page(
                &format!("{BASE}Sparse_page"),
                "<h2>Causes</h2><p>Only one section.</p>".to_string(),
            );

        let report = crawler(source, 0, 10, 1).run().await.unwrap();
        assert_eq!(report.attempted, 3);
        assert_eq!(report.fetch_failures, 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].article(), "Good one");
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_timed_out_article_counted_as_failure() {
        let mut source = FakeSource::default()
            .page(CATEGORY, category_html(&titles(0..3), None))
            .timing_out("Disease 01");
        for title in titles(0..3) {
            source = source.article(&title);
        }
        let (tx, mut rx) = mpsc::channel(16);

        let report = crawler(source, 0, 3, 1).with_events(tx).run().await.unwrap();
        assert_eq!(report.attempted, 3);
        assert_eq!(report.fetch_failures, 1);
        assert!(!report.cancelled);
        let articles: Vec<&str> = report.records.iter().map(SectionRecord::article).collect();
        assert_eq!(articles, vec!["Disease 00", "Disease 02"]);

        let mut failed = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let CrawlEvent::Article {
                title,
                outcome: ArticleOutcome::FetchFailed(reason),
                ..
            } = event
            {
                failed.push((title, reason));
            }
        }
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "Disease 01");
        assert!(failed[0].1.contains("timed out"));
    }

    #[tokio::test]
    async fn test_cancel_mid_window_keeps_gathered_records() {
        let token = CancelToken::new();
        let mut source = FakeSource::default()
            .page(CATEGORY, category_html(&titles(0..4), None))
            .cancelling_on("Disease 00", token.clone());
        for title in titles(0..4) {
            source = source.article(&title);
        }
        let (tx, mut rx) = mpsc::channel(16);

        let crawler = crawler(source, 0, 4, 1)
            .with_events(tx)
            .with_cancel_token(token);
        let report = crawler.run().await.unwrap();

        // The article in flight when cancellation arrived is still kept
        assert!(report.cancelled);
        assert_eq!(report.attempted, 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].article(), "Disease 00");
        assert_eq!(article_urls(&crawler.source.requested()).len(), 1);

        let mut outcomes = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let CrawlEvent::Article { outcome, .. } = event {
                outcomes.push(outcome);
            }
        }
        assert_eq!(
            outcomes,
            vec![
                ArticleOutcome::Kept(2),
                ArticleOutcome::Cancelled,
                ArticleOutcome::Cancelled,
                ArticleOutcome::Cancelled,
            ]
        );
    }

    #[tokio::test]
    async fn test_category_failure_still_completes() {
        let report = crawler(FakeSource::default(), 0, 10, 1).run().await.unwrap();
        assert_eq!(report.category_pages, 0);
        assert_eq!(report.attempted, 0);
        assert!(report.records.is_empty());
    }

    #[tokio::test]
    async fn test_parallel_workers_preserve_order() {
        let mut source =
            FakeSource::default().page(CATEGORY, category_html(&titles(0..12), None));
        for title in titles(0..12) {
            source = source.article(&title);
        }

        let report = crawler(source, 0, 12, 4).run().await.unwrap();
        let articles: Vec<&str> = report.records.iter().map(SectionRecord::article).collect();
        assert_eq!(articles, titles(0..12));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let source = FakeSource::default().page(CATEGORY, category_html(&titles(0..3), None));
        let token = CancelToken::new();
        token.cancel();

        let crawler = crawler(source, 0, 10, 1).with_cancel_token(token);
        let report = crawler.run().await.unwrap();
        assert!(report.cancelled);
        assert!(crawler.source.requested().is_empty());
    }

    #[tokio::test]
    async fn test_progress_events() {
        let source = FakeSource::default()
            .page(CATEGORY, category_html(&titles(0..1), None))
            .article(&titles(0..1)[0]);
        let (tx, mut rx) = mpsc::channel(16);

        let report = crawler(source, 0, 10, 1).with_events(tx).run().await.unwrap();
        assert_eq!(report.records.len(), 1);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                CrawlEvent::CategoryPage { page: 1, collected: 1 },
                CrawlEvent::ListingComplete { collected: 1, window: 1 },
                CrawlEvent::Article {
                    index: 1,
                    total: 1,
                    title: "Disease 00".to_string(),
                    outcome: ArticleOutcome::Kept(2),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_scrape_single_propagates_fetch_error() {
        let crawler = crawler(FakeSource::default().article("Gout"), 0, 1, 1);
        let record = crawler.scrape_single("Gout").await.unwrap().unwrap();
        assert_eq!(record.get("Diagnosis"), Some("Diagnosed via Z."));
        assert!(crawler.scrape_single("Absent").await.is_err());
    }

    #[tokio::test]
    async fn test_scrape_single_sparse_article_is_not_an_error() {
        let source = FakeSource::default().page(
            &format!("{BASE}Stub"),
            "<h2>Causes</h2><p>Only one section.</p>".to_string(),
        );
        let crawler = crawler(source, 0, 1, 1);
        let record = crawler.scrape_single("Stub").await.unwrap();
        assert!(record.is_none());
    }
}
