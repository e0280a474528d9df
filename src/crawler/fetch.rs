//! Page fetching for category listings and articles

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use reqwest::Client as ReqwestClient;
use std::future::Future;
use std::sync::Arc;
use tracing::{Instrument, debug, debug_span, instrument};
use url::Url;

use crate::crawler::CrawlerConfig;
use crate::crawler::error::CrawlError;

/// Anything that can return the HTML of a page
pub trait DocumentSource {
    /// Fetch the raw HTML at `url`
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String, CrawlError>> + Send;
}

/// HTTP fetcher with a request timeout, a descriptive user agent, and a
/// minimum spacing between requests to the same host
#[derive(Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
    limiter: Option<Arc<DefaultKeyedRateLimiter<String>>>,
}

impl HttpFetcher {
    /// Create a fetcher from crawler settings
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        // A zero interval yields no quota, which disables host spacing
        let limiter = Quota::with_period(config.host_interval())
            .map(|quota| Arc::new(RateLimiter::keyed(quota)));

        Ok(Self { client, limiter })
    }
}

impl DocumentSource for HttpFetcher {
    #[instrument(skip(self), fields(url = %url), level = "debug")]
    async fn fetch(&self, url: &Url) -> Result<String, CrawlError> {
        if let Some(limiter) = &self.limiter {
            let host = url.host_str().unwrap_or_default().to_string();
            limiter
                .until_key_ready(&host)
                .instrument(debug_span!("host_limiter"))
                .await;
        }

        debug!("Sending GET request");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| classify_error(e, url))
    }
}

fn classify_error(err: reqwest::Error, url: &Url) -> CrawlError {
    if err.is_timeout() {
        CrawlError::Timeout(url.to_string())
    } else {
        CrawlError::Http(err)
    }
}
