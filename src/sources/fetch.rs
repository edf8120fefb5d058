use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::ScrapeError;

/// Page download seam. Sources only ever need the body of a GET.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn get_text(&self, url: &str, referer: &str) -> Result<String, ScrapeError>;
}

/// reqwest-backed fetcher: browser-like User-Agent, bounded timeout,
/// a `Referer` on every request.
pub struct HttpFetcher {
    source: String,
    client: Client,
    slow_warn: Duration,
}

impl HttpFetcher {
    pub fn new(source: &str, user_agent: &str, timeout: Duration, slow_warn: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ScrapeError::Transport(e.to_string()))?;
        Ok(Self { source: source.to_string(), client, slow_warn })
    }

    fn warn_if_slow(&self, start: Instant, url: &str) {
        let elapsed = start.elapsed();
        if elapsed > self.slow_warn {
            warn!(source = %self.source, %url, ?elapsed, "slow fetch");
        }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get_text(&self, url: &str, referer: &str) -> Result<String, ScrapeError> {
        let start = Instant::now();
        let res = async {
            let resp = self.client.get(url).header(REFERER, referer).send().await?;
            let body = resp.error_for_status()?.text().await?;
            Ok::<_, ScrapeError>(body)
        }
        .await;
        self.warn_if_slow(start, url);
        if let Ok(body) = &res {
            debug!(source = %self.source, %url, bytes = body.len(), "fetched");
        }
        res
    }
}
