use crate::fallback::fallback_articles;
use crate::parser::FeedParser;
use crate::types::{
    AggregatorError, FeedDescriptor, FeedOutcome, FeedReport, FetchConfig, Result,
};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::Utc;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Something that can hand back the raw markup behind a feed URL.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    async fn retrieve(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl<T: RetrievalService + ?Sized> RetrievalService for Box<T> {
    async fn retrieve(&self, url: &str) -> Result<String> {
        (**self).retrieve(url).await
    }
}

#[async_trait]
impl<T: RetrievalService + ?Sized> RetrievalService for Arc<T> {
    async fn retrieve(&self, url: &str) -> Result<String> {
        (**self).retrieve(url).await
    }
}

struct HttpTransport {
    client: Client,
    config: FetchConfig,
}

impl HttpTransport {
    fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Ok(body) => return Ok(body),
                // Retrying will not make the body smaller
                Err(e @ AggregatorError::FeedTooLarge { .. }) => return Err(e),
                Err(e) => {
                    if attempt >= self.config.max_retries {
                        return Err(e);
                    }
                    let Some(delay) = backoff.next_backoff() else {
                        return Err(e);
                    };
                    attempt += 1;
                    warn!(
                        "Attempt {} failed for {}, retrying in {:?}: {}",
                        attempt, url, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let mut response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AggregatorError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let limit_mb = self.config.max_feed_size_mb;
        let limit_bytes = limit_mb * 1024 * 1024;

        // Reject early when the server announces the size
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit_bytes {
                return Err(AggregatorError::FeedTooLarge { limit_mb });
            }
        }

        // Chunked bodies carry no length, so enforce the limit while reading
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit_bytes {
                return Err(AggregatorError::FeedTooLarge { limit_mb });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[derive(Debug, Deserialize)]
struct ProxyEnvelope {
    contents: Option<String>,
}

/// Extract the feed markup from a proxy answer of the form
/// `{"contents": "..."}`.
pub fn decode_envelope(body: &str) -> Result<String> {
    let envelope: ProxyEnvelope = serde_json::from_str(body)
        .map_err(|e| AggregatorError::MalformedResponse(e.to_string()))?;
    envelope.contents.ok_or_else(|| {
        AggregatorError::MalformedResponse("missing `contents` field".to_string())
    })
}

/// Retrieves feeds through a pass-through proxy that answers
/// `{"contents": "..."}`, for sources that refuse cross-origin requests.
pub struct ProxyRetrieval {
    transport: HttpTransport,
    proxy_url: Url,
}

impl ProxyRetrieval {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let proxy_url = Url::parse(&config.proxy_url)?;
        Ok(Self {
            transport: HttpTransport::new(config)?,
            proxy_url,
        })
    }

    pub fn request_url(&self, feed_url: &str) -> Url {
        let mut url = self.proxy_url.clone();
        url.query_pairs_mut().append_pair("url", feed_url);
        url
    }
}

#[async_trait]
impl RetrievalService for ProxyRetrieval {
    async fn retrieve(&self, url: &str) -> Result<String> {
        let body = self.transport.get_text(self.request_url(url).as_str()).await?;
        decode_envelope(&body)
    }
}

/// Plain HTTP retrieval for contexts without cross-origin restrictions.
pub struct DirectRetrieval {
    transport: HttpTransport,
}

impl DirectRetrieval {
    pub fn new(config: FetchConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }
}

#[async_trait]
impl RetrievalService for DirectRetrieval {
    async fn retrieve(&self, url: &str) -> Result<String> {
        self.transport.get_text(url).await
    }
}

pub struct Fetcher<R> {
    retrieval: R,
    parser: FeedParser,
}

impl<R: RetrievalService> Fetcher<R> {
    pub fn new(retrieval: R, parser: FeedParser) -> Self {
        Self { retrieval, parser }
    }

    /// Never fails: any retrieval or parse error yields the fallback set.
    pub async fn fetch_feed(&self, feed: &FeedDescriptor) -> FeedOutcome {
        match self.retrieval.retrieve(&feed.url).await {
            // Parse failures are handled by the parser's own fallback
            Ok(content) => {
                info!("Fetched {} ({} bytes)", feed.name, content.len());
                self.parser.parse_or_fallback(&content, feed)
            }
            Err(e) => {
                warn!("Error fetching {}: {}", feed.name, e);
                FeedOutcome::Fallback {
                    articles: fallback_articles(feed, Utc::now()),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Fetch every feed concurrently and report in input order.
    pub async fn fetch_all(&self, feeds: &[FeedDescriptor]) -> Vec<FeedReport> {
        let tasks = feeds.iter().map(|feed| async move {
            let start = Instant::now();
            let outcome = self.fetch_feed(feed).await;
            FeedReport {
                feed_name: feed.name.clone(),
                outcome,
                response_time_ms: start.elapsed().as_millis() as u64,
            }
        });
        join_all(tasks).await
    }
}
