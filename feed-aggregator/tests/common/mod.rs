#![allow(dead_code)]

use async_trait::async_trait;
use feed_aggregator::{AggregatorError, Category, FeedDescriptor, RetrievalService, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

enum MockResponse {
    Body(String),
    Failure(String),
}

/// In-memory retrieval service keyed by feed URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct MockRetrieval {
    responses: HashMap<String, MockResponse>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl MockRetrieval {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<String>) -> Self {
        self.responses.insert(url.to_string(), MockResponse::Body(body.into()));
        self
    }

    pub fn with_failure(mut self, url: &str, message: &str) -> Self {
        self.responses
            .insert(url.to_string(), MockResponse::Failure(message.to_string()));
        self
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RetrievalService for MockRetrieval {
    async fn retrieve(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        match self.responses.get(url) {
            Some(MockResponse::Body(body)) => Ok(body.clone()),
            Some(MockResponse::Failure(message)) => Err(AggregatorError::General(message.clone())),
            None => Err(AggregatorError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

pub fn descriptor(name: &str, url: &str, category: &str) -> FeedDescriptor {
    FeedDescriptor::new(name, url, Category::from(category), "fr")
}

pub struct TestItem<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub description: &'a str,
    pub pub_date: &'a str,
}

pub fn rss_document(items: &[TestItem]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rss version=\"2.0\"><channel>\
         <title>Test feed</title><link>https://example.com/</link>\
         <description>Test feed</description>",
    );
    for item in items {
        xml.push_str("<item>");
        xml.push_str(&format!("<title>{}</title>", item.title));
        xml.push_str(&format!("<link>{}</link>", item.link));
        xml.push_str(&format!("<description><![CDATA[{}]]></description>", item.description));
        if !item.pub_date.is_empty() {
            xml.push_str(&format!("<pubDate>{}</pubDate>", item.pub_date));
        }
        xml.push_str("</item>");
    }
    xml.push_str("</channel></rss>");
    xml
}

/// A feed with `count` items titled "`prefix` 1", "`prefix` 2", ...
pub fn numbered_feed(prefix: &str, count: usize) -> String {
    let titles: Vec<String> = (1..=count).map(|i| format!("{} {}", prefix, i)).collect();
    let links: Vec<String> = (1..=count)
        .map(|i| format!("https://example.com/{}/{}", prefix.to_lowercase(), i))
        .collect();
    let items: Vec<TestItem> = titles
        .iter()
        .zip(&links)
        .map(|(title, link)| TestItem {
            title,
            link,
            description: "<p>Security bulletin</p>",
            pub_date: "Wed, 15 Jan 2025 12:00:00 GMT",
        })
        .collect();
    rss_document(&items)
}
