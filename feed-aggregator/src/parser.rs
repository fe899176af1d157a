use crate::fallback::fallback_articles;
use crate::normalize::{
    clean_description, clean_title, format_timestamp, DEFAULT_LINK, UNKNOWN_DATE, UNTITLED,
};
use crate::types::{AggregatorError, Article, FeedDescriptor, FeedOutcome, Result};
use chrono::Utc;
use feed_rs::parser;
use tracing::{debug, warn};

pub struct FeedParser {
    max_items: usize,
}

impl FeedParser {
    pub fn new(max_items: usize) -> Self {
        Self { max_items }
    }

    /// Parse RSS or Atom markup into at most `max_items` articles, keeping
    /// document order.
    pub fn parse_articles(&self, content: &str, feed: &FeedDescriptor) -> Result<Vec<Article>> {
        debug!("Parsing {} ({} bytes)", feed.name, content.len());

        let parsed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let articles: Vec<Article> = parsed
            .entries
            .into_iter()
            .take(self.max_items)
            .map(|entry| Self::to_article(entry, feed))
            .collect();

        debug!("Parsed {} articles from {}", articles.len(), feed.name);
        Ok(articles)
    }

    /// Live articles, or the whole fallback set if the markup is unusable.
    pub fn parse_or_fallback(&self, content: &str, feed: &FeedDescriptor) -> FeedOutcome {
        match self.parse_articles(content, feed) {
            Ok(articles) => FeedOutcome::Live(articles),
            Err(e) => {
                warn!("Using fallback articles for {}: {}", feed.name, e);
                FeedOutcome::Fallback {
                    articles: fallback_articles(feed, Utc::now()),
                    reason: e.to_string(),
                }
            }
        }
    }

    fn to_article(entry: feed_rs::model::Entry, feed: &FeedDescriptor) -> Article {
        let title = entry
            .title
            .map(|t| t.content)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        let link = entry
            .links
            .into_iter()
            .map(|l| l.href)
            .find(|href| !href.is_empty())
            .unwrap_or_else(|| DEFAULT_LINK.to_string());

        // Atom entries may only carry a content body
        let description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        let published = entry
            .published
            .or(entry.updated)
            .map(|dt| format_timestamp(&dt))
            .unwrap_or_else(|| UNKNOWN_DATE.to_string());

        Article {
            title: clean_title(&title),
            link,
            description: clean_description(&description),
            published,
            source_name: feed.name.clone(),
            category: feed.category.clone(),
        }
    }
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new(4)
    }
}
