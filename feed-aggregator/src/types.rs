use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Classification tag shared by feed descriptors, article badges and filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Cert,
    Anssi,
    Cnil,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Cert => "cert",
            Category::Anssi => "anssi",
            Category::Cnil => "cnil",
            Category::Other(tag) => tag,
        }
    }

    /// Human-readable badge label. Unmapped tags display as themselves.
    pub fn label(&self) -> &str {
        match self {
            Category::Cert => "CERT-FR",
            Category::Anssi => "ANSSI",
            Category::Cnil => "CNIL",
            Category::Other(tag) => tag,
        }
    }
}

impl From<&str> for Category {
    fn from(tag: &str) -> Self {
        match tag {
            "cert" => Category::Cert,
            "anssi" => Category::Anssi,
            "cnil" => Category::Cnil,
            other => Category::Other(other.to_string()),
        }
    }
}

impl From<String> for Category {
    fn from(tag: String) -> Self {
        Category::from(tag.as_str())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote news source to poll. The registry order is the display priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedDescriptor {
    pub name: String,
    pub url: String,
    pub category: Category,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "fr".to_string()
}

impl FeedDescriptor {
    pub fn new(name: &str, url: &str, category: Category, language: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            category,
            language: language.to_string(),
        }
    }
}

/// A normalized, display-ready news item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published: String,
    pub source_name: String,
    pub category: Category,
}

/// Result of fetching one feed. Both variants carry displayable articles.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutcome {
    Live(Vec<Article>),
    Fallback { articles: Vec<Article>, reason: String },
}

impl FeedOutcome {
    pub fn articles(&self) -> &[Article] {
        match self {
            FeedOutcome::Live(articles) => articles,
            FeedOutcome::Fallback { articles, .. } => articles,
        }
    }

    pub fn into_articles(self) -> Vec<Article> {
        match self {
            FeedOutcome::Live(articles) => articles,
            FeedOutcome::Fallback { articles, .. } => articles,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FeedOutcome::Fallback { .. })
    }
}

#[derive(Debug, Clone)]
pub struct FeedReport {
    pub feed_name: String,
    pub outcome: FeedOutcome,
    pub response_time_ms: u64,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub feeds: Vec<FeedReport>,
    pub rendered: usize,
}

impl PipelineReport {
    pub fn live_feeds(&self) -> usize {
        self.feeds.iter().filter(|f| !f.outcome.is_fallback()).count()
    }

    pub fn fallback_feeds(&self) -> usize {
        self.feeds.iter().filter(|f| f.outcome.is_fallback()).count()
    }
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(PipelineReport),
    /// Another run still owned the display surface.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub proxy_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            proxy_url: "https://api.allorigins.win/get".to_string(),
            user_agent: "Feed-Aggregator/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 1,
            retry_delay_seconds: 2,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_articles: usize,
    pub max_items_per_feed: usize,
    pub refresh_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_articles: 10,
            max_items_per_feed: 4,
            refresh_interval: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Malformed response from retrieval service: {0}")]
    MalformedResponse(String),

    #[error("Feed size exceeds limit of {limit_mb}MB")]
    FeedTooLarge { limit_mb: usize },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Display surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
