use crate::types::{AggregatorError, Category, FeedDescriptor, Result};
use std::path::Path;
use tracing::{debug, info};

/// Fixed, ordered list of feeds polled on every run.
#[derive(Debug, Clone)]
pub struct FeedRegistry {
    feeds: Vec<FeedDescriptor>,
}

impl FeedRegistry {
    pub fn new(feeds: Vec<FeedDescriptor>) -> Self {
        Self { feeds }
    }

    /// Parse a JSON array of `{name, url, category, language}` objects.
    pub fn from_json(json: &str) -> Result<Self> {
        let feeds: Vec<FeedDescriptor> = serde_json::from_str(json)?;
        for feed in &feeds {
            url::Url::parse(&feed.url)?;
            if feed.name.trim().is_empty() {
                return Err(AggregatorError::General(format!(
                    "Feed with URL {} has an empty name",
                    feed.url
                )));
            }
        }
        debug!("Loaded {} feed descriptors from JSON", feeds.len());
        Ok(Self { feeds })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let registry = Self::from_json(&json)?;
        info!("Loaded feed registry from {}", path.display());
        Ok(registry)
    }

    pub fn feeds(&self) -> &[FeedDescriptor] {
        &self.feeds
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// Distinct categories in registry order, used to build filter controls.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::new();
        for feed in &self.feeds {
            if !categories.contains(&feed.category) {
                categories.push(feed.category.clone());
            }
        }
        categories
    }
}

impl Default for FeedRegistry {
    fn default() -> Self {
        Self::new(vec![
            FeedDescriptor::new(
                "CERT-FR - Alertes",
                "https://www.cert.ssi.gouv.fr/feed/",
                Category::Cert,
                "fr",
            ),
            FeedDescriptor::new(
                "ANSSI - Actualités",
                "https://cyber.gouv.fr/actualites",
                Category::Anssi,
                "fr",
            ),
        ])
    }
}
