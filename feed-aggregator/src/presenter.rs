use crate::types::{Article, Category, Result};
use std::fmt;
use tracing::debug;

/// View model for one rendered article.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub link: String,
    pub description: String,
    pub source_name: String,
    pub published: String,
    pub category: Category,
    pub label: String,
}

impl From<&Article> for Card {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            link: article.link.clone(),
            description: article.description.clone(),
            source_name: article.source_name.clone(),
            published: article.published.clone(),
            category: article.category.clone(),
            label: article.category.label().to_string(),
        }
    }
}

/// Active category filter. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Only(Category),
}

impl Filter {
    pub fn parse(value: &str) -> Self {
        match value {
            "all" => Filter::All,
            tag => Filter::Only(Category::from(tag)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Filter::All => "all",
            Filter::Only(category) => category.as_str(),
        }
    }

    /// Match against the category attribute stored on a rendered card.
    pub fn matches(&self, card_category: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(category) => category.as_str() == card_category,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering target for the article list and its filter controls.
pub trait DisplaySurface: Send {
    fn show_loading(&mut self) -> Result<()>;

    fn show_error(&mut self) -> Result<()>;

    fn show_empty(&mut self) -> Result<()>;

    /// Replace the current content with these cards, all visible.
    fn show_cards(&mut self, cards: &[Card]) -> Result<()>;

    /// Category attribute of each rendered card, in display order.
    fn card_categories(&self) -> Vec<String>;

    fn set_card_visible(&mut self, index: usize, visible: bool) -> Result<()>;

    /// Mark the control for `filter` active and every other control inactive.
    fn activate_control(&mut self, filter: &str) -> Result<()>;
}

pub struct Presenter<S> {
    surface: S,
    filter: Filter,
    articles: Vec<Article>,
}

impl<S: DisplaySurface> Presenter<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            filter: Filter::All,
            articles: Vec::new(),
        }
    }

    pub fn show_loading(&mut self) -> Result<()> {
        self.surface.show_loading()
    }

    pub fn show_error(&mut self) -> Result<()> {
        self.surface.show_error()
    }

    /// Render the list, then re-apply the active filter to the new cards.
    pub fn render(&mut self, articles: Vec<Article>) -> Result<()> {
        self.articles = articles;

        if self.articles.is_empty() {
            debug!("No articles to render");
            return self.surface.show_empty();
        }

        let cards: Vec<Card> = self.articles.iter().map(Card::from).collect();
        self.surface.show_cards(&cards)?;
        self.apply_filter()?;
        Ok(())
    }

    /// Switch the active filter without re-fetching. Returns the number of
    /// cards left visible.
    pub fn select_filter(&mut self, filter: Filter) -> Result<usize> {
        self.surface.activate_control(filter.as_str())?;
        self.filter = filter;
        self.apply_filter()
    }

    fn apply_filter(&mut self) -> Result<usize> {
        let categories = self.surface.card_categories();
        let mut visible = 0;
        for (index, category) in categories.iter().enumerate() {
            let show = self.filter.matches(category);
            self.surface.set_card_visible(index, show)?;
            if show {
                visible += 1;
            }
        }
        debug!("Filter {} shows {}/{} cards", self.filter, visible, categories.len());
        Ok(visible)
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}
