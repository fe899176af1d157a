//! In-memory HTML rendering of the article container and its filter
//! controls.

use crate::presenter::{Card, DisplaySurface};
use crate::types::{AggregatorError, Category, Result};

pub const DEFAULT_CONTAINER_ID: &str = "rss-articles";

const LOADING_MESSAGE: &str = "Loading news...";
const ERROR_MESSAGE: &str = "Unable to load news right now.";
const EMPTY_MESSAGE: &str = "No articles available.";

#[derive(Debug, Clone, PartialEq)]
pub struct FilterControl {
    pub filter: String,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCard {
    pub card: Card,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContainerState {
    Blank,
    Loading,
    Error,
    Empty,
    Cards(Vec<RenderedCard>),
}

#[derive(Debug)]
struct Container {
    id: String,
    state: ContainerState,
}

#[derive(Debug)]
pub struct HtmlSurface {
    container: Option<Container>,
    controls: Vec<FilterControl>,
}

impl HtmlSurface {
    /// A surface with an "all" control followed by one control per category.
    pub fn new(container_id: &str, categories: &[Category]) -> Self {
        let mut controls = vec![FilterControl {
            filter: "all".to_string(),
            label: "All".to_string(),
            active: true,
        }];
        controls.extend(categories.iter().map(|c| FilterControl {
            filter: c.as_str().to_string(),
            label: c.label().to_string(),
            active: false,
        }));

        Self {
            container: Some(Container {
                id: container_id.to_string(),
                state: ContainerState::Blank,
            }),
            controls,
        }
    }

    /// A page where the article container is missing.
    pub fn without_container() -> Self {
        Self {
            container: None,
            controls: Vec::new(),
        }
    }

    pub fn state(&self) -> Option<&ContainerState> {
        self.container.as_ref().map(|c| &c.state)
    }

    pub fn controls(&self) -> &[FilterControl] {
        &self.controls
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.controls.iter().find(|c| c.active).map(|c| c.filter.as_str())
    }

    pub fn visible_cards(&self) -> Vec<&Card> {
        match self.state() {
            Some(ContainerState::Cards(cards)) => {
                cards.iter().filter(|c| c.visible).map(|c| &c.card).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn to_html(&self) -> String {
        let mut buf = String::new();

        if !self.controls.is_empty() {
            buf.push_str("<div class=\"rss-filters\">\n");
            for control in &self.controls {
                buf.push_str(&format!(
                    "  <button class=\"filter-btn{}\" data-filter=\"{}\">{}</button>\n",
                    if control.active { " active" } else { "" },
                    escape_html(&control.filter),
                    escape_html(&control.label),
                ));
            }
            buf.push_str("</div>\n");
        }

        let Some(container) = &self.container else {
            return buf;
        };

        buf.push_str(&format!("<div id=\"{}\">\n", escape_html(&container.id)));
        match &container.state {
            ContainerState::Blank => {}
            ContainerState::Loading => {
                buf.push_str(&format!("<div class=\"loading\">{}</div>\n", LOADING_MESSAGE))
            }
            ContainerState::Error => {
                buf.push_str(&format!("<div class=\"error\">{}</div>\n", ERROR_MESSAGE))
            }
            ContainerState::Empty => {
                buf.push_str(&format!("<div class=\"no-articles\">{}</div>\n", EMPTY_MESSAGE))
            }
            ContainerState::Cards(cards) => {
                for rendered in cards {
                    buf.push_str(&render_card(rendered));
                }
            }
        }
        buf.push_str("</div>\n");
        buf
    }

    fn container_mut(&mut self) -> Result<&mut Container> {
        self.container
            .as_mut()
            .ok_or_else(|| {
                AggregatorError::SurfaceUnavailable("article container not found".to_string())
            })
    }
}

impl DisplaySurface for HtmlSurface {
    fn show_loading(&mut self) -> Result<()> {
        self.container_mut()?.state = ContainerState::Loading;
        Ok(())
    }

    fn show_error(&mut self) -> Result<()> {
        self.container_mut()?.state = ContainerState::Error;
        Ok(())
    }

    fn show_empty(&mut self) -> Result<()> {
        self.container_mut()?.state = ContainerState::Empty;
        Ok(())
    }

    fn show_cards(&mut self, cards: &[Card]) -> Result<()> {
        let rendered = cards
            .iter()
            .map(|card| RenderedCard {
                card: card.clone(),
                visible: true,
            })
            .collect();
        self.container_mut()?.state = ContainerState::Cards(rendered);
        Ok(())
    }

    fn card_categories(&self) -> Vec<String> {
        match self.state() {
            Some(ContainerState::Cards(cards)) => cards
                .iter()
                .map(|c| c.card.category.as_str().to_string())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn set_card_visible(&mut self, index: usize, visible: bool) -> Result<()> {
        if let ContainerState::Cards(cards) = &mut self.container_mut()?.state {
            if let Some(card) = cards.get_mut(index) {
                card.visible = visible;
            }
        }
        Ok(())
    }

    fn activate_control(&mut self, filter: &str) -> Result<()> {
        self.container_mut()?;

        // A category without a control gets one so exactly one stays active
        if !self.controls.iter().any(|c| c.filter == filter) {
            let category = Category::from(filter);
            self.controls.push(FilterControl {
                filter: filter.to_string(),
                label: category.label().to_string(),
                active: false,
            });
        }

        for control in &mut self.controls {
            control.active = control.filter == filter;
        }
        Ok(())
    }
}

fn render_card(rendered: &RenderedCard) -> String {
    let card = &rendered.card;
    let category = escape_html(card.category.as_str());
    let style = if rendered.visible { "" } else { " style=\"display: none\"" };

    format!(
        "<div class=\"article-card\" data-type=\"{category}\"{style}>\n\
         \x20 <a href=\"{link}\" target=\"_blank\" rel=\"noopener noreferrer\" \
         class=\"article-title\">{title}</a>\n\
         \x20 <p class=\"article-description\">{description}</p>\n\
         \x20 <div class=\"article-meta\">\n\
         \x20   <span class=\"article-source\">{source}</span>\n\
         \x20   <span class=\"article-date\">{date}</span>\n\
         \x20 </div>\n\
         \x20 <div class=\"article-tags\">\n\
         \x20   <span class=\"article-tag {category}\">{label}</span>\n\
         \x20 </div>\n\
         </div>\n",
        link = escape_html(&card.link),
        title = escape_html(&card.title),
        description = escape_html(&card.description),
        source = escape_html(&card.source_name),
        date = escape_html(&card.published),
        label = escape_html(&card.label),
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
