pub mod types;
pub mod registry;
pub mod normalize;
pub mod fallback;
pub mod parser;
pub mod fetcher;
pub mod presenter;
pub mod surface;
pub mod aggregator;

pub use types::*;
pub use registry::FeedRegistry;
pub use fallback::fallback_articles;
pub use parser::FeedParser;
pub use fetcher::{decode_envelope, DirectRetrieval, Fetcher, ProxyRetrieval, RetrievalService};
pub use presenter::{Card, DisplaySurface, Filter, Presenter};
pub use surface::HtmlSurface;
pub use aggregator::{merge_articles, FeedAggregator};
