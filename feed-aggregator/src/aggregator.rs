use crate::fetcher::{Fetcher, RetrievalService};
use crate::parser::FeedParser;
use crate::presenter::{DisplaySurface, Filter, Presenter};
use crate::registry::FeedRegistry;
use crate::types::{
    AggregatorError, Article, PipelineConfig, PipelineReport, Result, RunOutcome,
};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Owns the registry, the fetcher and the presenter for one display surface.
pub struct FeedAggregator<R, S> {
    registry: FeedRegistry,
    fetcher: Fetcher<R>,
    presenter: Mutex<Presenter<S>>,
    config: PipelineConfig,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when a run ends, including on early return.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<R, S> FeedAggregator<R, S>
where
    R: RetrievalService,
    S: DisplaySurface,
{
    pub fn new(registry: FeedRegistry, retrieval: R, surface: S, config: PipelineConfig) -> Self {
        let parser = FeedParser::new(config.max_items_per_feed);
        Self {
            registry,
            fetcher: Fetcher::new(retrieval, parser),
            presenter: Mutex::new(Presenter::new(surface)),
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Fetch, merge and render every feed. A run that starts while another
    /// is still in flight is skipped.
    pub async fn run_pipeline(&self) -> Result<RunOutcome> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Pipeline run already in flight, skipping");
            return Ok(RunOutcome::Skipped);
        }
        let _guard = RunGuard(&self.in_flight);

        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id);
        // Errors past this point render the error state, not partial content
        async move {
            match self.run_once(run_id).await {
                Ok(report) => Ok(RunOutcome::Completed(report)),
                Err(e) => {
                    error!("Error loading feeds: {}", e);
                    if let Err(surface_err) = self.presenter.lock().await.show_error() {
                        warn!("Could not show error state: {}", surface_err);
                    }
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_once(&self, run_id: Uuid) -> Result<PipelineReport> {
        let started_at = Utc::now();
        // Surface errors abort the run before any network traffic
        self.presenter.lock().await.show_loading()?;

        info!("Fetching {} feeds", self.registry.len());
        let feeds = self.fetcher.fetch_all(self.registry.feeds()).await;

        // Registry order first, then item order within each feed
        let articles = merge_articles(
            feeds.iter().map(|f| f.outcome.articles()),
            self.config.max_articles,
        );
        let rendered = articles.len();

        self.presenter.lock().await.render(articles)?;

        let report = PipelineReport {
            run_id,
            started_at,
            feeds,
            rendered,
        };
        info!(
            "Rendered {} articles ({} live feeds, {} fallback feeds)",
            report.rendered,
            report.live_feeds(),
            report.fallback_feeds()
        );
        Ok(report)
    }

    /// Change the active category filter on the current cards.
    pub async fn select_filter(&self, filter: Filter) -> Result<usize> {
        self.presenter.lock().await.select_filter(filter)
    }

    pub async fn articles(&self) -> Vec<Article> {
        self.presenter.lock().await.articles().to_vec()
    }

    /// Read the display surface under the presenter lock.
    pub async fn with_surface<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let presenter = self.presenter.lock().await;
        f(presenter.surface())
    }

    pub fn registry(&self) -> &FeedRegistry {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl<R, S> FeedAggregator<R, S>
where
    R: RetrievalService + 'static,
    S: DisplaySurface + 'static,
{
    /// Run now and then on every tick of `period`. Each tick spawns its own
    /// run, so a slow run never delays the timer.
    pub fn spawn_refresh(self: Arc<Self>, period: Duration) -> Result<JoinHandle<()>> {
        if period.is_zero() {
            return Err(AggregatorError::InvalidConfig(
                "refresh interval must be non-zero".to_string(),
            ));
        }

        Ok(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                // The first tick completes immediately
                ticker.tick().await;
                let aggregator = Arc::clone(&self);
                tokio::spawn(async move {
                    if let Err(e) = aggregator.run_pipeline().await {
                        error!("Scheduled run failed: {}", e);
                    }
                });
            }
        }))
    }

    pub fn spawn_default_refresh(self: Arc<Self>) -> Result<JoinHandle<()>> {
        let period = self.config.refresh_interval;
        self.spawn_refresh(period)
    }
}

/// Concatenate per-feed articles in registry order and keep the first `max`.
pub fn merge_articles<'a, I>(per_feed: I, max: usize) -> Vec<Article>
where
    I: IntoIterator<Item = &'a [Article]>,
{
    per_feed
        .into_iter()
        .flat_map(|articles| articles.iter().cloned())
        .take(max)
        .collect()
}
