use anyhow::Context;
use clap::Parser;
use feed_aggregator::surface::DEFAULT_CONTAINER_ID;
use feed_aggregator::{
    DirectRetrieval, FeedAggregator, FeedRegistry, FetchConfig, Filter, HtmlSurface,
    PipelineConfig, ProxyRetrieval, RetrievalService, RunOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "feed-aggregator", about = "Security news feed aggregator")]
struct Args {
    /// Run the pipeline once and print the rendered HTML
    #[arg(long)]
    once: bool,

    /// JSON file with the feed registry (defaults to CERT-FR and ANSSI)
    #[arg(long)]
    feeds: Option<PathBuf>,

    /// Pass-through proxy used to retrieve feeds
    #[arg(long)]
    proxy_url: Option<String>,

    /// Fetch feeds directly instead of through the proxy
    #[arg(long)]
    direct: bool,

    /// Category to show after rendering ("all" shows everything)
    #[arg(long, default_value = "all")]
    filter: String,

    /// Seconds between refreshes, at least 1
    #[arg(long, default_value_t = 3600, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: u64,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    #[arg(long, default_value_t = 1)]
    max_retries: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let registry = match &args.feeds {
        Some(path) => FeedRegistry::from_file(path)
            .with_context(|| format!("loading feed registry from {}", path.display()))?,
        None => FeedRegistry::default(),
    };

    let mut fetch_config = FetchConfig {
        timeout_seconds: args.timeout_secs,
        max_retries: args.max_retries,
        ..FetchConfig::default()
    };
    if let Some(proxy_url) = args.proxy_url.clone() {
        fetch_config.proxy_url = proxy_url;
    }

    let retrieval: Box<dyn RetrievalService> = if args.direct {
        Box::new(DirectRetrieval::new(fetch_config)?)
    } else {
        Box::new(ProxyRetrieval::new(fetch_config)?)
    };

    let pipeline_config = PipelineConfig {
        refresh_interval: Duration::from_secs(args.interval_secs),
        ..PipelineConfig::default()
    };

    let surface = HtmlSurface::new(DEFAULT_CONTAINER_ID, &registry.categories());
    let aggregator = Arc::new(FeedAggregator::new(registry, retrieval, surface, pipeline_config));
    let filter = Filter::parse(&args.filter);

    if args.once {
        if let RunOutcome::Completed(report) = aggregator.run_pipeline().await? {
            info!("Run {} rendered {} articles", report.run_id, report.rendered);
        }
        aggregator.select_filter(filter).await?;
        let html = aggregator.with_surface(|s| s.to_html()).await;
        println!("{}", html);
        return Ok(());
    }

    info!("Refreshing feeds every {}s", args.interval_secs);
    let refresh = Arc::clone(&aggregator).spawn_default_refresh()?;

    if filter != Filter::All {
        // Kept across refreshes and re-applied after each render
        if let Err(e) = aggregator.select_filter(filter).await {
            warn!("Could not apply filter: {}", e);
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    refresh.abort();
    Ok(())
}
