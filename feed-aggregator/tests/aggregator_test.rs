mod common;

use chrono::Utc;
use common::{descriptor, init_tracing, numbered_feed, MockRetrieval};
use feed_aggregator::surface::{ContainerState, DEFAULT_CONTAINER_ID};
use feed_aggregator::{
    fallback_articles, merge_articles, AggregatorError, Article, Category, FeedAggregator,
    FeedRegistry, Filter, HtmlSurface, PipelineConfig, RunOutcome,
};
use std::sync::Arc;
use std::time::Duration;

const FEED_A: &str = "https://a.example.com/feed";
const FEED_B: &str = "https://b.example.com/feed";
const FEED_C: &str = "https://c.example.com/feed";

fn three_feed_registry() -> FeedRegistry {
    FeedRegistry::new(vec![
        descriptor("Feed A", FEED_A, "cert"),
        descriptor("Feed B", FEED_B, "anssi"),
        descriptor("Feed C", FEED_C, "cnil"),
    ])
}

fn surface_for(registry: &FeedRegistry) -> HtmlSurface {
    HtmlSurface::new(DEFAULT_CONTAINER_ID, &registry.categories())
}

#[tokio::test]
async fn test_merge_caps_to_ten_in_registry_order() {
    init_tracing();

    let retrieval = MockRetrieval::new()
        .with_body(FEED_A, numbered_feed("A", 4))
        .with_body(FEED_B, numbered_feed("B", 4))
        .with_body(FEED_C, numbered_feed("C", 4));
    let registry = three_feed_registry();
    let surface = surface_for(&registry);
    let aggregator = FeedAggregator::new(registry, retrieval, surface, PipelineConfig::default());

    let report = match aggregator.run_pipeline().await.unwrap() {
        RunOutcome::Completed(report) => report,
        RunOutcome::Skipped => panic!("first run must not be skipped"),
    };

    let before_cap: usize = report.feeds.iter().map(|f| f.outcome.articles().len()).sum();
    assert_eq!(before_cap, 12);
    assert_eq!(report.rendered, 10);
    assert_eq!(report.live_feeds(), 3);

    let titles: Vec<String> = aggregator.articles().await.into_iter().map(|a| a.title).collect();
    assert_eq!(
        titles,
        vec!["A 1", "A 2", "A 3", "A 4", "B 1", "B 2", "B 3", "B 4", "C 1", "C 2"]
    );
}

#[test]
fn test_merge_articles_keeps_feed_order_before_capping() {
    let now = Utc::now();
    let cert = fallback_articles(&descriptor("CERT-FR", FEED_A, "cert"), now);
    let empty: Vec<Article> = Vec::new();
    let anssi = fallback_articles(&descriptor("ANSSI", FEED_B, "anssi"), now);

    let merged = merge_articles([cert.as_slice(), empty.as_slice(), anssi.as_slice()], 3);
    let sources: Vec<&str> = merged.iter().map(|a| a.source_name.as_str()).collect();
    assert_eq!(sources, vec!["CERT-FR", "CERT-FR", "ANSSI"]);

    assert!(merge_articles([empty.as_slice()], 10).is_empty());
}

#[tokio::test]
async fn test_failed_feeds_use_fallback_content() {
    init_tracing();

    let retrieval = MockRetrieval::new()
        .with_failure(FEED_A, "connection refused")
        .with_body(FEED_B, "<html>maintenance page</html>");
    let registry = three_feed_registry();
    let surface = surface_for(&registry);
    let aggregator = FeedAggregator::new(registry, retrieval, surface, PipelineConfig::default());

    let RunOutcome::Completed(report) = aggregator.run_pipeline().await.unwrap() else {
        panic!("run was skipped");
    };
    assert_eq!(report.fallback_feeds(), 3);
    // cert and anssi have two demonstration articles each, cnil has none
    assert_eq!(report.rendered, 4);

    let categories: Vec<Category> = aggregator
        .articles()
        .await
        .into_iter()
        .map(|a| a.category)
        .collect();
    assert_eq!(
        categories,
        vec![Category::Cert, Category::Cert, Category::Anssi, Category::Anssi]
    );
}

#[tokio::test]
async fn test_no_articles_renders_empty_state_not_error() {
    let registry = FeedRegistry::new(vec![
        descriptor("CNIL", FEED_A, "cnil"),
        descriptor("Other", FEED_B, "misc"),
    ]);
    let surface = surface_for(&registry);
    let aggregator =
        FeedAggregator::new(registry, MockRetrieval::new(), surface, PipelineConfig::default());

    let outcome = aggregator.run_pipeline().await.unwrap();
    assert!(matches!(outcome, RunOutcome::Completed(ref r) if r.rendered == 0));

    let state = aggregator.with_surface(|s| s.state().cloned()).await;
    assert_eq!(state, Some(ContainerState::Empty));
}

#[tokio::test]
async fn test_missing_surface_fails_only_the_current_run() {
    init_tracing();

    let retrieval = MockRetrieval::new().with_body(FEED_A, numbered_feed("A", 2));
    let aggregator = FeedAggregator::new(
        three_feed_registry(),
        retrieval,
        HtmlSurface::without_container(),
        PipelineConfig::default(),
    );

    let err = aggregator.run_pipeline().await.unwrap_err();
    assert!(matches!(err, AggregatorError::SurfaceUnavailable(_)));
    assert!(!aggregator.is_running());

    // the next run is attempted again rather than being blocked
    assert!(aggregator.run_pipeline().await.is_err());
}

#[tokio::test]
async fn test_overlapping_runs_are_skipped() {
    init_tracing();

    let retrieval = MockRetrieval::new()
        .with_body(FEED_A, numbered_feed("A", 2))
        .with_delay(FEED_A, Duration::from_millis(300));
    let registry = FeedRegistry::new(vec![descriptor("Feed A", FEED_A, "cert")]);
    let surface = surface_for(&registry);
    let aggregator = Arc::new(FeedAggregator::new(
        registry,
        retrieval,
        surface,
        PipelineConfig::default(),
    ));

    let first = tokio::spawn({
        let aggregator = Arc::clone(&aggregator);
        async move { aggregator.run_pipeline().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(aggregator.is_running());
    let second = aggregator.run_pipeline().await.unwrap();
    assert!(matches!(second, RunOutcome::Skipped));

    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, RunOutcome::Completed(ref r) if r.rendered == 2));
    assert!(!aggregator.is_running());
}

#[tokio::test]
async fn test_filter_applies_without_refetching() {
    let retrieval = Arc::new(
        MockRetrieval::new()
            .with_body(FEED_A, numbered_feed("A", 2))
            .with_body(FEED_B, numbered_feed("B", 1)),
    );
    let registry = three_feed_registry();
    let surface = surface_for(&registry);
    let aggregator = FeedAggregator::new(
        registry,
        Arc::clone(&retrieval),
        surface,
        PipelineConfig::default(),
    );

    aggregator.run_pipeline().await.unwrap();
    let calls_after_run = retrieval.calls();
    assert_eq!(calls_after_run, 3);

    assert_eq!(aggregator.select_filter(Filter::Only(Category::Anssi)).await.unwrap(), 1);
    assert_eq!(aggregator.select_filter(Filter::All).await.unwrap(), 3);
    assert_eq!(retrieval.calls(), calls_after_run);
}

#[tokio::test]
async fn test_refresh_reruns_on_interval() {
    init_tracing();

    let retrieval = Arc::new(MockRetrieval::new().with_body(FEED_A, numbered_feed("A", 1)));
    let registry = FeedRegistry::new(vec![descriptor("Feed A", FEED_A, "cert")]);
    let surface = surface_for(&registry);
    let aggregator = Arc::new(FeedAggregator::new(
        registry,
        Arc::clone(&retrieval),
        surface,
        PipelineConfig::default(),
    ));

    let handle = Arc::clone(&aggregator).spawn_refresh(Duration::from_millis(100)).unwrap();
    tokio::time::sleep(Duration::from_millis(350)).await;
    handle.abort();

    assert!(retrieval.calls() >= 2);
    assert_eq!(aggregator.articles().await.len(), 1);
}

#[tokio::test]
async fn test_zero_refresh_interval_is_rejected() {
    init_tracing();

    let retrieval = MockRetrieval::new().with_body(FEED_A, numbered_feed("A", 1));
    let registry = FeedRegistry::new(vec![descriptor("Feed A", FEED_A, "cert")]);
    let surface = surface_for(&registry);
    let aggregator = Arc::new(FeedAggregator::new(
        registry,
        retrieval,
        surface,
        PipelineConfig::default(),
    ));

    let err = Arc::clone(&aggregator).spawn_refresh(Duration::ZERO).unwrap_err();
    assert!(matches!(err, AggregatorError::InvalidConfig(_)));

    // The aggregator is still usable after the rejected schedule
    assert!(matches!(aggregator.run_pipeline().await.unwrap(), RunOutcome::Completed(_)));
    assert_eq!(aggregator.articles().await.len(), 1);
}
