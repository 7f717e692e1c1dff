//! End-to-end conversion jobs against a mock catalog.
//!
//! The catalog, its pages and product images are served by `wiremock`;
//! artifacts land in a scratch directory under the system temp dir.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use luxlab_core::{Entitlements, JobPhase, Plan, PricingStrategy};
use luxlab_jobs::{
    ConversionRequest, ConversionRunner, FsArtifactStore, JobRegistry, JobStatus,
};
use luxlab_pricing::MarketAggregator;
use luxlab_report::ImageProcessor;
use luxlab_scraper::{CatalogPipeline, ClientPool, CompiledSelectors, FetchPolicy};
use uuid::Uuid;
use wiremock::matchers::{method, path, path_regex, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = "/bags";

fn catalog(count: usize) -> String {
    let cards: String = (1..=count)
        .map(|i| {
            format!(
                r#"<div class="product-card"><img src="/img/{i}.jpg"><h3>Gucci Jackie Shoulder Bag {i}</h3><span class="price">€ 2.400</span></div>"#
            )
        })
        .collect();
    format!("<html><body>{cards}</body></html>")
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("luxlab-jobs-{}", Uuid::new_v4()))
}

fn runner(root: &Path) -> Arc<ConversionRunner> {
    let pool = Arc::new(ClientPool::new(FetchPolicy::immediate(1)).unwrap());
    let pipeline = CatalogPipeline::new(pool, Arc::new(CompiledSelectors::default()))
        .with_max_pages(4)
        .with_seed(7);
    let images = ImageProcessor::new(Duration::from_secs(2)).unwrap();
    Arc::new(ConversionRunner::new(
        pipeline,
        Arc::new(MarketAggregator::simulated_seeded(3)),
        Arc::new(images),
        Arc::new(FsArtifactStore::new(root)),
    ))
}

fn limited(plan: Plan, max_products: usize) -> Entitlements {
    Entitlements {
        max_products,
        ..plan.entitlements()
    }
}

fn request(server: &MockServer, strategy: PricingStrategy) -> ConversionRequest {
    ConversionRequest {
        url: format!("{}{LISTING}", server.uri()),
        strategy,
        custom_margin: None,
    }
}

/// Follows the job until it is terminal and returns every status seen.
async fn follow(registry: &JobRegistry, id: Uuid) -> Vec<JobStatus> {
    let (mut status, mut rx) = registry.subscribe(id).unwrap();
    let mut seen = vec![status.clone()];
    while !status.is_terminal() {
        status = tokio::time::timeout(Duration::from_secs(30), rx.recv())
            .await
            .expect("job finished in time")
            .expect("status channel open");
        seen.push(status.clone());
    }
    seen
}

// ---------------------------------------------------------------------------
// Successful conversions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn professional_conversion_stores_a_workbook() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param_is_missing("page"))
        .respond_with(html(catalog(3)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/\d+\.jpg$"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let root = scratch_dir();
    let runner = runner(&root);
    let registry = JobRegistry::new();
    let id = runner.spawn(
        &registry,
        request(&server, PricingStrategy::Premium),
        limited(Plan::Professional, 3),
    );

    let seen = follow(&registry, id).await;
    let last = seen.last().unwrap();
    assert_eq!(last.phase, JobPhase::Completed);
    assert_eq!(last.progress, 100);
    assert_eq!(last.success, Some(true));
    assert_eq!(last.extra["products_count"], 3);
    assert_eq!(last.extra["strategy"], "PREMIUM");
    assert_eq!(last.extra["market_insights"]["products_sampled"], 3);

    let filename = last.extra["filename"].as_str().unwrap();
    assert!(filename.starts_with("LUXLAB_B2B_PREMIUM_"));
    assert!(filename.ends_with(&format!("_{}.xlsx", &id.to_string()[..8])));
    let bytes = runner.store().get(filename).await.unwrap();
    assert!(bytes.starts_with(b"PK"));

    tokio::fs::remove_dir_all(&root).await.unwrap();
}

#[tokio::test]
async fn progress_never_goes_backwards() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param_is_missing("page"))
        .respond_with(html(catalog(4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let root = scratch_dir();
    let registry = JobRegistry::new();
    let id = runner(&root).spawn(
        &registry,
        request(&server, PricingStrategy::Balanced),
        limited(Plan::Trial, 4),
    );

    let seen = follow(&registry, id).await;
    let progress: Vec<u8> = seen.iter().map(|s| s.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");

    let phases: Vec<JobPhase> = seen.iter().map(|s| s.phase).collect();
    for phase in [
        JobPhase::Connect,
        JobPhase::Extracting,
        JobPhase::Market,
        JobPhase::Pricing,
        JobPhase::Images,
        JobPhase::Report,
        JobPhase::Storing,
        JobPhase::Completed,
    ] {
        assert!(phases.contains(&phase), "missing {phase} in {phases:?}");
    }

    tokio::fs::remove_dir_all(&root).await.unwrap();
}

#[tokio::test]
async fn demo_plan_skips_images_and_market() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .and(query_param_is_missing("page"))
        .respond_with(html(catalog(8)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;

    let root = scratch_dir();
    let registry = JobRegistry::new();
    let id = runner(&root).spawn(
        &registry,
        request(&server, PricingStrategy::Custom),
        Plan::Demo.entitlements(),
    );

    let seen = follow(&registry, id).await;
    let last = seen.last().unwrap();
    assert_eq!(last.phase, JobPhase::Completed);
    assert_eq!(last.extra["products_count"], 5);
    assert_eq!(last.extra["strategy"], "BALANCED");
    assert!(last.extra.get("market_insights").is_none());
    assert!(!seen.iter().any(|s| s.phase == JobPhase::Images || s.phase == JobPhase::Market));

    tokio::fs::remove_dir_all(&root).await.unwrap();
}

// ---------------------------------------------------------------------------
// Failures always end in a terminal error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_catalog_ends_in_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(html("<html><body><p>Nothing here</p></body></html>".to_string()))
        .mount(&server)
        .await;

    let root = scratch_dir();
    let registry = JobRegistry::new();
    let id = runner(&root).spawn(
        &registry,
        request(&server, PricingStrategy::Balanced),
        Plan::Trial.entitlements(),
    );

    let last = follow(&registry, id).await.pop().unwrap();
    assert_eq!(last.phase, JobPhase::Error);
    assert_eq!(last.success, Some(false));
    assert!(last.message.contains("no products found"), "{}", last.message);
    assert!(!root.exists());
}

#[tokio::test]
async fn cancelled_job_reports_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(html(catalog(2)).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let root = scratch_dir();
    let registry = JobRegistry::new();
    let id = runner(&root).spawn(
        &registry,
        request(&server, PricingStrategy::Balanced),
        Plan::Trial.entitlements(),
    );
    assert!(registry.cancel(id));

    let last = follow(&registry, id).await.pop().unwrap();
    assert_eq!(last.phase, JobPhase::Error);
    assert_eq!(last.message, "cancelled");
    assert!(!registry.cancel(id));
}

#[tokio::test]
async fn invalid_url_ends_in_error() {
    let root = scratch_dir();
    let registry = JobRegistry::new();
    let id = runner(&root).spawn(
        &registry,
        ConversionRequest {
            url: "ftp://catalog.example/bags".into(),
            strategy: PricingStrategy::Balanced,
            custom_margin: None,
        },
        Plan::Trial.entitlements(),
    );

    let last = follow(&registry, id).await.pop().unwrap();
    assert_eq!(last.phase, JobPhase::Error);
    assert!(last.message.contains("unsupported scheme"), "{}", last.message);
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyze_reads_five_entries_and_recommends_when_entitled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING))
        .respond_with(html(catalog(9)))
        .mount(&server)
        .await;

    let root = scratch_dir();
    let runner = runner(&root);
    let url = format!("{}{LISTING}", server.uri());

    let trial = runner.analyze(&url, Plan::Trial.entitlements()).await.unwrap();
    assert_eq!(trial.products_found, 5);
    assert_eq!(trial.sample.len(), 5);
    assert_eq!(trial.sample[0].brand, "GUCCI");
    assert!(trial.market_analysis);
    assert!(trial.recommended_strategy.is_some());
    assert_eq!(trial.confidence, Some(95));

    let demo = runner.analyze(&url, Plan::Demo.entitlements()).await.unwrap();
    assert!(!demo.market_analysis);
    assert!(demo.recommended_strategy.is_none());
}
