//! One catalog conversion, end to end:
//! extraction → market → pricing → images → report → storage → record.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use luxlab_core::progress::interpolate;
use luxlab_core::{
    load_selector_config, AppConfig, Entitlements, JobPhase, PricingStrategy, ProductRecord,
    ProgressSink, ProgressUpdate, SelectorConfig,
};
use luxlab_pricing::{price, MarketAggregate, MarketAggregator, MarketInsights, PricedProduct};
use luxlab_report::{
    artifact_filename, Frame, ImageProcessor, ReportAssembler, ReportOptions, ReportSummary,
};
use luxlab_scraper::{CatalogPipeline, ClientPool, CompiledSelectors, FetchPolicy};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::JobError;
use crate::record::{url_digest, ConversionRecord, ConversionSink, TracingSink};
use crate::registry::JobRegistry;
use crate::storage::{ArtifactStore, FsArtifactStore};

/// Entries read by [`ConversionRunner::analyze`].
pub const PREVIEW_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub url: String,
    pub strategy: PricingStrategy,
    /// Margin for [`PricingStrategy::Custom`]; ignored otherwise.
    pub custom_margin: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutcome {
    pub job_id: Uuid,
    pub filename: String,
    pub strategy: PricingStrategy,
    pub summary: ReportSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<MarketInsights>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewItem {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub retail_price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPreview {
    pub url: String,
    pub products_found: usize,
    pub sample: Vec<PreviewItem>,
    pub market_analysis: bool,
    /// Recommendation for the first entry; only with market analysis.
    pub recommended_strategy: Option<PricingStrategy>,
    pub confidence: Option<u8>,
}

pub struct ConversionRunner {
    pipeline: CatalogPipeline,
    market: Arc<MarketAggregator>,
    images: Arc<ImageProcessor>,
    store: Arc<dyn ArtifactStore>,
    records: Arc<dyn ConversionSink>,
}

impl ConversionRunner {
    pub fn new(
        pipeline: CatalogPipeline,
        market: Arc<MarketAggregator>,
        images: Arc<ImageProcessor>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            pipeline,
            market,
            images,
            store,
            records: Arc::new(TracingSink),
        }
    }

    #[must_use]
    pub fn with_records(mut self, records: Arc<dyn ConversionSink>) -> Self {
        self.records = records;
        self
    }

    /// Wires the production collaborators from configuration: paced client
    /// pool, selector cascades (YAML override if configured), simulated
    /// market, gold-framed images and a filesystem store.
    ///
    /// # Errors
    ///
    /// Fails if the selectors file is unreadable or invalid, or an HTTP
    /// client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, JobError> {
        let selector_config = match &config.selectors_path {
            Some(path) => load_selector_config(path)?,
            None => SelectorConfig::default(),
        };
        let selectors = Arc::new(CompiledSelectors::compile(&selector_config)?);
        let pool = Arc::new(ClientPool::new(FetchPolicy::from_app_config(config))?);
        let pipeline =
            CatalogPipeline::new(pool, selectors).with_max_pages(config.scraper_max_pages);
        let images = ImageProcessor::new(Duration::from_secs(config.image_timeout_secs))?
            .with_frame(Frame::gold());

        Ok(Self::new(
            pipeline,
            Arc::new(MarketAggregator::simulated()),
            Arc::new(images),
            Arc::new(FsArtifactStore::new(&config.export_dir)),
        ))
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn ArtifactStore> {
        Arc::clone(&self.store)
    }

    /// Registers a job and runs it on a background task. The job always ends
    /// in `completed` or `error`, even if the worker panics.
    pub fn spawn(
        self: &Arc<Self>,
        registry: &JobRegistry,
        request: ConversionRequest,
        entitlements: Entitlements,
    ) -> Uuid {
        let handle = registry.create();
        let job_id = handle.id();
        let runner = Arc::clone(self);

        tokio::spawn(async move {
            let worker = {
                let handle = handle.clone();
                tokio::spawn(async move {
                    runner
                        .run(
                            handle.id(),
                            &request,
                            entitlements,
                            &handle,
                            handle.cancellation(),
                        )
                        .await
                })
            };

            match worker.await {
                Ok(Ok(outcome)) => {
                    tracing::info!(job_id = %job_id, filename = %outcome.filename, "conversion finished");
                }
                Ok(Err(e)) => {
                    tracing::error!(job_id = %job_id, error = %e, "conversion failed");
                    handle.fail(e.to_string());
                }
                Err(e) => {
                    tracing::error!(job_id = %job_id, error = %e, "conversion worker aborted");
                    handle.fail(JobError::Worker(e.to_string()).to_string());
                }
            }
        });

        job_id
    }

    /// Runs one conversion in the current task.
    ///
    /// Emits every checkpoint up to `completed` on `sink`; the caller is
    /// responsible for turning an `Err` into an `error` event.
    ///
    /// # Errors
    ///
    /// [`JobError::Scraper`] when extraction yields nothing or the URL is
    /// invalid, [`JobError::Cancelled`] when `cancel` fires,
    /// [`JobError::Report`] or [`JobError::Storage`] when the artifact cannot
    /// be built or written.
    pub async fn run(
        &self,
        job_id: Uuid,
        request: &ConversionRequest,
        entitlements: Entitlements,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<ConversionOutcome, JobError> {
        let strategy = effective_strategy(request.strategy, &entitlements);
        sink.emit(
            ProgressUpdate::new(JobPhase::Init, 0, "conversion started")
                .with_extra("strategy", strategy.as_str()),
        );
        tracing::info!(
            job_id = %job_id,
            strategy = %strategy,
            max_products = entitlements.max_products,
            "conversion started"
        );

        let sweep = self
            .pipeline
            .run(&request.url, entitlements.max_products, sink, cancel)
            .await?;
        let mut records = sweep.records;
        records.truncate(entitlements.max_products);
        tracing::info!(
            job_id = %job_id,
            products = records.len(),
            pages = sweep.pages_visited,
            stop = ?sweep.stop,
            "extraction finished"
        );

        let aggregates = if entitlements.market_analysis {
            sink.emit(ProgressUpdate::new(JobPhase::Market, 60, "sampling market prices"));
            let mut out = Vec::with_capacity(records.len());
            for record in &records {
                ensure_live(cancel)?;
                out.push(self.market.analyze(&record.market_name, record.brand.value()).await);
            }
            out
        } else {
            Vec::new()
        };
        let insights = entitlements.market_analysis.then(|| {
            MarketInsights::from_aggregates(&aggregates, self.market.source_count())
        });

        let priced = price_all(records, &aggregates, strategy, request.custom_margin, sink);
        ensure_live(cancel)?;

        let images = self.images_for(&priced, &entitlements, sink, cancel).await?;

        sink.emit(ProgressUpdate::new(JobPhase::Report, 90, "building report"));
        let generated_at = Utc::now();
        let options = ReportOptions {
            strategy,
            images: entitlements.images,
            analytics: entitlements.analytics_sheet,
            market_analysis: entitlements.market_analysis,
            generated_at,
        };
        let artifact = tokio::task::spawn_blocking(move || {
            ReportAssembler::new(options).build(&priced, &images)
        })
        .await
        .map_err(|e| JobError::Worker(e.to_string()))??;
        ensure_live(cancel)?;

        sink.emit(ProgressUpdate::new(JobPhase::Storing, 95, "storing report"));
        let filename = artifact_filename(strategy, generated_at, &job_id.to_string());
        self.store.put(&filename, &artifact.bytes).await?;

        let summary = artifact.summary;
        let record = ConversionRecord {
            job_id,
            url_sha256: url_digest(&request.url),
            strategy,
            products_count: summary.products_count,
            margin_avg: summary.margin_avg,
            total_proposed: summary.total_proposed,
            filename: filename.clone(),
            created_at: generated_at,
        };
        if let Err(e) = self.records.record(&record).await {
            tracing::warn!(job_id = %job_id, error = %e, "conversion record not persisted");
        }

        let mut done = ProgressUpdate::new(
            JobPhase::Completed,
            100,
            format!("{} products converted", summary.products_count),
        )
        .with_extra("filename", filename.as_str())
        .with_extra("products_count", summary.products_count)
        .with_extra("total_retail", summary.total_retail)
        .with_extra("total_proposed", summary.total_proposed)
        .with_extra("margin_avg", summary.margin_avg)
        .with_extra("strategy", strategy.as_str());
        if let Some(insights) = &insights {
            if let Ok(value) = serde_json::to_value(insights) {
                done = done.with_extra("market_insights", value);
            }
        }
        sink.emit(done);

        Ok(ConversionOutcome {
            job_id,
            filename,
            strategy,
            summary,
            insights,
        })
    }

    async fn images_for(
        &self,
        priced: &[PricedProduct],
        entitlements: &Entitlements,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Vec<Option<Vec<u8>>>, JobError> {
        if !entitlements.images {
            return Ok(vec![None; priced.len()]);
        }

        let total = priced.len();
        let mut out = Vec::with_capacity(total);
        for (i, product) in priced.iter().enumerate() {
            ensure_live(cancel)?;
            sink.emit(ProgressUpdate::new(
                JobPhase::Images,
                interpolate(70, 90, i, total),
                format!("processing image {}/{total}", i + 1),
            ));
            out.push(
                self.images
                    .process(
                        product.record.image_url.as_deref(),
                        entitlements.image_quality,
                        entitlements.image_box,
                    )
                    .await,
            );
        }
        Ok(out)
    }

    /// Reads the first page of `url` and, when entitled, the market
    /// recommendation for its first entry.
    ///
    /// # Errors
    ///
    /// [`JobError::Scraper`] when the page cannot be fetched or has no
    /// entries.
    pub async fn analyze(
        &self,
        url: &str,
        entitlements: Entitlements,
    ) -> Result<AnalysisPreview, JobError> {
        let records = self.pipeline.preview(url, PREVIEW_LIMIT).await?;

        let stats = match records.first() {
            Some(first) if entitlements.market_analysis => {
                self.market
                    .analyze(&first.market_name, first.brand.value())
                    .await
                    .stats
            }
            _ => None,
        };

        Ok(AnalysisPreview {
            url: url.to_owned(),
            products_found: records.len(),
            sample: records
                .iter()
                .map(|r| PreviewItem {
                    name: r.name.value().clone(),
                    brand: r.brand.value().clone(),
                    category: r.category.value().as_str().to_string(),
                    retail_price: r.retail_price(),
                })
                .collect(),
            market_analysis: entitlements.market_analysis,
            recommended_strategy: stats.map(|s| s.recommended),
            confidence: stats.map(|s| s.confidence),
        })
    }
}

/// `CUSTOM` needs the entitlement; otherwise the job prices as `BALANCED`.
#[must_use]
pub fn effective_strategy(requested: PricingStrategy, entitlements: &Entitlements) -> PricingStrategy {
    if requested == PricingStrategy::Custom && !entitlements.custom_strategy {
        tracing::warn!("custom strategy not available for this caller, using balanced");
        return PricingStrategy::Balanced;
    }
    requested
}

fn price_all(
    records: Vec<ProductRecord>,
    aggregates: &[MarketAggregate],
    strategy: PricingStrategy,
    custom_margin: Option<f64>,
    sink: &dyn ProgressSink,
) -> Vec<PricedProduct> {
    let total = records.len();
    let mut last = None;
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let stats = aggregates.get(i).and_then(|a| a.stats.as_ref());
            let pricing = price(record.retail_price(), strategy, custom_margin, stats);
            let pct = interpolate(60, 70, i + 1, total);
            if last != Some(pct) {
                sink.emit(ProgressUpdate::new(
                    JobPhase::Pricing,
                    pct,
                    format!("priced {}/{total}", i + 1),
                ));
                last = Some(pct);
            }
            PricedProduct { record, pricing }
        })
        .collect()
}

fn ensure_live(cancel: &CancellationToken) -> Result<(), JobError> {
    if cancel.is_cancelled() {
        return Err(JobError::Cancelled);
    }
    Ok(())
}
