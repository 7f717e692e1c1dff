//! Multi-page catalog extraction.

use std::sync::Arc;

use luxlab_core::progress::interpolate;
use luxlab_core::{JobPhase, ProductRecord, ProgressSink, ProgressUpdate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::client::ClientPool;
use crate::error::ScraperError;
use crate::pagination::{page_url, start_page};
use crate::parse::parse_catalog_page;
use crate::selector::CompiledSelectors;

/// Consecutive pages without entries that end a sweep.
pub const EMPTY_PAGE_LIMIT: u32 = 3;

/// Default page cap when none is configured.
pub const DEFAULT_MAX_PAGES: u32 = 30;

const EXTRACT_FROM: u8 = 10;
const EXTRACT_TO: u8 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Fetching,
    Parsing,
    Extracting,
    Done,
    Failed,
}

impl PipelineState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// Whether a sweep in `self` may move to `next`. Any live state may fail
    /// or fetch the next page; `Done` needs at least one fetch.
    #[must_use]
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::{Done, Extracting, Failed, Fetching, Init, Parsing};
        matches!(
            (self, next),
            (Init | Fetching | Parsing | Extracting, Fetching | Failed)
                | (Fetching, Parsing)
                | (Parsing, Extracting)
                | (Fetching | Parsing | Extracting, Done)
        )
    }
}

/// Why a sweep stopped paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    PageCap,
    EmptyPages,
}

#[derive(Debug)]
pub struct Sweep {
    pub records: Vec<ProductRecord>,
    pub pages_visited: u32,
    pub stop: StopReason,
}

/// Drives pagination over one catalog listing and collects product records.
#[derive(Clone)]
pub struct CatalogPipeline {
    pool: Arc<ClientPool>,
    selectors: Arc<CompiledSelectors>,
    max_pages: u32,
    seed: Option<u64>,
}

impl CatalogPipeline {
    #[must_use]
    pub fn new(pool: Arc<ClientPool>, selectors: Arc<CompiledSelectors>) -> Self {
        Self {
            pool,
            selectors,
            max_pages: DEFAULT_MAX_PAGES,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Makes synthetic fallbacks reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        self.seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
    }

    /// Sweeps the listing at `url` until `max_products` records are collected,
    /// the page cap is hit, or [`EMPTY_PAGE_LIMIT`] consecutive pages yield
    /// nothing. A page whose fetch fails counts as empty.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`] if `url` is not an http(s) URL.
    /// - [`ScraperError::Cancelled`] if `cancel` fires before the sweep ends.
    /// - [`ScraperError::NoProductsFound`] if the sweep ends with no records.
    /// - [`ScraperError::IllegalTransition`] if the page loop breaks the
    ///   [`PipelineState`] order.
    pub async fn run(
        &self,
        url: &str,
        max_products: usize,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Sweep, ScraperError> {
        let base = parse_listing_url(url)?;
        let first_page = start_page(&base);
        let mut rng = self.rng();
        let mut state = PipelineState::Init;
        let mut records: Vec<ProductRecord> = Vec::new();
        let mut empty_streak = 0u32;
        let mut page = 0u32;

        sink.emit(ProgressUpdate::new(
            JobPhase::Connect,
            5,
            format!("connecting to {}", base.host_str().unwrap_or(url)),
        ));

        let stop = loop {
            if records.len() >= max_products {
                break StopReason::TargetReached;
            }
            if page >= self.max_pages {
                break StopReason::PageCap;
            }
            if cancel.is_cancelled() {
                transition(state, PipelineState::Failed, page)?;
                return Err(ScraperError::Cancelled);
            }

            page += 1;
            let target = page_url(&base, first_page.saturating_add(page - 1));
            state = transition(state, PipelineState::Fetching, page)?;

            let fetched = tokio::select! {
                result = self.pool.fetch(target.as_str()) => result,
                () = cancel.cancelled() => {
                    transition(state, PipelineState::Failed, page)?;
                    return Err(ScraperError::Cancelled);
                }
            };

            let added = match fetched {
                Ok(body) => {
                    state = transition(state, PipelineState::Parsing, page)?;
                    let batch = parse_catalog_page(
                        &body,
                        &self.selectors,
                        &target,
                        records.len(),
                        max_products - records.len(),
                        &mut rng,
                    );
                    if !batch.is_empty() {
                        state = transition(state, PipelineState::Extracting, page)?;
                    }
                    let n = batch.len();
                    records.extend(batch);
                    n
                }
                Err(e) => {
                    tracing::warn!(page, url = %target, error = %e, "page fetch failed, counting it as empty");
                    0
                }
            };

            if added == 0 {
                empty_streak += 1;
                tracing::debug!(page, empty_streak, "empty catalog page");
                if empty_streak >= EMPTY_PAGE_LIMIT {
                    break StopReason::EmptyPages;
                }
            } else {
                empty_streak = 0;
                sink.emit(ProgressUpdate::new(
                    JobPhase::Extracting,
                    interpolate(EXTRACT_FROM, EXTRACT_TO, records.len(), max_products),
                    format!("extracted {} of {max_products} products", records.len()),
                ));
            }
        };

        if records.is_empty() {
            transition(state, PipelineState::Failed, page)?;
            return Err(ScraperError::NoProductsFound {
                url: url.to_owned(),
                pages: page,
            });
        }

        transition(state, PipelineState::Done, page)?;
        tracing::info!(
            url,
            pages = page,
            products = records.len(),
            stop = ?stop,
            "catalog sweep finished"
        );
        Ok(Sweep {
            records,
            pages_visited: page,
            stop,
        })
    }

    /// Reads up to `limit` records from the first page only.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error for the first page, and returns
    /// [`ScraperError::NoProductsFound`] when it has no entries.
    pub async fn preview(&self, url: &str, limit: usize) -> Result<Vec<ProductRecord>, ScraperError> {
        let base = parse_listing_url(url)?;
        let body = self.pool.fetch(base.as_str()).await?;
        let mut rng = self.rng();
        let records = parse_catalog_page(&body, &self.selectors, &base, 0, limit, &mut rng);
        if records.is_empty() {
            return Err(ScraperError::NoProductsFound {
                url: url.to_owned(),
                pages: 1,
            });
        }
        Ok(records)
    }
}

fn parse_listing_url(url: &str) -> Result<Url, ScraperError> {
    let parsed = Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(parsed)
}

fn transition(
    from: PipelineState,
    to: PipelineState,
    page: u32,
) -> Result<PipelineState, ScraperError> {
    if !from.can_advance_to(to) {
        tracing::error!(page, from = ?from, to = ?to, "illegal pipeline transition");
        return Err(ScraperError::IllegalTransition { from, to });
    }
    tracing::trace!(page, from = ?from, to = ?to, "pipeline state");
    Ok(to)
}
