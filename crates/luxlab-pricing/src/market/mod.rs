//! Reference-price sources and their aggregation.

mod simulated;

use std::collections::BTreeMap;

use async_trait::async_trait;
use luxlab_core::PricingStrategy;
use serde::Serialize;

use crate::error::MarketError;

pub use simulated::{brand_multiplier, SimulatedSource, DEFAULT_SOURCES};

/// One named reference source able to quote a price for a product.
#[async_trait]
pub trait MarketSource: Send + Sync {
    fn name(&self) -> &str;

    /// Quoted price in EUR.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] when the source cannot quote this product.
    async fn sample(&self, product_name: &str, brand: &str) -> Result<f64, MarketError>;
}

/// Summary statistics over the samples of one [`MarketAggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    /// `(max - min) / avg`, zero when `avg` is not positive.
    pub volatility: f64,
    pub recommended: PricingStrategy,
    /// 0..=100, driven by how many sources answered.
    pub confidence: u8,
}

/// Market snapshot for one product.
///
/// `stats` is `None` when no source answered: that means "no market signal",
/// never "the market price is zero".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketAggregate {
    pub samples: BTreeMap<String, f64>,
    pub stats: Option<MarketStats>,
}

impl MarketAggregate {
    #[must_use]
    pub fn from_samples(samples: BTreeMap<String, f64>) -> Self {
        let stats = summarize(&samples);
        Self { samples, stats }
    }

    #[must_use]
    pub fn has_signal(&self) -> bool {
        self.stats.is_some_and(|s| s.avg > 0.0)
    }
}

#[allow(clippy::cast_precision_loss)]
fn summarize(samples: &BTreeMap<String, f64>) -> Option<MarketStats> {
    if samples.is_empty() {
        return None;
    }
    let prices = samples.values().copied();
    let sum: f64 = prices.clone().sum();
    let avg = sum / samples.len() as f64;
    let min = prices.clone().fold(f64::INFINITY, f64::min);
    let max = prices.fold(f64::NEG_INFINITY, f64::max);
    let volatility = if avg > 0.0 { (max - min) / avg } else { 0.0 };

    Some(MarketStats {
        avg,
        min,
        max,
        volatility,
        recommended: classify(min, avg, max),
        confidence: confidence_for(samples.len()),
    })
}

/// Recommended strategy for a market with the given spread.
///
/// A dispersed market (volatility above 0.5) leaves room to undercut; a floor
/// well above the midline supports premium positioning.
#[must_use]
pub fn classify(min: f64, avg: f64, max: f64) -> PricingStrategy {
    let volatility = if avg > 0.0 { (max - min) / avg } else { 0.0 };
    if volatility > 0.5 {
        PricingStrategy::Aggressive
    } else if min > avg * 1.2 {
        PricingStrategy::Premium
    } else {
        PricingStrategy::Balanced
    }
}

#[must_use]
pub fn confidence_for(sources_sampled: usize) -> u8 {
    match sources_sampled {
        n if n >= 4 => 95,
        n if n >= 2 => 80,
        _ => 65,
    }
}

/// Queries every configured source once and aggregates whatever answered.
pub struct MarketAggregator {
    sources: Vec<Box<dyn MarketSource>>,
}

impl MarketAggregator {
    #[must_use]
    pub fn new(sources: Vec<Box<dyn MarketSource>>) -> Self {
        Self { sources }
    }

    /// The five built-in simulated reference sources.
    #[must_use]
    pub fn simulated() -> Self {
        Self::new(
            DEFAULT_SOURCES
                .iter()
                .map(|&(name, low, high)| {
                    Box::new(SimulatedSource::new(name, low, high)) as Box<dyn MarketSource>
                })
                .collect(),
        )
    }

    /// Simulated sources with reproducible quotes.
    #[must_use]
    pub fn simulated_seeded(seed: u64) -> Self {
        Self::new(
            DEFAULT_SOURCES
                .iter()
                .zip(seed..)
                .map(|(&(name, low, high), s)| {
                    Box::new(SimulatedSource::seeded(name, low, high, s)) as Box<dyn MarketSource>
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Samples each source once. A failing source is logged and left out of
    /// the aggregate; it is not retried.
    pub async fn analyze(&self, product_name: &str, brand: &str) -> MarketAggregate {
        let mut samples = BTreeMap::new();

        for source in &self.sources {
            match source.sample(product_name, brand).await {
                Ok(price) if price.is_finite() && price > 0.0 => {
                    samples.insert(source.name().to_string(), price);
                }
                Ok(price) => {
                    tracing::warn!(
                        source = source.name(),
                        price,
                        "market source returned an unusable price"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        source = source.name(),
                        brand,
                        error = %e,
                        "market source unavailable"
                    );
                }
            }
        }

        tracing::debug!(brand, sampled = samples.len(), "market analysis done");
        MarketAggregate::from_samples(samples)
    }
}
