use std::collections::HashMap;

use luxlab_core::PricingStrategy;
use serde::Serialize;

use crate::market::MarketAggregate;

/// How many products of a batch feed the job-level insights.
pub const INSIGHT_SAMPLE: usize = 5;

/// Job-level summary of the market signal, reported with the completion
/// event. Never written into the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketInsights {
    pub products_sampled: usize,
    /// Mean of the per-product average prices that had a signal.
    pub mean_average_price: Option<f64>,
    pub sources_configured: usize,
    /// Most frequent per-product recommendation; ties go to the earlier one.
    pub recommended: Option<PricingStrategy>,
}

impl MarketInsights {
    /// Summarises the first [`INSIGHT_SAMPLE`] aggregates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_aggregates(aggregates: &[MarketAggregate], sources_configured: usize) -> Self {
        let sample = &aggregates[..aggregates.len().min(INSIGHT_SAMPLE)];
        let stats: Vec<_> = sample.iter().filter_map(|a| a.stats).collect();

        let mean_average_price = (!stats.is_empty())
            .then(|| stats.iter().map(|s| s.avg).sum::<f64>() / stats.len() as f64);

        let mut votes: HashMap<PricingStrategy, usize> = HashMap::new();
        let mut order: Vec<PricingStrategy> = Vec::new();
        for s in &stats {
            let count = votes.entry(s.recommended).or_insert(0);
            if *count == 0 {
                order.push(s.recommended);
            }
            *count += 1;
        }
        let top = votes.values().copied().max();
        let recommended = top.and_then(|n| order.iter().copied().find(|s| votes[s] == n));

        Self {
            products_sampled: sample.len(),
            mean_average_price,
            sources_configured,
            recommended,
        }
    }
}
