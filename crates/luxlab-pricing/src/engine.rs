//! Trade-price computation.

use luxlab_core::{PricingStrategy, ProductRecord};
use serde::Serialize;

use crate::market::MarketStats;

/// Realized margin is always clamped to this range.
pub const MIN_MARGIN: f64 = 0.15;
pub const MAX_MARGIN: f64 = 0.85;

/// Margin used for `CUSTOM` when the caller supplied none.
pub const DEFAULT_CUSTOM_MARGIN: f64 = 0.50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketPosition {
    Competitive,
    Aggressive,
}

impl MarketPosition {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MarketPosition::Competitive => "competitive",
            MarketPosition::Aggressive => "aggressive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricingOutcome {
    pub retail: f64,
    pub proposed: f64,
    /// `1 - proposed / retail` as a whole percentage.
    pub discount_pct: f64,
    /// Realized margin in `[MIN_MARGIN, MAX_MARGIN]`.
    pub margin: f64,
    pub position: MarketPosition,
}

/// A product together with its computed trade price.
#[derive(Debug, Clone)]
pub struct PricedProduct {
    pub record: ProductRecord,
    pub pricing: PricingOutcome,
}

impl PricedProduct {
    #[must_use]
    pub fn proposed(&self) -> f64 {
        self.pricing.proposed
    }
}

/// Computes the proposed trade price for `original`.
///
/// Without a market signal the strategy's base margin applies. With one, a
/// target price is derived from the market (AGGRESSIVE: 95% of the minimum,
/// PREMIUM: 115% of the average, otherwise 98% of the average) and the margin
/// follows from it. `CUSTOM` starts from `custom_margin` and, like BALANCED,
/// follows the average when the market has one. The margin is then clamped
/// to `[0.15, 0.85]` and the result rounded to a retail price point.
#[must_use]
pub fn price(
    original: f64,
    strategy: PricingStrategy,
    custom_margin: Option<f64>,
    market: Option<&MarketStats>,
) -> PricingOutcome {
    let base = strategy
        .base_margin()
        .unwrap_or_else(|| custom_margin.unwrap_or(DEFAULT_CUSTOM_MARGIN));

    let market = market.filter(|m| m.avg > 0.0);
    let raw_margin = match market {
        Some(m) if original > 0.0 => {
            let target = match strategy {
                PricingStrategy::Aggressive => m.min * 0.95,
                PricingStrategy::Premium => m.avg * 1.15,
                PricingStrategy::Balanced | PricingStrategy::Custom => m.avg * 0.98,
            };
            (original - target) / original
        }
        _ => base,
    };
    let margin = if raw_margin.is_finite() {
        raw_margin.clamp(MIN_MARGIN, MAX_MARGIN)
    } else {
        DEFAULT_CUSTOM_MARGIN
    };

    let proposed = round_price_point(original * (1.0 - margin));
    let discount_pct = if original > 0.0 {
        ((1.0 - proposed / original) * 100.0).round_ties_even()
    } else {
        0.0
    };

    PricingOutcome {
        retail: original,
        proposed,
        discount_pct,
        margin,
        position: if margin > 0.40 {
            MarketPosition::Competitive
        } else {
            MarketPosition::Aggressive
        },
    }
}

/// Rounds to a realistic price point: nearest 10 above 1000, nearest 5 above
/// 100, nearest unit otherwise. Ties go to even. A result that would round to
/// zero is kept to the cent instead.
#[must_use]
pub fn round_price_point(value: f64) -> f64 {
    let rounded = if value > 1000.0 {
        (value / 10.0).round_ties_even() * 10.0
    } else if value > 100.0 {
        (value / 5.0).round_ties_even() * 5.0
    } else {
        value.round_ties_even()
    };

    if rounded > 0.0 {
        rounded
    } else {
        (value * 100.0).round() / 100.0
    }
}
