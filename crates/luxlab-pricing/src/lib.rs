//! Market sampling and price computation for B2B stock lists.
//!
//! [`MarketAggregator`] queries a set of reference sources for a product and
//! summarises the samples; [`price`] turns a retail price, a strategy and an
//! optional market summary into a proposed trade price.

pub mod engine;
pub mod error;
pub mod insights;
pub mod market;

pub use engine::{price, round_price_point, MarketPosition, PricedProduct, PricingOutcome};
pub use error::MarketError;
pub use insights::MarketInsights;
pub use market::{
    classify, confidence_for, MarketAggregate, MarketAggregator, MarketSource, MarketStats,
    SimulatedSource,
};
