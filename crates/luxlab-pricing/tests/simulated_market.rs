//! End-to-end checks of the simulated market feeding the pricing engine.

use luxlab_core::PricingStrategy;
use luxlab_pricing::engine::{MAX_MARGIN, MIN_MARGIN};
use luxlab_pricing::{price, MarketAggregator};

#[tokio::test]
async fn every_simulated_source_answers() {
    let aggregator = MarketAggregator::simulated_seeded(11);
    let aggregate = aggregator.analyze("Jackie 1961 shoulder bag", "GUCCI").await;

    assert_eq!(aggregate.samples.len(), aggregator.source_count());
    let stats = aggregate.stats.expect("all sources answered");
    assert_eq!(stats.confidence, 95);
    assert!(stats.min <= stats.avg && stats.avg <= stats.max);
    assert!(stats.min >= 600.0 * 1.3);
}

#[tokio::test]
async fn priced_with_market_signal_stays_within_margin_bounds() {
    let aggregator = MarketAggregator::simulated_seeded(5);
    for (name, brand, retail) in [
        ("Peekaboo", "FENDI", 4800.0),
        ("Cassette", "BOTTEGA VENETA", 900.0),
        ("Puzzle", "LOEWE", 120.0),
    ] {
        let aggregate = aggregator.analyze(name, brand).await;
        for strategy in [
            PricingStrategy::Aggressive,
            PricingStrategy::Balanced,
            PricingStrategy::Premium,
        ] {
            let out = price(retail, strategy, None, aggregate.stats.as_ref());
            assert!((MIN_MARGIN..=MAX_MARGIN).contains(&out.margin));
            assert!(out.proposed > 0.0 && out.proposed < retail);
        }
    }
}
