use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::MarketSource;
use crate::error::MarketError;

/// Built-in reference sources and their quote ranges in EUR.
pub const DEFAULT_SOURCES: [(&str, u32, u32); 5] = [
    ("farfetch", 800, 2500),
    ("ssense", 750, 2300),
    ("yoox", 600, 2000),
    ("net-a-porter", 700, 2200),
    ("mytheresa", 700, 2200),
];

const TOP_TIER: [&str; 4] = ["GUCCI", "PRADA", "VALENTINO", "VERSACE"];
const UPPER_TIER: [&str; 3] = ["FENDI", "BALENCIAGA", "BOTTEGA VENETA"];

/// Price uplift applied to quotes for well-known houses.
#[must_use]
pub fn brand_multiplier(brand: &str) -> f64 {
    let brand = brand.trim().to_uppercase();
    if TOP_TIER.contains(&brand.as_str()) {
        1.3
    } else if UPPER_TIER.contains(&brand.as_str()) {
        1.25
    } else {
        1.0
    }
}

/// Synthetic source quoting a uniform price in `[low, high]`, scaled by brand.
///
/// Stands in for a real competitor lookup; the aggregator cannot tell the
/// difference.
pub struct SimulatedSource {
    name: String,
    low: u32,
    high: u32,
    rng: Mutex<StdRng>,
}

impl SimulatedSource {
    #[must_use]
    pub fn new(name: &str, low: u32, high: u32) -> Self {
        Self::with_rng(name, low, high, StdRng::from_os_rng())
    }

    #[must_use]
    pub fn seeded(name: &str, low: u32, high: u32, seed: u64) -> Self {
        Self::with_rng(name, low, high, StdRng::seed_from_u64(seed))
    }

    fn with_rng(name: &str, low: u32, high: u32, rng: StdRng) -> Self {
        Self {
            name: name.to_string(),
            low: low.min(high),
            high: high.max(low),
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl MarketSource for SimulatedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn sample(&self, _product_name: &str, brand: &str) -> Result<f64, MarketError> {
        let base = {
            let mut rng = self.rng.lock().map_err(|_| MarketError::SourceUnavailable {
                source_name: self.name.clone(),
                reason: "random source poisoned".to_string(),
            })?;
            rng.random_range(self.low..=self.high)
        };
        Ok(f64::from(base) * brand_multiplier(brand))
    }
}
