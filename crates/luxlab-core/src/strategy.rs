use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PricingStrategy {
    Aggressive,
    #[default]
    Balanced,
    Premium,
    Custom,
}

impl PricingStrategy {
    /// Fraction of the retail price removed when no market signal is used.
    /// `Custom` takes its margin from the caller.
    #[must_use]
    pub fn base_margin(self) -> Option<f64> {
        match self {
            PricingStrategy::Aggressive => Some(0.30),
            PricingStrategy::Balanced => Some(0.50),
            PricingStrategy::Premium => Some(0.70),
            PricingStrategy::Custom => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PricingStrategy::Aggressive => "AGGRESSIVE",
            PricingStrategy::Balanced => "BALANCED",
            PricingStrategy::Premium => "PREMIUM",
            PricingStrategy::Custom => "CUSTOM",
        }
    }
}

impl std::fmt::Display for PricingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aggressive" => Ok(PricingStrategy::Aggressive),
            "balanced" => Ok(PricingStrategy::Balanced),
            "premium" => Ok(PricingStrategy::Premium),
            "custom" => Ok(PricingStrategy::Custom),
            other => Err(format!("unknown pricing strategy '{other}'")),
        }
    }
}
