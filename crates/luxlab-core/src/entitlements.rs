//! Per-caller limits handed to a conversion job.
//!
//! How a caller ends up on a plan is decided outside this crate; jobs only
//! ever see the resolved [`Entitlements`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBox {
    pub width: u32,
    pub height: u32,
}

impl ImageBox {
    #[must_use]
    pub const fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlements {
    pub max_products: usize,
    pub images: bool,
    /// JPEG quality, 1..=100.
    pub image_quality: u8,
    pub image_box: ImageBox,
    pub market_analysis: bool,
    pub custom_strategy: bool,
    pub analytics_sheet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Demo,
    Trial,
    Base,
    Professional,
    Enterprise,
    Vip,
    Admin,
}

const UNLIMITED: usize = 99_999;

impl Plan {
    #[must_use]
    pub fn entitlements(self) -> Entitlements {
        let hd = ImageBox::square(800);
        match self {
            Plan::Demo => Entitlements {
                max_products: 5,
                images: false,
                image_quality: 85,
                image_box: ImageBox::square(400),
                market_analysis: false,
                custom_strategy: false,
                analytics_sheet: false,
            },
            Plan::Trial => Entitlements {
                max_products: 10,
                images: true,
                image_quality: 95,
                image_box: hd,
                market_analysis: true,
                custom_strategy: false,
                analytics_sheet: false,
            },
            Plan::Base => Entitlements {
                max_products: 100,
                images: false,
                image_quality: 85,
                image_box: ImageBox::square(400),
                market_analysis: false,
                custom_strategy: false,
                analytics_sheet: false,
            },
            Plan::Professional => Entitlements {
                max_products: 500,
                images: true,
                image_quality: 95,
                image_box: hd,
                market_analysis: true,
                custom_strategy: true,
                analytics_sheet: true,
            },
            Plan::Enterprise | Plan::Vip | Plan::Admin => Entitlements {
                max_products: UNLIMITED,
                images: true,
                image_quality: 95,
                image_box: hd,
                market_analysis: true,
                custom_strategy: true,
                analytics_sheet: true,
            },
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Demo => "demo",
            Plan::Trial => "trial",
            Plan::Base => "base",
            Plan::Professional => "professional",
            Plan::Enterprise => "enterprise",
            Plan::Vip => "vip",
            Plan::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(Plan::Demo),
            "trial" => Ok(Plan::Trial),
            "base" => Ok(Plan::Base),
            "professional" => Ok(Plan::Professional),
            "enterprise" => Ok(Plan::Enterprise),
            "vip" => Ok(Plan::Vip),
            "admin" => Ok(Plan::Admin),
            other => Err(format!("unknown plan '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_and_base_have_no_images_or_market() {
        for plan in [Plan::Demo, Plan::Base] {
            let e = plan.entitlements();
            assert!(!e.images, "{plan} should not include images");
            assert!(!e.market_analysis, "{plan} should not include market analysis");
        }
    }

    #[test]
    fn custom_strategy_starts_at_professional() {
        assert!(!Plan::Trial.entitlements().custom_strategy);
        assert!(Plan::Professional.entitlements().custom_strategy);
        assert!(Plan::Admin.entitlements().custom_strategy);
    }

    #[test]
    fn product_limits_follow_plan_order() {
        assert_eq!(Plan::Demo.entitlements().max_products, 5);
        assert_eq!(Plan::Trial.entitlements().max_products, 10);
        assert_eq!(Plan::Base.entitlements().max_products, 100);
        assert_eq!(Plan::Professional.entitlements().max_products, 500);
        assert_eq!(Plan::Vip.entitlements().max_products, 99_999);
    }

    #[test]
    fn plan_parses_from_lowercase_names() {
        assert_eq!("Enterprise".parse::<Plan>().unwrap(), Plan::Enterprise);
        assert!("gold".parse::<Plan>().is_err());
    }
}
