use std::collections::BTreeMap;

use luxlab_core::{Category, Gender, ProductRecord, Sourced};
use luxlab_pricing::{MarketPosition, PricedProduct, PricingOutcome};

pub(crate) fn product(sizes: &[(&str, u32)], retail: f64, proposed: f64) -> PricedProduct {
    branded("PRADA", sizes, retail, proposed)
}

pub(crate) fn branded(brand: &str, sizes: &[(&str, u32)], retail: f64, proposed: f64) -> PricedProduct {
    let size_quantities: BTreeMap<String, u32> =
        sizes.iter().map(|(s, q)| ((*s).to_string(), *q)).collect();
    PricedProduct {
        record: ProductRecord {
            id: "LXB25030001-0a1b".into(),
            sku: "LXB25030001".into(),
            model_code: "SKU0A1B2C3D".into(),
            name: Sourced::Extracted("Re-Edition 2005".into()),
            brand: Sourced::Extracted(brand.into()),
            category: Sourced::Extracted(Category::Bags),
            subcategory: "Shoulder Bags".into(),
            gender: Gender::Female,
            color: Sourced::Extracted("NERO".into()),
            material: Sourced::Synthesized("TELA".into()),
            season: "SS25".into(),
            sizes: sizes.iter().map(|(s, _)| (*s).to_string()).collect(),
            size_quantities,
            retail_price: Sourced::Extracted(retail),
            selected: true,
            image_url: None,
            market_name: "Re-Edition 2005 nylon shoulder bag".into(),
        },
        pricing: PricingOutcome {
            retail,
            proposed,
            discount_pct: ((1.0 - proposed / retail) * 100.0).round(),
            margin: 1.0 - proposed / retail,
            position: MarketPosition::Competitive,
        },
    }
}
