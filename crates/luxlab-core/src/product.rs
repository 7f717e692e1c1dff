//! Extracted catalog entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where a field value came from.
///
/// Fields that could not be read from the page get a plausible generated
/// value instead of failing the record; the tag keeps that distinction
/// visible to callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sourced<T> {
    Extracted(T),
    Synthesized(T),
}

impl<T> Sourced<T> {
    pub fn value(&self) -> &T {
        match self {
            Sourced::Extracted(v) | Sourced::Synthesized(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Sourced::Extracted(v) | Sourced::Synthesized(v) => v,
        }
    }

    pub fn is_extracted(&self) -> bool {
        matches!(self, Sourced::Extracted(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        match self {
            Sourced::Extracted(v) => Sourced::Extracted(f(v)),
            Sourced::Synthesized(v) => Sourced::Synthesized(f(v)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "BAGS")]
    Bags,
    #[serde(rename = "SHOES")]
    Shoes,
    #[serde(rename = "READY-TO-WEAR")]
    ReadyToWear,
    #[serde(rename = "ACCESSORIES")]
    Accessories,
    #[serde(rename = "SMALL LEATHER")]
    SmallLeather,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Bags,
        Category::Shoes,
        Category::ReadyToWear,
        Category::Accessories,
        Category::SmallLeather,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Bags => "BAGS",
            Category::Shoes => "SHOES",
            Category::ReadyToWear => "READY-TO-WEAR",
            Category::Accessories => "ACCESSORIES",
            Category::SmallLeather => "SMALL LEATHER",
        }
    }

    /// Macro group label used in the report's `MACRO` column.
    #[must_use]
    pub fn macro_group(self) -> &'static str {
        match self {
            Category::ReadyToWear => "APPAREL",
            Category::Bags | Category::Shoes | Category::Accessories | Category::SmallLeather => {
                "ACCESSORI"
            }
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "M")]
    Male,
    Unisex,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "F",
            Gender::Male => "M",
            Gender::Unisex => "Unisex",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted catalog entry.
///
/// `id`, `sku` and `model_code` are generated locally and never copied from
/// the source page. `image_url` and `market_name` stay in memory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub sku: String,
    pub model_code: String,
    pub name: Sourced<String>,
    pub brand: Sourced<String>,
    pub category: Sourced<Category>,
    pub subcategory: String,
    pub gender: Gender,
    pub color: Sourced<String>,
    pub material: Sourced<String>,
    pub season: String,
    pub sizes: Vec<String>,
    pub size_quantities: BTreeMap<String, u32>,
    pub retail_price: Sourced<f64>,
    pub selected: bool,
    #[serde(skip)]
    pub image_url: Option<String>,
    #[serde(skip)]
    pub market_name: String,
}

impl ProductRecord {
    #[must_use]
    pub fn retail_price(&self) -> f64 {
        *self.retail_price.value()
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.size_quantities.values().sum()
    }

    /// Quantity for `size`, zero when the product does not offer it.
    #[must_use]
    pub fn quantity_for(&self, size: &str) -> u32 {
        self.size_quantities.get(size).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProductRecord {
        ProductRecord {
            id: "LXB26100001-ab12".to_string(),
            sku: "LXB26100001".to_string(),
            model_code: "SKU1A2B3C4D".to_string(),
            name: Sourced::Extracted("Leather Tote".to_string()),
            brand: Sourced::Extracted("PRADA".to_string()),
            category: Sourced::Extracted(Category::Bags),
            subcategory: "Tote Bags".to_string(),
            gender: Gender::Female,
            color: Sourced::Synthesized("NERO".to_string()),
            material: Sourced::Synthesized("PELLE".to_string()),
            season: "FW26".to_string(),
            sizes: vec!["UNI".to_string()],
            size_quantities: BTreeMap::from([("UNI".to_string(), 3)]),
            retail_price: Sourced::Extracted(1890.0),
            selected: false,
            image_url: Some("https://cdn.example.com/a.jpg".to_string()),
            market_name: "Leather Tote".to_string(),
        }
    }

    #[test]
    fn sourced_accessors_ignore_provenance() {
        let a = Sourced::Extracted(3);
        let b = Sourced::Synthesized(3);
        assert_eq!(a.value(), b.value());
        assert!(a.is_extracted());
        assert!(!b.is_extracted());
        assert_eq!(b.map(|v| v * 2), Sourced::Synthesized(6));
    }

    #[test]
    fn quantity_for_missing_size_is_zero() {
        let p = sample();
        assert_eq!(p.quantity_for("UNI"), 3);
        assert_eq!(p.quantity_for("M"), 0);
        assert_eq!(p.total_quantity(), 3);
    }

    #[test]
    fn hidden_fields_are_not_serialized() {
        let json = serde_json::to_value(sample()).expect("serialize");
        assert!(json.get("image_url").is_none());
        assert!(json.get("market_name").is_none());
        assert_eq!(json["category"]["extracted"], "BAGS");
        assert_eq!(json["gender"], "F");
    }
}
