//! Field extraction for a single catalog entry.

pub mod price;
pub mod vocab;

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use luxlab_core::{Category, ProductRecord, Sourced};
use rand::Rng;
use reqwest::Url;
use scraper::ElementRef;
use sha2::{Digest, Sha256};

use crate::client::resolve_url;
use crate::selector::{element_text, CompiledSelectors};

/// Longest display name written to the report.
pub const MAX_NAME_CHARS: usize = 50;

/// Bounds for the synthetic retail price, in EUR.
pub const FALLBACK_PRICE_RANGE: std::ops::RangeInclusive<u32> = 500..=3000;

/// Extracted text must be longer than this to count as a match.
const MIN_TEXT_CHARS: usize = 2;

/// Turns entry fragments into [`ProductRecord`]s.
///
/// Extraction never fails: each field falls back to a synthetic value tagged
/// [`Sourced::Synthesized`].
pub struct FieldExtractor<'s> {
    selectors: &'s CompiledSelectors,
    base: Url,
    now: DateTime<Utc>,
}

impl<'s> FieldExtractor<'s> {
    #[must_use]
    pub fn new(selectors: &'s CompiledSelectors, base: Url) -> Self {
        Self {
            selectors,
            base,
            now: Utc::now(),
        }
    }

    /// Fixes the clock used for SKUs and season codes.
    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Builds a record for the entry at 1-based `index`.
    pub fn extract<R: Rng + ?Sized>(
        &self,
        fragment: ElementRef<'_>,
        index: usize,
        rng: &mut R,
    ) -> ProductRecord {
        let full_name = self.name(fragment, index);
        let market_name = full_name.value().clone();
        let name = full_name.map(|n| n.chars().take(MAX_NAME_CHARS).collect::<String>());

        let brand = self.brand(fragment, &market_name, rng);
        let retail_price = self.price(fragment).map_or_else(
            || Sourced::Synthesized(f64::from(rng.random_range(FALLBACK_PRICE_RANGE))),
            Sourced::Extracted,
        );
        let category = vocab::category_in(&market_name)
            .map_or(Sourced::Synthesized(Category::Accessories), Sourced::Extracted);
        let gender = vocab::gender_in(&market_name);
        let color = self.color(fragment, &market_name, rng);
        let material = self.material(fragment, &market_name, rng);
        let subcategory = pick(rng, vocab::subcategories(*category.value())).to_string();
        let sizes = sizes_for(*category.value(), rng);
        let size_quantities = sizes
            .iter()
            .map(|s| (s.clone(), weighted_quantity(rng)))
            .collect::<BTreeMap<_, _>>();

        let sku = format!("LXB{}{index:04}", self.now.format("%y%m"));
        let id = format!("{sku}-{:04x}", rng.random::<u16>());

        ProductRecord {
            id,
            sku,
            model_code: model_code(name.value()),
            name,
            brand,
            category,
            subcategory,
            gender,
            color,
            material,
            season: season_code(self.now),
            sizes,
            size_quantities,
            retail_price,
            selected: rng.random::<f64>() > 0.7,
            image_url: self.image_url(fragment),
            market_name,
        }
    }

    fn name(&self, fragment: ElementRef<'_>, index: usize) -> Sourced<String> {
        let from_cascade = self
            .selectors
            .name
            .first_match(fragment, |el| plausible(element_text(el)));
        if let Some(name) = from_cascade {
            return Sourced::Extracted(name);
        }

        // Link-fallback entries are bare anchors: their own text is the name.
        if fragment.value().name() == "a" {
            if let Some(text) = plausible(element_text(fragment)) {
                return Sourced::Extracted(text);
            }
        }

        fragment
            .value()
            .attr("title")
            .and_then(|t| plausible(t.trim().to_string()))
            .map_or_else(
                || Sourced::Synthesized(format!("Luxury Item {index}")),
                Sourced::Extracted,
            )
    }

    fn brand<R: Rng + ?Sized>(
        &self,
        fragment: ElementRef<'_>,
        name: &str,
        rng: &mut R,
    ) -> Sourced<String> {
        if let Some(brand) = vocab::brand_in(name) {
            return Sourced::Extracted(brand.to_string());
        }
        self.selectors
            .brand
            .first_match(fragment, |el| {
                let text = element_text(el);
                (text.chars().count() > 1).then(|| text.to_uppercase())
            })
            .map_or_else(
                || Sourced::Synthesized(pick(rng, &vocab::BRANDS).to_string()),
                Sourced::Extracted,
            )
    }

    fn price(&self, fragment: ElementRef<'_>) -> Option<f64> {
        self.selectors.price.first_match(fragment, |el| {
            el.value()
                .attr("content")
                .and_then(price::parse_plain_amount)
                .or_else(|| price::parse_price(&element_text(el)))
        })
    }

    fn color<R: Rng + ?Sized>(
        &self,
        fragment: ElementRef<'_>,
        name: &str,
        rng: &mut R,
    ) -> Sourced<String> {
        self.selectors
            .color
            .first_match(fragment, |el| vocab::color_in(&element_text(el)))
            .or_else(|| vocab::color_in(name))
            .map_or_else(
                || Sourced::Synthesized(pick(rng, &vocab::FALLBACK_COLORS).to_string()),
                |c| Sourced::Extracted(c.to_string()),
            )
    }

    fn material<R: Rng + ?Sized>(
        &self,
        fragment: ElementRef<'_>,
        name: &str,
        rng: &mut R,
    ) -> Sourced<String> {
        self.selectors
            .material
            .first_match(fragment, |el| vocab::material_in(&element_text(el)))
            .or_else(|| vocab::material_in(name))
            .map_or_else(
                || Sourced::Synthesized(pick(rng, &vocab::FALLBACK_MATERIALS).to_string()),
                |m| Sourced::Extracted(m.to_string()),
            )
    }

    fn image_url(&self, fragment: ElementRef<'_>) -> Option<String> {
        let from_element = |el: ElementRef<'_>| {
            self.selectors
                .image_attributes
                .iter()
                .filter_map(|attr| el.value().attr(attr))
                .find_map(|raw| resolve_url(&self.base, raw))
        };
        self.selectors.image.first_match(fragment, from_element)
    }
}

fn plausible(text: String) -> Option<String> {
    let count = text.chars().count();
    (count > MIN_TEXT_CHARS && count <= 300).then_some(text)
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

/// Size run for `category`. Runs longer than three keep a random subset of
/// `n - 2 ..= n` sizes, in run order.
fn sizes_for<R: Rng + ?Sized>(category: Category, rng: &mut R) -> Vec<String> {
    let run = vocab::size_run(category);
    let mut sizes: Vec<String> = run.iter().map(|s| (*s).to_string()).collect();
    if run.len() > 3 {
        let keep = rng.random_range(run.len() - 2..=run.len());
        while sizes.len() > keep {
            let i = rng.random_range(0..sizes.len());
            sizes.remove(i);
        }
    }
    sizes
}

fn weighted_quantity<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    let total: u32 = vocab::QUANTITY_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0..total);
    for (qty, weight) in vocab::QUANTITY_WEIGHTS {
        if roll < weight {
            return qty;
        }
        roll -= weight;
    }
    0
}

/// `SS<yy>` for March through August, `FW<yy>` otherwise.
pub fn season_code(now: DateTime<Utc>) -> String {
    let yy = now.year() % 100;
    if (3..=8).contains(&now.month()) {
        format!("SS{yy:02}")
    } else {
        format!("FW{yy:02}")
    }
}

/// Model code derived from the display name only.
pub fn model_code(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    let hex: String = digest.iter().take(4).map(|b| format!("{b:02X}")).collect();
    format!("SKU{hex}")
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
