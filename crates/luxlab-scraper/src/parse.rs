//! Turns one fetched catalog page into product records.
//!
//! Parsing is synchronous: `scraper::Html` is not `Send`, so the document
//! is built and dropped here and never held across an `.await`.

use luxlab_core::ProductRecord;
use rand::Rng;
use reqwest::Url;
use scraper::Html;

use crate::extract::FieldExtractor;
use crate::selector::CompiledSelectors;

/// Extracts at most `limit` records from `html`.
///
/// `already_extracted` is the number of records taken from earlier pages; the
/// entry index used for SKUs and placeholder names continues from it.
pub fn parse_catalog_page<R: Rng + ?Sized>(
    html: &str,
    selectors: &CompiledSelectors,
    page_url: &Url,
    already_extracted: usize,
    limit: usize,
    rng: &mut R,
) -> Vec<ProductRecord> {
    if limit == 0 {
        return Vec::new();
    }

    let document = Html::parse_document(html);
    let entries = selectors.entries(&document);
    let extractor = FieldExtractor::new(selectors, page_url.clone());

    entries
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, entry)| extractor.extract(entry, already_extracted + i + 1, rng))
        .collect()
}
