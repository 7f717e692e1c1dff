//! Query-parameter pagination.
//!
//! Catalog listings are paged with a `page` query parameter. The URL the
//! caller submitted is the first page fetched, numbered by its own `page`
//! value (1 when absent); later pages set or replace `page=<n>` and keep
//! every other parameter in its original order.

use reqwest::Url;

/// Query parameter carrying the page number.
pub const PAGE_PARAM: &str = "page";

/// Page number of the submitted URL itself. Missing or unusable values
/// count as page 1.
#[must_use]
pub fn start_page(base: &Url) -> u32 {
    base.query_pairs()
        .find(|(k, _)| k == PAGE_PARAM)
        .and_then(|(_, v)| v.trim().parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// URL for 1-based `page` of the listing at `base`. Pages at or before
/// [`start_page`] resolve to `base` unchanged.
#[must_use]
pub fn page_url(base: &Url, page: u32) -> Url {
    if page <= start_page(base) {
        return base.clone();
    }

    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(k, _)| k != PAGE_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = base.clone();
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (k, v) in &kept {
            query.append_pair(k, v);
        }
        query.append_pair(PAGE_PARAM, &page.to_string());
    }
    url
}
