//! URL origin and reference resolution for catalog pages.

use reqwest::Url;

/// Extracts the scheme+host origin from a page URL.
///
/// Given `"https://shop.example.com/women/bags?page=2"`, returns
/// `"https://shop.example.com"`.
#[must_use]
pub fn extract_origin(page_url: &str) -> String {
    Url::parse(page_url).map_or_else(
        |e| {
            tracing::warn!(
                page_url,
                error = %e,
                "could not parse page URL, falling back to string split for origin"
            );
            page_url
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Resolves an image or link reference found on `base`.
///
/// Handles absolute, protocol-relative (`//cdn...`), root-relative (`/img/..`)
/// and page-relative references. Returns `None` for empty values, inline
/// `data:` URIs and anything that does not resolve to http(s).
#[must_use]
pub fn resolve_url(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") || raw.starts_with('#') {
        return None;
    }

    // srcset-style values: keep the first candidate.
    let raw = raw.split_whitespace().next().unwrap_or(raw);

    let resolved = if let Some(rest) = raw.strip_prefix("//") {
        Url::parse(&format!("{}://{rest}", base.scheme())).ok()?
    } else {
        base.join(raw).ok()?
    };

    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Hostname of `page_url`, or the input itself when it does not parse.
#[must_use]
pub fn extract_domain(page_url: &str) -> String {
    Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| page_url.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://shop.example.com/women/bags?page=2").unwrap()
    }

    #[test]
    fn origin_strips_path_and_query() {
        assert_eq!(
            extract_origin("https://shop.example.com/women/bags?page=2"),
            "https://shop.example.com"
        );
    }

    #[test]
    fn resolves_protocol_relative() {
        assert_eq!(
            resolve_url(&base(), "//cdn.example.com/a.jpg").as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
    }

    #[test]
    fn resolves_root_relative() {
        assert_eq!(
            resolve_url(&base(), "/media/a.jpg").as_deref(),
            Some("https://shop.example.com/media/a.jpg")
        );
    }

    #[test]
    fn resolves_page_relative() {
        assert_eq!(
            resolve_url(&base(), "thumbs/a.jpg").as_deref(),
            Some("https://shop.example.com/women/thumbs/a.jpg")
        );
    }

    #[test]
    fn keeps_absolute_and_first_srcset_candidate() {
        assert_eq!(
            resolve_url(&base(), "https://img.example.net/x.png 2x").as_deref(),
            Some("https://img.example.net/x.png")
        );
    }

    #[test]
    fn rejects_data_uris_and_empty() {
        assert_eq!(resolve_url(&base(), "data:image/gif;base64,R0lG"), None);
        assert_eq!(resolve_url(&base(), "   "), None);
        assert_eq!(resolve_url(&base(), "javascript:void(0)"), None);
    }

    #[test]
    fn domain_strips_scheme() {
        assert_eq!(extract_domain("https://shop.example.com/x"), "shop.example.com");
        assert_eq!(extract_domain("nope"), "nope");
    }
}
