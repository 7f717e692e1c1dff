//! Ordered selector cascades.
//!
//! Each semantic field owns a [`Cascade`]: a list of compiled CSS selectors
//! evaluated by a single first-match-wins combinator. Adding a site-specific
//! pattern means adding a selector string to the configuration.

use luxlab_core::{ConfigError, SelectorConfig};
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone)]
pub struct SelectorRule {
    pub css: String,
    selector: Selector,
}

impl SelectorRule {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if `css` is not a valid selector.
    pub fn parse(css: &str) -> Result<Self, ConfigError> {
        let selector = Selector::parse(css)
            .map_err(|e| ConfigError::Validation(format!("invalid selector '{css}': {e}")))?;
        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cascade {
    rules: Vec<SelectorRule>,
}

impl Cascade {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for the first invalid selector.
    pub fn compile<S: AsRef<str>>(selectors: &[S]) -> Result<Self, ConfigError> {
        let rules = selectors
            .iter()
            .map(|s| SelectorRule::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Tries each rule in order against the descendants of `scope`; the first
    /// element for which `probe` yields a value wins.
    pub fn first_match<'a, T>(
        &self,
        scope: ElementRef<'a>,
        mut probe: impl FnMut(ElementRef<'a>) -> Option<T>,
    ) -> Option<T> {
        self.rules
            .iter()
            .find_map(|rule| scope.select(&rule.selector).find_map(&mut probe))
    }

    /// All elements matched by the first rule that matches anything, with the
    /// winning rule's selector text.
    pub fn first_nonempty<'a>(&self, document: &'a Html) -> Option<(&str, Vec<ElementRef<'a>>)> {
        self.rules.iter().find_map(|rule| {
            let found: Vec<ElementRef<'a>> = document.select(&rule.selector).collect();
            (!found.is_empty()).then_some((rule.css.as_str(), found))
        })
    }
}

/// Compiled form of [`SelectorConfig`].
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub items: Cascade,
    pub link_fallback: Option<String>,
    pub name: Cascade,
    pub price: Cascade,
    pub brand: Cascade,
    pub color: Cascade,
    pub material: Cascade,
    pub image: Cascade,
    pub image_attributes: Vec<String>,
    anchors: Selector,
}

impl CompiledSelectors {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any selector fails to parse.
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            items: Cascade::compile(&config.items)?,
            link_fallback: config
                .link_fallback
                .as_ref()
                .map(|token| token.to_lowercase()),
            name: Cascade::compile(&config.fields.name)?,
            price: Cascade::compile(&config.fields.price)?,
            brand: Cascade::compile(&config.fields.brand)?,
            color: Cascade::compile(&config.fields.color)?,
            material: Cascade::compile(&config.fields.material)?,
            image: Cascade::compile(&config.fields.image)?,
            image_attributes: config.image_attributes.clone(),
            anchors: SelectorRule::parse("a[href]")?.selector,
        })
    }

    /// Catalog entry fragments on `document`.
    ///
    /// Container selectors are tried in order; when none matches, anchors
    /// whose `href` contains the link-fallback token are used instead.
    pub fn entries<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        if let Some((css, found)) = self.items.first_nonempty(document) {
            tracing::debug!(selector = css, count = found.len(), "matched entry containers");
            return found;
        }

        let Some(token) = &self.link_fallback else {
            return Vec::new();
        };
        let links: Vec<ElementRef<'a>> = document
            .select(&self.anchors)
            .filter(|a| {
                a.value()
                    .attr("href")
                    .is_some_and(|href| href.to_lowercase().contains(token.as_str()))
            })
            .collect();
        tracing::debug!(count = links.len(), "no entry containers matched, using link fallback");
        links
    }
}

impl Default for CompiledSelectors {
    fn default() -> Self {
        Self::compile(&SelectorConfig::default()).expect("built-in selectors are valid")
    }
}

/// Whitespace-collapsed text content of `el`.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
