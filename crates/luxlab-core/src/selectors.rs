use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Ordered CSS selectors per semantic field. Earlier entries win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelectors {
    pub name: Vec<String>,
    pub price: Vec<String>,
    pub brand: Vec<String>,
    pub color: Vec<String>,
    pub material: Vec<String>,
    pub image: Vec<String>,
}

/// Selector cascades for locating catalog entries and reading their fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Entry container selectors, tried in order until one matches.
    pub items: Vec<String>,
    /// Anchors whose `href` contains this token are used as entries when no
    /// container selector matches. `None` disables the fallback.
    #[serde(default)]
    pub link_fallback: Option<String>,
    pub fields: FieldSelectors,
    /// Image attributes in lookup order (lazy-loading attributes first).
    pub image_attributes: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            items: strings(&[
                r#"article[class*="product"]"#,
                r#"div[class*="product-item"]"#,
                r#"div[class*="product-card"]"#,
                r#"li[class*="product"]"#,
                r#"[data-test*="product"]"#,
                r#"div[class*="item"][class*="grid"]"#,
                "div[data-product]",
                r#"[itemtype*="schema.org/Product"]"#,
            ]),
            link_fallback: Some("product".to_string()),
            fields: FieldSelectors {
                name: strings(&[
                    "h1",
                    "h2",
                    "h3",
                    r#"[itemprop="name"]"#,
                    r#"[class*="name"]"#,
                    r#"[class*="title"]"#,
                ]),
                price: strings(&[
                    r#"[itemprop="price"]"#,
                    r#"[class*="price"]"#,
                    ".price",
                    r#"span[class*="amount"]"#,
                ]),
                brand: strings(&[r#"[class*="brand"]"#, r#"[itemprop="brand"]"#]),
                color: strings(&[r#"[class*="color"]"#, r#"[class*="colour"]"#]),
                material: strings(&[r#"[class*="material"]"#, r#"[class*="composition"]"#]),
                image: strings(&["img", "source"]),
            },
            image_attributes: strings(&["data-src", "data-lazy", "data-original", "src"]),
        }
    }
}

/// Load and validate selector cascades from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_selector_config(path: &Path) -> Result<SelectorConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SelectorsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: SelectorConfig = serde_yaml::from_str(&content)?;
    validate_selector_config(&config)?;
    Ok(config)
}

fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    if config.items.is_empty() && config.link_fallback.is_none() {
        return Err(ConfigError::Validation(
            "selectors: `items` is empty and no `link_fallback` is set".to_string(),
        ));
    }

    let fields = [
        ("name", &config.fields.name),
        ("price", &config.fields.price),
        ("brand", &config.fields.brand),
        ("color", &config.fields.color),
        ("material", &config.fields.material),
        ("image", &config.fields.image),
    ];
    for (field, list) in fields {
        if list.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "selectors: field '{field}' contains an empty selector"
            )));
        }
    }

    if config.image_attributes.is_empty() {
        return Err(ConfigError::Validation(
            "selectors: `image_attributes` must list at least one attribute".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        validate_selector_config(&SelectorConfig::default()).expect("default valid");
    }

    #[test]
    fn parses_yaml_without_link_fallback() {
        let yaml = r#"
items: ["li.tile"]
fields:
  name: [".tile-name"]
  price: [".tile-price"]
  brand: []
  color: []
  material: []
  image: ["img"]
image_attributes: ["src"]
"#;
        let config: SelectorConfig = serde_yaml::from_str(yaml).expect("parse");
        validate_selector_config(&config).expect("valid");
        assert_eq!(config.items, vec!["li.tile".to_string()]);
        assert!(config.link_fallback.is_none());
    }

    #[test]
    fn rejects_config_with_no_way_to_find_entries() {
        let mut config = SelectorConfig::default();
        config.items.clear();
        config.link_fallback = None;
        assert!(matches!(
            validate_selector_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_blank_field_selector() {
        let mut config = SelectorConfig::default();
        config.fields.price.push("  ".to_string());
        let err = validate_selector_config(&config).unwrap_err();
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_selector_config(Path::new("/nonexistent/selectors.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::SelectorsFileIo { .. }));
    }
}
