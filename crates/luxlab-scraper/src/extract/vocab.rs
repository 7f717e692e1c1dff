//! Closed vocabularies used for detection and synthetic fallbacks.

use luxlab_core::{Category, Gender};

pub const BRANDS: [&str; 14] = [
    "GUCCI",
    "PRADA",
    "VALENTINO",
    "VERSACE",
    "FENDI",
    "DOLCE&GABBANA",
    "BALENCIAGA",
    "GIVENCHY",
    "SAINT LAURENT",
    "BOTTEGA VENETA",
    "BURBERRY",
    "CELINE",
    "LOEWE",
    "MARNI",
];

/// Checked in order; the first category with a keyword in the name wins.
/// Keywords match whole words, and the last word of a keyword may take a
/// plural `s` or `es`.
const CATEGORY_KEYWORDS: [(Category, &[&str]); 5] = [
    (
        Category::Bags,
        &["bag", "handbag", "borsa", "borse", "clutch", "tote", "backpack", "crossbody"],
    ),
    (
        Category::Shoes,
        &["shoe", "sneaker", "boot", "sandal", "pump", "loafer", "mule", "slide"],
    ),
    (
        Category::ReadyToWear,
        &[
            "dress", "shirt", "jacket", "coat", "trouser", "skirt", "knit", "knitwear",
            "sweater", "cardigan", "blazer",
        ],
    ),
    (
        Category::SmallLeather,
        &[
            "wallet", "card holder", "cardholder", "key", "keyring", "pouch", "portafoglio",
            "portafogli",
        ],
    ),
    (
        Category::Accessories,
        &[
            "belt", "scarf", "scarves", "hat", "jewel", "jewelry", "jewellery", "watch",
            "sunglass", "bracelet",
        ],
    ),
];

const FEMALE_WORDS: [&str; 7] = ["woman", "women", "womens", "donna", "female", "ladies", "girl"];
const MALE_WORDS: [&str; 6] = ["man", "men", "uomo", "male", "mens", "boy"];

const COLORS: [(&str, &str); 14] = [
    ("black", "NERO"),
    ("nero", "NERO"),
    ("white", "BIANCO"),
    ("ivory", "AVORIO"),
    ("red", "ROSSO"),
    ("blue", "BLU"),
    ("navy", "BLU"),
    ("green", "VERDE"),
    ("brown", "MARRONE"),
    ("grey", "GRIGIO"),
    ("gray", "GRIGIO"),
    ("beige", "BEIGE"),
    ("pink", "ROSA"),
    ("camel", "CAMMELLO"),
];

pub const FALLBACK_COLORS: [&str; 5] = ["NERO", "CAMMELLO", "AVORIO", "COGNAC", "BORDEAUX"];

const MATERIALS: [(&str, &str); 10] = [
    ("leather", "PELLE"),
    ("pelle", "PELLE"),
    ("suede", "CAMOSCIO"),
    ("silk", "SETA"),
    ("wool", "LANA"),
    ("cashmere", "CASHMERE"),
    ("cotton", "COTONE"),
    ("canvas", "TELA"),
    ("nylon", "NYLON"),
    ("denim", "DENIM"),
];

pub const FALLBACK_MATERIALS: [&str; 4] = ["PELLE", "TESSUTO", "PELLE DI VITELLO", "TELA"];

/// Brand whose name appears in `text`, matched case-insensitively.
pub fn brand_in(text: &str) -> Option<&'static str> {
    let upper = text.to_uppercase();
    BRANDS.iter().copied().find(|b| upper.contains(b))
}

/// Whole-word match so that "chateau" is never read as "hat".
pub fn category_in(text: &str) -> Option<Category> {
    let lower = text.to_lowercase();
    let words = words(&lower);
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| has_keyword(&words, kw)))
        .map(|(category, _)| *category)
}

fn words(lower: &str) -> Vec<&str> {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

fn has_keyword(words: &[&str], keyword: &str) -> bool {
    let parts: Vec<&str> = keyword.split(' ').collect();
    let Some((last, lead)) = parts.split_last() else {
        return false;
    };
    words.windows(parts.len()).any(|window| {
        window[..lead.len()] == *lead && is_plural_of(window[lead.len()], last)
    })
}

fn is_plural_of(word: &str, stem: &str) -> bool {
    word.strip_prefix(stem)
        .is_some_and(|rest| matches!(rest, "" | "s" | "es"))
}

/// Whole-word match so that "women" is never read as "men".
pub fn gender_in(text: &str) -> Gender {
    let lower = text.to_lowercase();
    let words = words(&lower);
    if words.iter().any(|w| FEMALE_WORDS.contains(w)) {
        Gender::Female
    } else if words.iter().any(|w| MALE_WORDS.contains(w)) {
        Gender::Male
    } else {
        Gender::Unisex
    }
}

pub fn color_in(text: &str) -> Option<&'static str> {
    lookup_word(text, &COLORS)
}

pub fn material_in(text: &str) -> Option<&'static str> {
    lookup_word(text, &MATERIALS)
}

fn lookup_word(text: &str, table: &[(&str, &'static str)]) -> Option<&'static str> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .find_map(|word| table.iter().find(|(k, _)| *k == word).map(|(_, v)| *v))
}

pub fn subcategories(category: Category) -> &'static [&'static str] {
    match category {
        Category::Bags => &["Shoulder Bags", "Tote Bags", "Clutches", "Crossbody"],
        Category::Shoes => &["Pumps", "Sneakers", "Boots", "Sandals", "Flats"],
        Category::ReadyToWear => &["Dresses", "Outerwear", "Knitwear", "Shirts"],
        Category::Accessories => &["Belts", "Scarves", "Jewelry", "Sunglasses"],
        Category::SmallLeather => &["Wallets", "Card Holders", "Key Rings", "Pouches"],
    }
}

/// Full size run offered for a category, in display order.
pub fn size_run(category: Category) -> &'static [&'static str] {
    match category {
        Category::Bags | Category::SmallLeather => &["UNI"],
        Category::Shoes => &["35", "36", "37", "38", "39", "40", "41", "42"],
        Category::ReadyToWear => &["XS", "S", "M", "L", "XL"],
        Category::Accessories => &["70", "75", "80", "85", "90", "95", "100", "105"],
    }
}

/// Per-size stock quantities and their relative weights.
pub const QUANTITY_WEIGHTS: [(u32, u32); 5] = [(0, 20), (1, 30), (2, 25), (3, 15), (4, 10)];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_detection_is_case_insensitive() {
        assert_eq!(brand_in("Prada Re-Edition nylon bag"), Some("PRADA"));
        assert_eq!(brand_in("Bottega Veneta Jodie"), Some("BOTTEGA VENETA"));
        assert_eq!(brand_in("Unbranded tote"), None);
    }

    #[test]
    fn category_detection_uses_keyword_order() {
        assert_eq!(category_in("Medium Tote"), Some(Category::Bags));
        assert_eq!(category_in("Leather loafers"), Some(Category::Shoes));
        assert_eq!(category_in("Silk shirt"), Some(Category::ReadyToWear));
        assert_eq!(category_in("Zip wallet"), Some(Category::SmallLeather));
        assert_eq!(category_in("Logo belt"), Some(Category::Accessories));
        assert_eq!(category_in("Something"), None);
    }

    #[test]
    fn category_keywords_match_whole_words() {
        assert_eq!(category_in("Off-the-shoulder dress"), Some(Category::ReadyToWear));
        assert_eq!(category_in("Monkey tee"), None);
        assert_eq!(category_in("Chateau print"), None);
        assert_eq!(category_in("Mini handbag"), Some(Category::Bags));
    }

    #[test]
    fn category_keywords_accept_plurals_and_phrases() {
        assert_eq!(category_in("Dresses"), Some(Category::ReadyToWear));
        assert_eq!(category_in("Oversized sunglasses"), Some(Category::Accessories));
        assert_eq!(category_in("Shoulder Bags"), Some(Category::Bags));
        assert_eq!(category_in("Leather card holder"), Some(Category::SmallLeather));
        assert_eq!(category_in("Card holders"), Some(Category::SmallLeather));
        assert_eq!(category_in("Cardigan"), Some(Category::ReadyToWear));
    }

    #[test]
    fn gender_prefers_female_and_matches_whole_words() {
        assert_eq!(gender_in("Women's sneakers"), Gender::Female);
        assert_eq!(gender_in("Men's loafers"), Gender::Male);
        assert_eq!(gender_in("Scarf for ladies and men"), Gender::Female);
        assert_eq!(gender_in("Garment bag"), Gender::Unisex);
    }

    #[test]
    fn color_maps_to_trade_names() {
        assert_eq!(color_in("Black leather tote"), Some("NERO"));
        assert_eq!(color_in("Navy coat"), Some("BLU"));
        assert_eq!(color_in("Bordered bag"), None);
    }

    #[test]
    fn material_matches_whole_words() {
        assert_eq!(material_in("Suede boots"), Some("CAMOSCIO"));
        assert_eq!(material_in("Silky"), None);
    }

    #[test]
    fn size_runs_are_non_empty() {
        for category in Category::ALL {
            assert!(!size_run(category).is_empty());
            assert!(!subcategories(category).is_empty());
        }
    }
}
