use chrono::TimeZone;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scraper::{Html, Selector};

use super::*;

fn base() -> Url {
    Url::parse("https://shop.example.com/women/bags/").unwrap()
}

fn march_2025() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap()
}

fn extract_first(html: &str, index: usize) -> ProductRecord {
    let doc = Html::parse_document(html);
    let selectors = CompiledSelectors::default();
    let card = doc
        .select(&Selector::parse(".card").unwrap())
        .next()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    FieldExtractor::new(&selectors, base())
        .at(march_2025())
        .extract(card, index, &mut rng)
}

#[test]
fn extracts_fields_present_on_the_card() {
    let record = extract_first(
        r#"<div class="card">
             <h2>Gucci Black Leather Shoulder Bag</h2>
             <span class="price">€ 2.450</span>
             <img data-src="//cdn.example.com/img/1.jpg" src="data:image/gif;base64,AA">
           </div>"#,
        3,
    );

    assert_eq!(record.name, Sourced::Extracted("Gucci Black Leather Shoulder Bag".into()));
    assert_eq!(record.brand, Sourced::Extracted("GUCCI".into()));
    assert_eq!(record.retail_price, Sourced::Extracted(2450.0));
    assert_eq!(record.category, Sourced::Extracted(Category::Bags));
    assert_eq!(record.color, Sourced::Extracted("NERO".into()));
    assert_eq!(record.material, Sourced::Extracted("PELLE".into()));
    assert_eq!(record.image_url.as_deref(), Some("https://cdn.example.com/img/1.jpg"));
    assert_eq!(record.sku, "LXB25030003");
    assert!(record.id.starts_with("LXB25030003-"));
    assert_eq!(record.season, "SS25");
    assert_eq!(record.sizes, vec!["UNI".to_string()]);
}

#[test]
fn missing_price_is_synthesized_within_range() {
    let record = extract_first(r#"<div class="card"><h3>Prada Nylon Pouch</h3></div>"#, 1);
    assert!(!record.retail_price.is_extracted());
    let price = record.retail_price();
    assert!((500.0..=3000.0).contains(&price), "price {price} out of range");
}

#[test]
fn price_prefers_machine_readable_content_attribute() {
    let record = extract_first(
        r#"<div class="card"><h3>Fendi Baguette</h3>
           <meta itemprop="price" content="1890.00"></div>"#,
        1,
    );
    assert_eq!(record.retail_price, Sourced::Extracted(1890.0));
}

#[test]
fn missing_name_uses_positional_placeholder() {
    let record = extract_first(r#"<div class="card"><span class="price">€ 900</span></div>"#, 7);
    assert_eq!(record.name, Sourced::Synthesized("Luxury Item 7".into()));
    assert!(!record.brand.is_extracted());
    assert!(vocab::BRANDS.contains(&record.brand.value().as_str()));
}

#[test]
fn short_text_does_not_count_as_a_name() {
    let record = extract_first(r#"<div class="card"><h2>ab</h2><h3>Loewe Puzzle</h3></div>"#, 1);
    assert_eq!(record.name.value(), "Loewe Puzzle");
}

#[test]
fn long_names_are_truncated_but_market_name_is_kept() {
    let long = "Valentino Garavani Rockstud Spike Medium Quilted Nappa Leather Shoulder Bag";
    let record = extract_first(&format!(r#"<div class="card"><h2>{long}</h2></div>"#), 1);
    assert_eq!(record.name.value().chars().count(), MAX_NAME_CHARS);
    assert_eq!(record.market_name, long);
    assert_eq!(record.model_code, model_code(record.name.value()));
}

#[test]
fn unknown_category_defaults_to_accessories() {
    let record = extract_first(r#"<div class="card"><h2>Marni Objet</h2></div>"#, 1);
    assert_eq!(record.category, Sourced::Synthesized(Category::Accessories));
}

#[test]
fn long_size_runs_keep_a_subset_in_order() {
    let selectors = CompiledSelectors::default();
    let doc = Html::parse_document(r#"<div class="card"><h2>Celine Leather Boots</h2></div>"#);
    let card = doc.select(&Selector::parse(".card").unwrap()).next().unwrap();
    let run = vocab::size_run(Category::Shoes);

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let record = FieldExtractor::new(&selectors, base()).extract(card, 1, &mut rng);
        assert!((run.len() - 2..=run.len()).contains(&record.sizes.len()));
        let positions: Vec<usize> = record
            .sizes
            .iter()
            .map(|s| run.iter().position(|r| r == s).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(record.size_quantities.len(), record.sizes.len());
        assert!(record.size_quantities.values().all(|q| *q <= 4));
    }
}

#[test]
fn bare_anchor_entries_use_their_own_text() {
    let doc = Html::parse_document(r#"<a class="card" href="/product/9">Burberry Wool Scarf</a>"#);
    let selectors = CompiledSelectors::default();
    let anchor = doc.select(&Selector::parse("a").unwrap()).next().unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let record = FieldExtractor::new(&selectors, base()).extract(anchor, 2, &mut rng);
    assert_eq!(record.name, Sourced::Extracted("Burberry Wool Scarf".into()));
    assert_eq!(record.material, Sourced::Extracted("LANA".into()));
}

#[test]
fn season_code_splits_on_spring_summer_months() {
    assert_eq!(season_code(march_2025()), "SS25");
    let january = Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap();
    assert_eq!(season_code(january), "FW26");
    let september = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
    assert_eq!(season_code(september), "FW25");
}

#[test]
fn model_code_is_stable_and_upper_hex() {
    let code = model_code("Gucci Jackie");
    assert_eq!(code, model_code("Gucci Jackie"));
    assert_eq!(code.len(), 11);
    assert!(code.starts_with("SKU"));
    assert!(code[3..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
}
