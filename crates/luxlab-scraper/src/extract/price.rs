//! Currency-aware price parsing. All results are in EUR.

use std::sync::LazyLock;

use regex::Regex;

const USD_TO_EUR: f64 = 0.92;
const GBP_TO_EUR: f64 = 1.16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Currency {
    Eur,
    Usd,
    Gbp,
}

impl Currency {
    fn to_eur(self, amount: f64) -> f64 {
        match self {
            Currency::Eur => amount,
            Currency::Usd => amount * USD_TO_EUR,
            Currency::Gbp => amount * GBP_TO_EUR,
        }
    }
}

const AMOUNT: &str = r"(\d[\d.,'\u{a0}\u{202f}]*\d|\d)";

static PRICE_PATTERNS: LazyLock<Vec<(Regex, Currency)>> = LazyLock::new(|| {
    [
        (format!(r"€\s*{AMOUNT}"), Currency::Eur),
        (format!(r"{AMOUNT}\s*€"), Currency::Eur),
        (format!(r"(?i)\bEUR\s*{AMOUNT}"), Currency::Eur),
        (format!(r"(?i){AMOUNT}\s*EUR\b"), Currency::Eur),
        (format!(r"\$\s*{AMOUNT}"), Currency::Usd),
        (format!(r"(?i)\bUSD\s*{AMOUNT}"), Currency::Usd),
        (format!(r"£\s*{AMOUNT}"), Currency::Gbp),
        (format!(r"(?i)\bGBP\s*{AMOUNT}"), Currency::Gbp),
    ]
    .into_iter()
    .map(|(pattern, currency)| (Regex::new(&pattern).expect("valid price regex"), currency))
    .collect()
});

/// Finds the first currency-marked amount in `text` and converts it to EUR.
///
/// Returns `None` when no pattern matches or the amount is not positive.
pub fn parse_price(text: &str) -> Option<f64> {
    PRICE_PATTERNS.iter().find_map(|(re, currency)| {
        let caps = re.captures(text)?;
        let amount = parse_amount(caps.get(1)?.as_str())?;
        let eur = round_cents(currency.to_eur(amount));
        (eur > 0.0).then_some(eur)
    })
}

/// Parses a bare machine-readable amount such as a `content="1890.00"`
/// attribute. Treated as EUR.
pub fn parse_plain_amount(raw: &str) -> Option<f64> {
    let value = parse_amount(raw.trim())?;
    (value > 0.0).then_some(round_cents(value))
}

/// Normalises European and Anglo-Saxon digit grouping.
///
/// `1.234,56` and `1,234.56` both give 1234.56; a lone separator followed by
/// exactly three digits is a thousands separator (`1.250` is 1250).
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'')
        .collect();

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(d), Some(c)) => {
            let (decimal, thousands) = if d > c { ('.', ',') } else { (',', '.') };
            cleaned
                .replace(thousands, "")
                .replace(decimal, ".")
        }
        (Some(_), None) => single_separator(&cleaned, '.'),
        (None, Some(_)) => single_separator(&cleaned, ','),
        (None, None) => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn single_separator(s: &str, sep: char) -> String {
    let parts: Vec<&str> = s.split(sep).collect();
    let is_decimal = parts.len() == 2 && parts[1].len() != 3;
    if is_decimal {
        format!("{}.{}", parts[0], parts[1])
    } else {
        parts.concat()
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
