//! Cell-level model of the stock-list sheet, independent of the file format.

use std::collections::BTreeSet;

use luxlab_pricing::PricedProduct;

pub const SHEET_NAME: &str = "STOCK LIST B2B";

pub const FIXED_HEADERS: [&str; 16] = [
    "STG",
    "MACRO",
    "Gender",
    "Desc. Product Group",
    "Foto",
    "Sku",
    "Collezione",
    "Modello",
    "Parte",
    "Colore",
    "prezzo rtl",
    "prezzo proposto",
    "sconto rtl %",
    "sconto ACC %",
    "tot Q.TY",
    "SELEZIONE",
];

pub const NOTES_HEADER: &str = "Note";
pub const TOTALS_LABEL: &str = "TOTALI:";

/// Zero-based column indices of the fixed columns the renderer treats
/// specially.
pub mod col {
    pub const PHOTO: u16 = 4;
    pub const NAME: u16 = 7;
    pub const TOTALS_LABEL: u16 = 9;
    pub const RETAIL: u16 = 10;
    pub const PROPOSED: u16 = 11;
    pub const QUANTITY: u16 = 14;
    pub const FIRST_SIZE: u16 = 16;
}

/// Header occupies row 0; products start on row 1.
pub const HEADER_ROW: u32 = 0;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Money(f64),
    Count(u32),
    /// Anchor for the product image.
    Image,
}

/// One `SUM` formula on the totals row with its cached result.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalCell {
    pub col: u16,
    pub formula: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub row: u32,
    pub cells: Vec<TotalCell>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    sizes: Vec<String>,
}

impl SheetLayout {
    /// Layout whose size columns are the sorted union of every product's sizes.
    #[must_use]
    pub fn new(products: &[PricedProduct]) -> Self {
        let sizes: BTreeSet<&str> = products
            .iter()
            .flat_map(|p| p.record.sizes.iter().map(String::as_str))
            .collect();
        Self {
            sizes: sizes.into_iter().map(str::to_owned).collect(),
        }
    }

    #[must_use]
    pub fn sizes(&self) -> &[String] {
        &self.sizes
    }

    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        FIXED_HEADERS
            .iter()
            .map(|h| (*h).to_string())
            .chain(self.sizes.iter().cloned())
            .chain(std::iter::once(NOTES_HEADER.to_string()))
            .collect()
    }

    #[must_use]
    pub fn notes_col(&self) -> u16 {
        col::FIRST_SIZE + to_col(self.sizes.len())
    }

    #[must_use]
    pub fn last_col(&self) -> u16 {
        self.notes_col()
    }

    /// Cells for one product, in header order.
    #[must_use]
    pub fn row(&self, product: &PricedProduct) -> Vec<Cell> {
        let r = &product.record;
        let discount = format!("-{}%", product.pricing.discount_pct);

        let mut cells = vec![
            Cell::Text(r.sku.clone()),
            Cell::Text(r.brand.value().clone()),
            Cell::Text(r.gender.as_str().to_string()),
            Cell::Text(r.category.value().as_str().to_string()),
            Cell::Image,
            Cell::Text(r.model_code.clone()),
            Cell::Text(r.season.clone()),
            Cell::Text(r.name.value().clone()),
            Cell::Text(r.subcategory.clone()),
            Cell::Text(r.color.value().clone()),
            Cell::Money(product.pricing.retail),
            Cell::Money(product.pricing.proposed),
            Cell::Text(discount.clone()),
            Cell::Text(discount),
            Cell::Count(r.total_quantity()),
            Cell::Text(if r.selected { "✓" } else { "" }.to_string()),
        ];
        cells.extend(self.sizes.iter().map(|s| Cell::Count(r.quantity_for(s))));
        cells.push(Cell::Text(r.material.value().clone()));
        cells
    }

    /// Totals row, one blank row below the last product.
    #[must_use]
    pub fn totals(&self, products: &[PricedProduct]) -> Totals {
        let first = data_row(0) + 1;
        let last = data_row(products.len().saturating_sub(1)) + 1;
        let sum = |c: u16, value: f64| TotalCell {
            col: c,
            formula: format!("=SUM({name}{first}:{name}{last})", name = column_name(c)),
            value,
        };

        Totals {
            row: totals_row(products.len()),
            cells: vec![
                sum(col::RETAIL, products.iter().map(|p| p.pricing.retail).sum()),
                sum(col::PROPOSED, products.iter().map(|p| p.pricing.proposed).sum()),
                sum(
                    col::QUANTITY,
                    products
                        .iter()
                        .map(|p| f64::from(p.record.total_quantity()))
                        .sum(),
                ),
            ],
        }
    }
}

/// Zero-based sheet row of the product at `index`.
#[must_use]
pub fn data_row(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX - 2) + 1
}

/// Zero-based sheet row of the totals for `count` products.
#[must_use]
pub fn totals_row(count: usize) -> u32 {
    data_row(count) + 1
}

fn to_col(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Spreadsheet column letters for a zero-based index (0 → `A`, 27 → `AB`).
#[must_use]
pub fn column_name(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + u8::try_from(rem).unwrap_or(0));
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
