//! Renders priced products into the xlsx stock list.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use luxlab_core::PricingStrategy;
use luxlab_pricing::PricedProduct;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Formula, Image, Workbook, Worksheet};
use serde::Serialize;

use crate::error::ReportError;
use crate::layout::{self, col, Cell, SheetLayout, HEADER_ROW, SHEET_NAME, TOTALS_LABEL};

pub const INFO_SHEET: &str = "INFO";
pub const ANALYTICS_SHEET: &str = "ANALYTICS";

const MONEY_FORMAT: &str = "€#,##0";
const HEADER_FILL: u32 = 0xD5_D8_DC;
const ROW_FILL: u32 = 0xF8_F9_F9;
const TOTAL_GREEN: u32 = 0x27_AE_60;

const IMAGE_ROW_HEIGHT: f64 = 90.0;
const HEADER_ROW_HEIGHT: f64 = 20.0;
/// Marker written in the photo column when images are off for the caller.
const NO_IMAGE: &str = "-";
/// Marker written when images are on but this row has none.
const MISSING_IMAGE: &str = "IMG";

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub strategy: PricingStrategy,
    pub images: bool,
    pub analytics: bool,
    pub market_analysis: bool,
    pub generated_at: DateTime<Utc>,
}

impl ReportOptions {
    #[must_use]
    pub fn new(strategy: PricingStrategy) -> Self {
        Self {
            strategy,
            images: false,
            analytics: false,
            market_analysis: false,
            generated_at: Utc::now(),
        }
    }
}

/// Headline figures of one report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportSummary {
    pub products_count: usize,
    pub total_retail: f64,
    pub total_proposed: f64,
    /// Average saving against retail, in percent.
    pub margin_avg: f64,
}

impl ReportSummary {
    #[must_use]
    pub fn from_products(products: &[PricedProduct]) -> Self {
        let total_retail: f64 = products.iter().map(|p| p.pricing.retail).sum();
        let total_proposed: f64 = products.iter().map(|p| p.pricing.proposed).sum();
        let margin_avg = if total_retail > 0.0 {
            (total_retail - total_proposed) / total_retail * 100.0
        } else {
            0.0
        };
        Self {
            products_count: products.len(),
            total_retail,
            total_proposed,
            margin_avg,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub bytes: Vec<u8>,
    pub summary: ReportSummary,
}

pub struct ReportAssembler {
    options: ReportOptions,
}

struct Formats {
    header: Format,
    text: Format,
    money: Format,
    shaded_text: Format,
    shaded_money: Format,
    totals_label: Format,
    total_money: Format,
    total_proposed: Format,
    total_count: Format,
    bold: Format,
}

impl Formats {
    fn new() -> Self {
        let shaded = |f: Format| f.set_background_color(Color::RGB(ROW_FILL));
        let money = Format::new().set_num_format(MONEY_FORMAT);
        Self {
            header: Format::new()
                .set_bold()
                .set_font_size(10)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Thin),
            text: Format::new(),
            shaded_text: shaded(Format::new()),
            shaded_money: shaded(money.clone()),
            money: money.clone(),
            totals_label: Format::new().set_bold().set_font_size(12),
            total_money: money.clone().set_bold(),
            total_proposed: money.set_bold().set_font_color(Color::RGB(TOTAL_GREEN)),
            total_count: Format::new().set_bold(),
            bold: Format::new().set_bold(),
        }
    }
}

impl ReportAssembler {
    #[must_use]
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Builds the workbook. `images[i]` holds the processed JPEG for
    /// `products[i]`, if any.
    ///
    /// # Errors
    ///
    /// [`ReportError::Empty`] for an empty batch,
    /// [`ReportError::ImageCountMismatch`] when the slices disagree, and
    /// [`ReportError::Xlsx`] for any spreadsheet failure.
    pub fn build(
        &self,
        products: &[PricedProduct],
        images: &[Option<Vec<u8>>],
    ) -> Result<ReportArtifact, ReportError> {
        if products.is_empty() {
            return Err(ReportError::Empty);
        }
        if images.len() != products.len() {
            return Err(ReportError::ImageCountMismatch {
                products: products.len(),
                images: images.len(),
            });
        }

        let summary = ReportSummary::from_products(products);
        let formats = Formats::new();
        let layout = SheetLayout::new(products);

        let mut workbook = Workbook::new();
        workbook.push_worksheet(self.stock_sheet(&layout, products, images, &formats)?);
        workbook.push_worksheet(self.info_sheet(&summary, &formats)?);
        if self.options.analytics {
            workbook.push_worksheet(analytics_sheet(products, &summary, &formats)?);
        }

        let bytes = workbook.save_to_buffer()?;
        tracing::debug!(
            products = summary.products_count,
            sizes = layout.sizes().len(),
            bytes = bytes.len(),
            "workbook rendered"
        );
        Ok(ReportArtifact { bytes, summary })
    }

    fn stock_sheet(
        &self,
        layout: &SheetLayout,
        products: &[PricedProduct],
        images: &[Option<Vec<u8>>],
        formats: &Formats,
    ) -> Result<Worksheet, ReportError> {
        let mut sheet = Worksheet::new();
        sheet.set_name(SHEET_NAME)?;

        for (c, header) in layout.headers().iter().enumerate() {
            sheet.write_string_with_format(HEADER_ROW, to_col(c), header, &formats.header)?;
        }
        for (c, width) in column_widths(self.options.images).into_iter().enumerate() {
            sheet.set_column_width(to_col(c), width)?;
        }
        if self.options.images {
            sheet.set_row_height(HEADER_ROW, HEADER_ROW_HEIGHT)?;
        }

        for (i, (product, image)) in products.iter().zip(images).enumerate() {
            let row = layout::data_row(i);
            if self.options.images {
                sheet.set_row_height(row, IMAGE_ROW_HEIGHT)?;
            }
            let shaded = i % 2 == 0;
            let (text_fmt, money_fmt) = if shaded {
                (&formats.shaded_text, &formats.shaded_money)
            } else {
                (&formats.text, &formats.money)
            };

            for (c, cell) in layout.row(product).into_iter().enumerate() {
                let c = to_col(c);
                match cell {
                    Cell::Text(s) => {
                        sheet.write_string_with_format(row, c, &s, text_fmt)?;
                    }
                    Cell::Money(v) => {
                        sheet.write_number_with_format(row, c, v, money_fmt)?;
                    }
                    Cell::Count(n) => {
                        sheet.write_number_with_format(row, c, n, text_fmt)?;
                    }
                    Cell::Image => self.write_image(&mut sheet, row, c, image.as_deref(), text_fmt)?,
                }
            }
        }

        let totals = layout.totals(products);
        sheet.write_string_with_format(totals.row, col::TOTALS_LABEL, TOTALS_LABEL, &formats.totals_label)?;
        for cell in &totals.cells {
            let fmt = match cell.col {
                col::PROPOSED => &formats.total_proposed,
                col::QUANTITY => &formats.total_count,
                _ => &formats.total_money,
            };
            let formula = Formula::new(&cell.formula).set_result(cell.value.to_string());
            sheet.write_formula_with_format(totals.row, cell.col, formula, fmt)?;
        }

        sheet.set_freeze_panes(HEADER_ROW + 1, 0)?;
        let last_data_row = layout::data_row(products.len() - 1);
        sheet.autofilter(HEADER_ROW, 0, last_data_row, layout.last_col())?;
        Ok(sheet)
    }

    fn write_image(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        c: u16,
        bytes: Option<&[u8]>,
        fmt: &Format,
    ) -> Result<(), ReportError> {
        if !self.options.images {
            sheet.write_string_with_format(row, c, NO_IMAGE, fmt)?;
            return Ok(());
        }
        let Some(bytes) = bytes else {
            sheet.write_string_with_format(row, c, MISSING_IMAGE, fmt)?;
            return Ok(());
        };
        match Image::new_from_buffer(bytes) {
            Ok(image) => {
                sheet.insert_image_fit_to_cell(row, c, &image, true)?;
            }
            Err(e) => {
                tracing::warn!(row, error = %e, "image rejected by workbook, writing marker");
                sheet.write_string_with_format(row, c, MISSING_IMAGE, fmt)?;
            }
        }
        Ok(())
    }

    fn info_sheet(&self, summary: &ReportSummary, formats: &Formats) -> Result<Worksheet, ReportError> {
        let mut sheet = Worksheet::new();
        sheet.set_name(INFO_SHEET)?;
        sheet.set_column_width(0, 24)?;
        sheet.set_column_width(1, 28)?;

        let market = if self.options.market_analysis {
            "ATTIVA"
        } else {
            "NON ATTIVA"
        };
        let rows: [(&str, String); 12] = [
            ("LUXLAB B2B STOCK LIST", String::new()),
            ("", String::new()),
            (
                "Data Generazione:",
                self.options.generated_at.format("%d/%m/%Y %H:%M").to_string(),
            ),
            ("Strategia Applicata:", self.options.strategy.as_str().to_string()),
            ("Prodotti Totali:", summary.products_count.to_string()),
            ("Valore Retail:", euros(summary.total_retail)),
            ("Valore Proposto:", euros(summary.total_proposed)),
            ("Risparmio Medio:", format!("{:.1}%", summary.margin_avg)),
            ("", String::new()),
            ("Analisi di Mercato:", market.to_string()),
            ("", String::new()),
            ("CONFIDENZIALE", "Documento riservato B2B".to_string()),
        ];
        for (r, (label, value)) in (0u32..).zip(rows) {
            if !label.is_empty() {
                sheet.write_string_with_format(r, 0, label, &formats.bold)?;
            }
            if !value.is_empty() {
                sheet.write_string(r, 1, value)?;
            }
        }
        Ok(sheet)
    }
}

/// Brand frequency and headline financials. Only for entitled callers.
fn analytics_sheet(
    products: &[PricedProduct],
    summary: &ReportSummary,
    formats: &Formats,
) -> Result<Worksheet, ReportError> {
    let mut sheet = Worksheet::new();
    sheet.set_name(ANALYTICS_SHEET)?;
    sheet.set_column_width(0, 26)?;
    sheet.set_column_width(1, 16)?;

    sheet.write_string_with_format(0, 0, "Brand", &formats.header)?;
    sheet.write_string_with_format(0, 1, "Prodotti", &formats.header)?;
    let mut row = 1u32;
    for (brand, count) in brand_frequency(products) {
        sheet.write_string(row, 0, brand)?;
        sheet.write_number(row, 1, u32::try_from(count).unwrap_or(u32::MAX))?;
        row += 1;
    }

    let metrics = FinancialMetrics::from_summary(summary);
    row += 1;
    sheet.write_string_with_format(row, 0, "Metrica", &formats.header)?;
    sheet.write_string_with_format(row, 1, "Valore", &formats.header)?;
    row += 1;
    for (label, value, fmt) in [
        ("Valore Retail Totale", metrics.total_retail, &formats.money),
        ("Valore Proposto Totale", metrics.total_proposed, &formats.money),
        ("Margine Atteso", metrics.expected_margin, &formats.money),
    ] {
        sheet.write_string_with_format(row, 0, label, &formats.bold)?;
        sheet.write_number_with_format(row, 1, value, fmt)?;
        row += 1;
    }
    let ratio = Format::new().set_num_format("0.00");
    sheet.write_string_with_format(row, 0, "ROI", &formats.bold)?;
    sheet.write_number_with_format(row, 1, metrics.roi, &ratio)?;
    Ok(sheet)
}

/// Brands ordered by descending count, then name.
#[must_use]
pub fn brand_frequency(products: &[PricedProduct]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for p in products {
        *counts.entry(p.record.brand.value().as_str()).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(brand, n)| (brand.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinancialMetrics {
    pub total_retail: f64,
    pub total_proposed: f64,
    /// Retail value left on the table for the buyer.
    pub expected_margin: f64,
    /// `expected_margin / total_proposed`; 0 when nothing is proposed.
    pub roi: f64,
}

impl FinancialMetrics {
    #[must_use]
    pub fn from_summary(summary: &ReportSummary) -> Self {
        let expected_margin = summary.total_retail - summary.total_proposed;
        let roi = if summary.total_proposed > 0.0 {
            expected_margin / summary.total_proposed
        } else {
            0.0
        };
        Self {
            total_retail: summary.total_retail,
            total_proposed: summary.total_proposed,
            expected_margin,
            roi,
        }
    }
}

/// `LUXLAB_B2B_<STRATEGY>_<YYYYmmdd_HHMMSS>_<job prefix>.xlsx`
#[must_use]
pub fn artifact_filename(strategy: PricingStrategy, at: DateTime<Utc>, job_id: &str) -> String {
    let prefix: String = job_id.chars().filter(char::is_ascii_alphanumeric).take(8).collect();
    format!(
        "LUXLAB_B2B_{}_{}_{prefix}.xlsx",
        strategy.as_str(),
        at.format("%Y%m%d_%H%M%S")
    )
}

/// `€12,345` with thousands separators and no decimals.
fn euros(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && rounded != "0" { "-" } else { "" };
    format!("{sign}€{grouped}")
}

fn column_widths(images: bool) -> [f64; 16] {
    [
        12.0,
        15.0,
        8.0,
        20.0,
        if images { 12.0 } else { 8.0 },
        15.0,
        12.0,
        30.0,
        15.0,
        12.0,
        12.0,
        12.0,
        10.0,
        10.0,
        8.0,
        10.0,
    ]
}

fn to_col(c: usize) -> u16 {
    u16::try_from(c).unwrap_or(u16::MAX)
}

#[cfg(test)]
#[path = "workbook_test.rs"]
mod tests;
