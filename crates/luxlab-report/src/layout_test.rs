use std::collections::BTreeMap;

use super::*;
use crate::test_support::product;

/// Evaluates `=SUM(<col><a>:<col><b>)` over a grid keyed by 1-based sheet row.
fn eval_sum(formula: &str, grid: &BTreeMap<u32, Vec<Cell>>) -> f64 {
    let range = formula
        .strip_prefix("=SUM(")
        .and_then(|r| r.strip_suffix(')'))
        .unwrap();
    let (start, end) = range.split_once(':').unwrap();
    let split = |cell: &str| {
        let digits = cell.find(|c: char| c.is_ascii_digit()).unwrap();
        (cell[..digits].to_string(), cell[digits..].parse::<u32>().unwrap())
    };
    let (col_a, row_a) = split(start);
    let (col_b, row_b) = split(end);
    assert_eq!(col_a, col_b);
    let col = (0..200u16).find(|c| column_name(*c) == col_a).unwrap();

    (row_a..=row_b)
        .filter_map(|r| grid.get(&r))
        .map(|cells| match &cells[usize::from(col)] {
            Cell::Money(v) => *v,
            Cell::Count(n) => f64::from(*n),
            other => panic!("non-numeric cell {other:?}"),
        })
        .sum()
}

#[test]
fn size_columns_are_the_sorted_union() {
    let products = [
        product(&[("S", 1), ("M", 2), ("L", 0)], 1000.0, 500.0),
        product(&[("UNI", 3)], 800.0, 400.0),
    ];
    let layout = SheetLayout::new(&products);
    assert_eq!(layout.sizes(), ["L", "M", "S", "UNI"]);

    let headers = layout.headers();
    assert_eq!(headers.len(), FIXED_HEADERS.len() + 4 + 1);
    assert_eq!(&headers[16..20], ["L", "M", "S", "UNI"]);
    assert_eq!(headers.last().map(String::as_str), Some(NOTES_HEADER));
    assert_eq!(layout.notes_col(), 20);
}

#[test]
fn sizes_a_product_lacks_get_zero() {
    let products = [
        product(&[("S", 1), ("M", 2), ("L", 4)], 1000.0, 500.0),
        product(&[("UNI", 3)], 800.0, 400.0),
    ];
    let layout = SheetLayout::new(&products);

    let first = layout.row(&products[0]);
    let second = layout.row(&products[1]);
    let sizes = |row: &[Cell]| row[16..20].to_vec();
    assert_eq!(
        sizes(&first),
        [Cell::Count(4), Cell::Count(2), Cell::Count(1), Cell::Count(0)]
    );
    assert_eq!(
        sizes(&second),
        [Cell::Count(0), Cell::Count(0), Cell::Count(0), Cell::Count(3)]
    );
    assert_eq!(first[usize::from(col::QUANTITY)], Cell::Count(7));
}

#[test]
fn row_has_one_cell_per_header() {
    let products = [product(&[("UNI", 1)], 1000.0, 500.0)];
    let layout = SheetLayout::new(&products);
    let row = layout.row(&products[0]);
    assert_eq!(row.len(), layout.headers().len());
    assert_eq!(row[usize::from(col::PHOTO)], Cell::Image);
    assert_eq!(row[usize::from(col::RETAIL)], Cell::Money(1000.0));
    assert_eq!(row[usize::from(col::PROPOSED)], Cell::Money(500.0));
    assert_eq!(row[12], Cell::Text("-50%".into()));
    assert_eq!(row[15], Cell::Text("✓".into()));
}

#[test]
fn totals_row_sits_one_blank_row_below_the_data() {
    let products: Vec<_> = (0..3).map(|_| product(&[("UNI", 1)], 100.0, 60.0)).collect();
    let totals = SheetLayout::new(&products).totals(&products);
    assert_eq!(totals.row, 5);
    assert_eq!(totals.cells[0].formula, "=SUM(K2:K4)");
    assert_eq!(totals.cells[1].formula, "=SUM(L2:L4)");
    assert_eq!(totals.cells[2].formula, "=SUM(O2:O4)");
}

#[test]
fn totals_formulas_sum_to_the_independent_totals() {
    for n in [1usize, 2, 7, 23] {
        let products: Vec<_> = (0..n)
            .map(|i| {
                let retail = 500.0 + 137.0 * i as f64;
                product(&[("S", 1), ("M", (i % 5) as u32)], retail, (retail * 0.55).round())
            })
            .collect();
        let layout = SheetLayout::new(&products);
        let grid: BTreeMap<u32, Vec<Cell>> = products
            .iter()
            .enumerate()
            .map(|(i, p)| (data_row(i) + 1, layout.row(p)))
            .collect();

        let totals = layout.totals(&products);
        let expected_proposed: f64 = products.iter().map(|p| p.pricing.proposed).sum();
        let proposed = &totals.cells[1];
        assert!((eval_sum(&proposed.formula, &grid) - expected_proposed).abs() < 1e-6);
        assert!((proposed.value - expected_proposed).abs() < 1e-6);

        let expected_qty: f64 = products.iter().map(|p| f64::from(p.record.total_quantity())).sum();
        assert!((eval_sum(&totals.cells[2].formula, &grid) - expected_qty).abs() < 1e-6);
    }
}

#[test]
fn column_names() {
    assert_eq!(column_name(0), "A");
    assert_eq!(column_name(10), "K");
    assert_eq!(column_name(25), "Z");
    assert_eq!(column_name(26), "AA");
    assert_eq!(column_name(27), "AB");
    assert_eq!(column_name(701), "ZZ");
    assert_eq!(column_name(702), "AAA");
}
