//! Tabular item input (pasted or loaded from a file).
//!
//! One `weight<sep>value` pair per line, where the separator is a comma,
//! a tab or any run of whitespace. Blank lines and `#` comments are skipped;
//! rows that do not parse to two positive numbers are dropped.

use thiserror::Error;

use knaplab_core::domain::{from_columns, Item};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("no valid weight,value rows found")]
    NoItems,
}

/// Parse `text` into exactly `n_items` items.
///
/// Extra rows are cut; missing rows are filled by cycling through the parsed
/// ones. Ids are reassigned 1..=n. Pass `None` to keep every parsed row.
pub fn parse_items(text: &str, n_items: Option<usize>) -> Result<Vec<Item>, ImportError> {
    let rows: Vec<(f64, f64)> = text.lines().filter_map(parse_row).collect();
    if rows.is_empty() {
        return Err(ImportError::NoItems);
    }
    let n = n_items.unwrap_or(rows.len());
    let (weights, values): (Vec<f64>, Vec<f64>) = rows.iter().copied().cycle().take(n).unzip();
    Ok(from_columns(&weights, &values))
}

fn parse_row(line: &str) -> Option<(f64, f64)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut fields = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty());
    let weight = positive(fields.next()?)?;
    let value = positive(fields.next()?)?;
    Some((weight, value))
}

fn positive(field: &str) -> Option<f64> {
    let x: f64 = field.parse().ok()?;
    (x.is_finite() && x > 0.0).then_some(x)
}
