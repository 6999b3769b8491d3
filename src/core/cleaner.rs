//! Cleaning and transformation of raw sales tables.
//!
//! The steps run in a fixed order: numeric coercion, quantity fill, price-null
//! drop, `total_sales` derivation, category normalization, the revenue floor
//! filter and finally the email fill. Quantity is filled and rows without a
//! price are gone before `total_sales` is computed, so an unknown price never
//! turns into a zero total.

use crate::domain::model::{columns, Table};
use crate::domain::ports::Reporter;
use crate::utils::error::{EtlError, Result};
use serde_json::{Number, Value};

/// Rows must have `total_sales` strictly above this to survive cleaning.
pub const MIN_TOTAL_SALES: f64 = 100.0;

/// Placeholder written into missing `customer_email` cells.
pub const UNKNOWN_EMAIL: &str = "Unknown";

const STAGE: &str = "clean";

/// Parses text as an integer, then as a finite float.
pub fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(int) = text.parse::<i64>() {
        return Some(Number::from(int));
    }
    text.parse::<f64>()
        .ok()
        .filter(|float| float.is_finite())
        .and_then(Number::from_f64)
}

/// Best-effort numeric coercion of one cell. `None` is the missing marker.
pub fn coerce_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(number) => Some(number.clone()),
        Value::String(text) => parse_number(text),
        _ => None,
    }
}

/// Textual form of a category cell, trimmed and lowercased.
pub fn normalize_category(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    text.trim().to_lowercase()
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Cleans `table`, reporting conditions and returning an empty table when
/// there is nothing to clean.
pub fn clean(table: &Table, reporter: &dyn Reporter) -> Table {
    match try_clean(table, reporter) {
        Ok(cleaned) => cleaned,
        Err(e) => {
            e.report(reporter);
            Table::empty()
        }
    }
}

/// Like [`clean`] but returns the stage condition as an error. Per-step counts
/// still go to `reporter`.
pub fn try_clean(table: &Table, reporter: &dyn Reporter) -> Result<Table> {
    if table.is_empty() {
        return Err(EtlError::EmptyInput { stage: STAGE });
    }
    let missing = table.missing_columns(&columns::REQUIRED);
    if !missing.is_empty() {
        return Err(EtlError::MissingColumns {
            stage: STAGE,
            columns: missing,
        });
    }

    let mut cleaned = table.clone();

    reporter.info("Converting price and quantity to numeric", &[]);
    let mut invalid_prices = 0usize;
    let mut invalid_quantities = 0usize;
    for record in cleaned.records_mut() {
        for (column, counter) in [
            (columns::PRICE, &mut invalid_prices),
            (columns::QUANTITY, &mut invalid_quantities),
        ] {
            let coerced = record
                .get(column)
                .and_then(coerce_number)
                .map(Value::Number)
                .unwrap_or(Value::Null);
            if coerced.is_null() {
                *counter += 1;
            }
            record.set(column, coerced);
        }
    }
    if invalid_prices > 0 {
        reporter.warn(
            &format!("Identified {} rows with non-numeric price values", invalid_prices),
            &[("column", columns::PRICE.to_string()), ("missing", invalid_prices.to_string())],
        );
    }
    if invalid_quantities > 0 {
        reporter.warn(
            &format!(
                "Identified {} rows with non-numeric quantity values",
                invalid_quantities
            ),
            &[
                ("column", columns::QUANTITY.to_string()),
                ("missing", invalid_quantities.to_string()),
            ],
        );
    }

    for record in cleaned.records_mut() {
        if record.is_missing(columns::QUANTITY) {
            record.set(columns::QUANTITY, Value::from(0));
        }
    }

    let before_drop = cleaned.len();
    cleaned.retain(|record| !record.is_missing(columns::PRICE));
    let dropped = before_drop - cleaned.len();
    if dropped > 0 {
        reporter.warn(
            &format!("Dropped {} rows due to invalid price", dropped),
            &[("dropped", dropped.to_string())],
        );
    }

    reporter.info("Calculating total sales", &[]);
    cleaned.add_column(columns::TOTAL_SALES);
    for record in cleaned.records_mut() {
        let price = record.get(columns::PRICE).and_then(as_f64);
        let quantity = record.get(columns::QUANTITY).and_then(as_f64);
        let total = match (price, quantity) {
            (Some(price), Some(quantity)) => Number::from_f64(price * quantity).map(Value::Number),
            _ => None,
        };
        record.set(columns::TOTAL_SALES, total.unwrap_or(Value::Null));
    }

    reporter.info("Standardizing category column", &[]);
    for record in cleaned.records_mut() {
        let category = normalize_category(record.get(columns::CATEGORY).unwrap_or(&Value::Null));
        record.set(columns::CATEGORY, Value::String(category));
    }

    let before_filter = cleaned.len();
    cleaned.retain(|record| {
        record
            .get(columns::TOTAL_SALES)
            .and_then(as_f64)
            .is_some_and(|total| total > MIN_TOTAL_SALES)
    });
    let filtered = before_filter - cleaned.len();
    if filtered > 0 {
        reporter.info(
            &format!(
                "Filtered out {} sales with total sales not above {}",
                filtered, MIN_TOTAL_SALES
            ),
            &[("filtered", filtered.to_string())],
        );
    }

    let mut filled = 0usize;
    for record in cleaned.records_mut() {
        if record.is_missing(columns::CUSTOMER_EMAIL) {
            record.set(columns::CUSTOMER_EMAIL, Value::String(UNKNOWN_EMAIL.to_string()));
            filled += 1;
        }
    }
    if filled > 0 {
        reporter.info(
            &format!("Filled {} missing customer_email values with '{}'", filled, UNKNOWN_EMAIL),
            &[("filled", filled.to_string())],
        );
    }

    reporter.info(
        "Data cleaning and transformation complete",
        &[("rows", cleaned.len().to_string())],
    );
    Ok(cleaned)
}
