use crate::domain::model::{columns, AggregateTable, CategoryRevenue, Table};
use crate::domain::ports::Reporter;
use crate::utils::error::{EtlError, Result};
use std::collections::BTreeMap;

const STAGE: &str = "summarize";

/// Sums `total_sales` per category. Expects a cleaned table; categories that
/// differ only in case or whitespace are not merged here.
pub fn summarize(table: &Table, reporter: &dyn Reporter) -> AggregateTable {
    match try_summarize(table, reporter) {
        Ok(summary) => summary,
        Err(e) => {
            e.report(reporter);
            AggregateTable::default()
        }
    }
}

pub fn try_summarize(table: &Table, reporter: &dyn Reporter) -> Result<AggregateTable> {
    if table.is_empty() {
        return Err(EtlError::EmptyInput { stage: STAGE });
    }
    let missing = table.missing_columns(&[columns::CATEGORY, columns::TOTAL_SALES]);
    if !missing.is_empty() {
        return Err(EtlError::MissingColumns {
            stage: STAGE,
            columns: missing,
        });
    }

    reporter.info("Summarizing sales by category", &[]);
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for record in table.records() {
        let category = match record.get(columns::CATEGORY) {
            Some(serde_json::Value::String(category)) => category.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let entry = totals.entry(category).or_insert(0.0);
        if let Some(total) = record.get(columns::TOTAL_SALES).and_then(|v| v.as_f64()) {
            *entry += total;
        }
    }

    let summary = AggregateTable {
        rows: totals
            .into_iter()
            .map(|(category, total_revenue)| CategoryRevenue {
                category,
                total_revenue,
            })
            .collect(),
    };
    reporter.info(
        "Sales summarization complete",
        &[("categories", summary.len().to_string())],
    );
    Ok(summary)
}
