use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// Fixed column names of the sales schema.
pub mod columns {
    pub const PRICE: &str = "price";
    pub const QUANTITY: &str = "quantity";
    pub const CATEGORY: &str = "category";
    pub const CUSTOMER_EMAIL: &str = "customer_email";
    pub const TOTAL_SALES: &str = "total_sales";
    pub const TOTAL_REVENUE: &str = "total_revenue";

    /// Columns the cleaner refuses to run without.
    pub const REQUIRED: [&str; 4] = [PRICE, QUANTITY, CATEGORY, CUSTOMER_EMAIL];
}

/// One row. `Value::Null` marks a missing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }

    /// True when the column is absent or holds the missing marker.
    pub fn is_missing(&self, column: &str) -> bool {
        self.data.get(column).map_or(true, Value::is_null)
    }

    pub fn set(&mut self, column: &str, value: Value) {
        self.data.insert(column.to_string(), value);
    }
}

/// Ordered rows sharing one ordered column set.
///
/// Every record holds a value for every column; gaps are filled with
/// `Value::Null` on insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(columns: Vec<String>, records: Vec<Record>) -> Self {
        let mut table = Self::new(columns);
        for record in records {
            table.push(record);
        }
        table
    }

    pub fn push(&mut self, mut record: Record) {
        for column in &self.columns {
            record.data.entry(column.clone()).or_insert(Value::Null);
        }
        self.records.push(record);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Names from `required` that the table does not carry.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Appends `column` if it is new, filling every record with `Null`.
    pub fn add_column(&mut self, column: &str) {
        if self.has_column(column) {
            return;
        }
        self.columns.push(column.to_string());
        for record in &mut self.records {
            record.data.insert(column.to_string(), Value::Null);
        }
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.records.iter_mut()
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Record) -> bool,
    {
        self.records.retain(keep);
    }
}

/// Revenue summed over one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub total_revenue: f64,
}

/// Per-category revenue, sorted by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateTable {
    pub rows: Vec<CategoryRevenue>,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn revenue_for(&self, category: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.category == category)
            .map(|row| row.total_revenue)
    }

    /// Tabular view with columns `category, total_revenue`, so the regular
    /// sinks can write it.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(vec![
            columns::CATEGORY.to_string(),
            columns::TOTAL_REVENUE.to_string(),
        ]);
        for row in &self.rows {
            let mut record = Record::default();
            record.set(columns::CATEGORY, Value::String(row.category.clone()));
            record.set(
                columns::TOTAL_REVENUE,
                serde_json::Number::from_f64(row.total_revenue)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
            );
            table.push(record);
        }
        table
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    /// File extensions accepted for this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            OutputFormat::Csv => &["csv", "tsv", "txt"],
            OutputFormat::Json => &["json"],
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Where and how one output table is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputTarget {
    pub filename: String,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub cleaned: Table,
    pub summary: Option<AggregateTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedWrite {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub written: Vec<PathBuf>,
    pub failed: Vec<FailedWrite>,
}
