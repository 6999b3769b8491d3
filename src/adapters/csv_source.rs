use crate::core::cleaner::parse_number;
use crate::domain::model::{Record, Table};
use crate::domain::ports::{Reporter, Storage};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Field values read as missing, in addition to the empty field.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Reads delimited text with a header row into a [`Table`].
pub struct CsvLoader<'a> {
    storage: &'a dyn Storage,
    delimiter: u8,
}

impl<'a> CsvLoader<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self {
            storage,
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Loads `path`, reporting any failure and returning an empty table in
    /// its place.
    pub fn load(&self, path: &Path, reporter: &dyn Reporter) -> Table {
        match self.try_load(path) {
            Ok(table) => {
                reporter.info(
                    &format!("Loaded {} rows from {}", table.len(), path.display()),
                    &[
                        ("rows", table.len().to_string()),
                        ("columns", table.columns().len().to_string()),
                    ],
                );
                table
            }
            Err(e) => {
                e.report(reporter);
                Table::empty()
            }
        }
    }

    pub fn try_load(&self, path: &Path) -> Result<Table> {
        let display = path.display().to_string();
        let bytes = match self.storage.read_file(path) {
            Ok(bytes) => bytes,
            Err(EtlError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EtlError::SourceNotFound { path: display });
            }
            Err(e) => {
                return Err(EtlError::LoadFailure {
                    path: display,
                    reason: e.to_string(),
                });
            }
        };

        parse_table(&bytes, self.delimiter).map_err(|e| match e {
            EtlError::LoadFailure { reason, .. } => EtlError::LoadFailure {
                path: display.clone(),
                reason,
            },
            other => EtlError::LoadFailure {
                path: display.clone(),
                reason: other.to_string(),
            },
        })
    }
}

/// Parses delimited text. Short rows are padded with `Null`; rows longer than
/// the header are rejected.
pub fn parse_table(bytes: &[u8], delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(EtlError::LoadFailure {
            path: String::new(),
            reason: "No columns to parse from file".to_string(),
        });
    }

    let columns = dedupe_headers(headers.iter());
    let mut table = Table::new(columns.clone());

    for row in reader.records() {
        let row = row?;
        if row.len() > columns.len() {
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            return Err(EtlError::LoadFailure {
                path: String::new(),
                reason: format!(
                    "Expected {} fields in line {}, saw {}",
                    columns.len(),
                    line,
                    row.len()
                ),
            });
        }

        let mut record = Record::default();
        for (index, column) in columns.iter().enumerate() {
            let value = row.get(index).map(infer_value).unwrap_or(Value::Null);
            record.data.insert(column.clone(), value);
        }
        table.push(record);
    }

    Ok(table)
}

/// Type inference for one raw field: missing, integer, float or text.
pub fn infer_value(raw: &str) -> Value {
    if raw.is_empty() || NA_TOKENS.contains(&raw) {
        return Value::Null;
    }
    if raw.trim() == raw {
        if let Some(number) = parse_number(raw) {
            return Value::Number(number);
        }
    }
    Value::String(raw.to_string())
}

fn dedupe_headers<'h>(headers: impl Iterator<Item = &'h str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();

    for header in headers {
        let mut name = header.to_string();
        let mut suffix = 1;
        while !seen.insert(name.clone()) {
            name = format!("{}.{}", header, suffix);
            suffix += 1;
        }
        columns.push(name);
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockStorage;
    use crate::utils::logger::MemoryReporter;
    use serde_json::json;

    #[test]
    fn test_load_infers_cell_types() {
        let storage = MockStorage::new().with_file(
            "sales.csv",
            b"price,quantity,category,customer_email,note\n10,5, Electronics ,,hello\n2.5,NA,Food,a@b.com, 7\n",
        );
        let reporter = MemoryReporter::new();

        let table = CsvLoader::new(&storage).load(Path::new("sales.csv"), &reporter);

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.columns(),
            &["price", "quantity", "category", "customer_email", "note"]
        );
        let first = &table.records()[0];
        assert_eq!(first.get("price"), Some(&json!(10)));
        assert_eq!(first.get("category"), Some(&json!(" Electronics ")));
        assert!(first.is_missing("customer_email"));

        let second = &table.records()[1];
        assert_eq!(second.get("price"), Some(&json!(2.5)));
        assert!(second.is_missing("quantity"));
        assert_eq!(second.get("note"), Some(&json!(" 7")));

        let events = reporter.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].context_value("rows"), Some("2"));
    }

    #[test]
    fn test_missing_source_reports_not_found() {
        let storage = MockStorage::new();
        let reporter = MemoryReporter::new();

        let table = CsvLoader::new(&storage).load(Path::new("absent.csv"), &reporter);

        assert!(table.is_empty());
        assert_eq!(reporter.conditions("source_not_found").len(), 1);
        assert!(matches!(
            CsvLoader::new(&storage).try_load(Path::new("absent.csv")),
            Err(EtlError::SourceNotFound { .. })
        ));
    }

    #[test]
    fn test_zero_byte_file_is_load_failure() {
        let storage = MockStorage::new().with_file("empty.csv", b"");
        let reporter = MemoryReporter::new();

        let table = CsvLoader::new(&storage).load(Path::new("empty.csv"), &reporter);

        assert!(table.is_empty());
        assert_eq!(reporter.conditions("load_failure").len(), 1);
    }

    #[test]
    fn test_header_only_file_loads_zero_rows() {
        let storage =
            MockStorage::new().with_file("header.csv", b"price,quantity,category,customer_email\n");

        let table = CsvLoader::new(&storage)
            .try_load(Path::new("header.csv"))
            .unwrap();

        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 4);
    }

    #[test]
    fn test_long_row_is_load_failure() {
        let storage = MockStorage::new().with_file("bad.csv", b"a,b\n1,2\n1,2,3\n");

        let err = CsvLoader::new(&storage)
            .try_load(Path::new("bad.csv"))
            .unwrap_err();

        match err {
            EtlError::LoadFailure { path, reason } => {
                assert_eq!(path, "bad.csv");
                assert!(reason.contains("Expected 2 fields"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_short_row_is_padded() {
        let table = parse_table(b"a,b,c\n1\n", b',').unwrap();
        let record = &table.records()[0];
        assert_eq!(record.get("a"), Some(&json!(1)));
        assert!(record.is_missing("b"));
        assert!(record.is_missing("c"));
    }

    #[test]
    fn test_invalid_utf8_is_load_failure() {
        let storage = MockStorage::new().with_file("latin1.csv", b"name\n\xe9t\xe9\n");
        let result = CsvLoader::new(&storage).try_load(Path::new("latin1.csv"));
        assert!(matches!(result, Err(EtlError::LoadFailure { .. })));
    }

    #[test]
    fn test_custom_delimiter_and_duplicate_headers() {
        let table = parse_table(b"price;price;category\n1;2;x\n", b';').unwrap();
        assert_eq!(table.columns(), &["price", "price.1", "category"]);
        assert_eq!(table.records()[0].get("price.1"), Some(&json!(2)));
    }

    #[test]
    fn test_infer_value() {
        assert_eq!(infer_value(""), Value::Null);
        assert_eq!(infer_value("null"), Value::Null);
        assert_eq!(infer_value("42"), json!(42));
        assert_eq!(infer_value("-1.5"), json!(-1.5));
        assert_eq!(infer_value("abc"), json!("abc"));
        assert_eq!(infer_value("inf"), json!("inf"));
    }
}
