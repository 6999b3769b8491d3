use crate::domain::model::{OutputFormat, Record, Table};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::path::Path;

/// Serializes one record with keys in table column order.
struct RowView<'a> {
    columns: &'a [String],
    record: &'a Record,
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in self.columns {
            map.serialize_entry(column, self.record.get(column).unwrap_or(&Value::Null))?;
        }
        map.end()
    }
}

struct TableView<'a>(&'a Table);

impl Serialize for TableView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let table = self.0;
        let mut seq = serializer.serialize_seq(Some(table.len()))?;
        for record in table.records() {
            seq.serialize_element(&RowView {
                columns: table.columns(),
                record,
            })?;
        }
        seq.end()
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Header plus one line per record. `Null` becomes an empty field.
pub fn encode_csv(table: &Table, delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(table.columns())?;
    for record in table.records() {
        writer.write_record(
            table
                .columns()
                .iter()
                .map(|column| cell_text(record.get(column).unwrap_or(&Value::Null))),
        )?;
    }

    writer.into_inner().map_err(|e| EtlError::IoError(e.into_error()))
}

/// Pretty-printed array of objects, one per record.
pub fn encode_json(table: &Table) -> Result<Vec<u8>> {
    let mut data = serde_json::to_vec_pretty(&TableView(table))?;
    data.push(b'\n');
    Ok(data)
}

fn delimiter_for(destination: &Path) -> u8 {
    match destination.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

pub fn encode(table: &Table, destination: &Path, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Csv => encode_csv(table, delimiter_for(destination)),
        OutputFormat::Json => encode_json(table),
    }
}

/// Writes `table` to `destination`. Any failure comes back as
/// [`EtlError::WriteFailure`].
pub fn write_table(
    storage: &dyn Storage,
    table: &Table,
    destination: &Path,
    format: OutputFormat,
) -> Result<()> {
    let write_failure = |reason: String| EtlError::WriteFailure {
        path: destination.display().to_string(),
        reason,
    };

    let data = encode(table, destination, format).map_err(|e| write_failure(e.to_string()))?;
    tracing::debug!(
        "Writing {} bytes of {} to {}",
        data.len(),
        format,
        destination.display()
    );
    storage
        .write_file(destination, &data)
        .map_err(|e| write_failure(e.to_string()))
}
