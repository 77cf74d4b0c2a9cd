use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Columns every corpus file must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["name", "title", "text"];

/// One post from the source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "name")]
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "text", default)]
    pub body: String,
}

impl Record {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { identifier: identifier.into(), title: title.into(), body: body.into() }
    }
}

/// Read every record of a `name,title,text` CSV file in row order.
///
/// Extra columns are ignored; column order does not matter.
pub fn load_records(path: &Path) -> TrainingResult<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(|e| TrainingError::corpus_load(path, e))?;

    let headers = reader.headers().map_err(|e| TrainingError::corpus_load(path, e))?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(TrainingError::corpus_load(path, format!("missing required column `{column}`")));
        }
    }

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<Record>().enumerate() {
        // Row numbers are 1-based and skip the header line.
        let record = row.map_err(|e| TrainingError::corpus_load(path, format!("row {}: {e}", idx + 2)))?;
        records.push(record);
    }

    tracing::info!(path = %path.display(), records = records.len(), "loaded corpus");
    Ok(records)
}

/// Write records back out in the `name,title,text` shape.
pub fn write_records(path: &Path, records: &[Record]) -> TrainingResult<()> {
    write_records_as(path, records, "text")
}

/// Write records with the body stored under `body_column` (`comment` for
/// comment exports).
pub fn write_records_as(path: &Path, records: &[Record], body_column: &str) -> TrainingResult<()> {
    let to_err = |e: csv::Error| TrainingError::Serialization(format!("{}: {e}", path.display()));

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path).map_err(to_err)?;
    writer.write_record(["name", "title", body_column]).map_err(to_err)?;
    for record in records {
        writer
            .write_record([record.identifier.as_str(), record.title.as_str(), record.body.as_str()])
            .map_err(to_err)?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), records = records.len(), "wrote records");
    Ok(())
}
