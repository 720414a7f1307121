//! Row-level helpers shared by the CSV repositories.

use anyhow::Result;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

use super::connection::write_atomically;

/// Read every data row of a CSV file. A missing file reads as empty.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

/// Replace the whole file with `header` followed by `rows`
pub fn write_rows<T: Serialize>(path: &Path, header: &str, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(header.trim_end().split(','))?;
    for row in rows {
        writer.serialize(row)?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV buffer: {}", e.error()))?;
    write_atomically(path, &buffer)
}
