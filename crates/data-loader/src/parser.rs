//! Parser for catalog CSV files.
//!
//! Expected layout (MovieLens `movies.csv`):
//!
//! ```text
//! movieId,title,genres
//! 1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy
//! ```
//!
//! The parser only turns rows into [`RawRecord`]s. Empty cells become `None`
//! and are dealt with by the cleaning pass in `catalog.rs`.

use crate::error::{DataLoadError, Result};
use crate::types::{ColumnNames, ItemId, RawRecord};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Parse a catalog file from disk
pub fn parse_records(path: &Path, columns: &ColumnNames) -> Result<Vec<RawRecord>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let file = std::fs::File::open(path)?;
    let records = parse_reader(file, columns)?;
    debug!("Parsed {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse catalog CSV from any reader.
///
/// Split out from [`parse_records`] so tests can feed in-memory strings.
pub fn parse_reader<R: Read>(reader: R, columns: &ColumnNames) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        // Short rows are kept; missing trailing cells read as absent
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let layout = ColumnLayout::resolve(&headers, columns)?;

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        // Header is line 1; fall back to counting if the reader has no position
        let line = row
            .position()
            .map(|p| p.line())
            .unwrap_or(idx as u64 + 2);

        records.push(RawRecord {
            line,
            id: parse_id(cell(&row, layout.id), line)?,
            title: cell(&row, layout.title).map(str::to_string),
            tags: cell(&row, layout.tags).map(str::to_string),
        });
    }

    Ok(records)
}

/// Column positions of the required fields within a header row
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    id: usize,
    title: usize,
    tags: usize,
}

impl ColumnLayout {
    /// Find the required columns, reporting every missing one at once
    fn resolve(headers: &StringRecord, columns: &ColumnNames) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let id = find(&columns.id);
        let title = find(&columns.title);
        let tags = find(&columns.tags);

        match (id, title, tags) {
            (Some(id), Some(title), Some(tags)) => Ok(Self { id, title, tags }),
            _ => {
                let missing = [(&columns.id, id), (&columns.title, title), (&columns.tags, tags)]
                    .into_iter()
                    .filter(|(_, found)| found.is_none())
                    .map(|(name, _)| name.clone())
                    .collect();
                Err(DataLoadError::SchemaError { missing })
            }
        }
    }
}

/// Read a cell, treating absent and blank cells alike
fn cell(row: &StringRecord, index: usize) -> Option<&str> {
    row.get(index).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_id(raw: Option<&str>, line: u64) -> Result<Option<ItemId>> {
    raw.map(|s| {
        s.parse::<ItemId>().map_err(|e| DataLoadError::ParseError {
            line,
            reason: format!("Invalid id '{}': {}", s, e),
        })
    })
    .transpose()
}
