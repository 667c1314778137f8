//! Catalog building and cleaning logic.
//!
//! Turns parsed [`RawRecord`]s into a [`Catalog`]. The cleaning policy runs
//! in a fixed order:
//!
//! 1. Forward-fill missing ids from the previous record
//! 2. Replace missing titles with [`UNKNOWN_TITLE`]
//! 3. Replace missing tags with [`NO_TAGS`]
//! 4. Drop records whose title was already seen (first one wins)
//! 5. Reindex to dense 0-based positions
//!
//! Rust concepts you'll learn:
//! - HashSet for O(1) duplicate detection
//! - Consuming an iterator (`into_iter`) to move records instead of cloning

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument, warn};

impl Catalog {
    /// Load and clean a catalog file.
    ///
    /// This is the main entry point for loading data.
    #[instrument(skip(path, options), fields(path = %path.display()))]
    pub fn load(path: &Path, options: &CatalogOptions) -> Result<Self> {
        info!("Loading catalog from {}", path.display());
        let records = parser::parse_records(path, &options.columns)?;
        Self::from_records(records, options)
    }

    /// Apply the cleaning policy to already-parsed records
    pub fn from_records(records: Vec<RawRecord>, options: &CatalogOptions) -> Result<Self> {
        if records.is_empty() {
            return Err(DataLoadError::EmptyCatalog);
        }

        let mut report = LoadReport {
            raw_records: records.len(),
            ..LoadReport::default()
        };

        let mut seen_titles: HashSet<String> = HashSet::with_capacity(records.len());
        let mut items = Vec::with_capacity(records.len());
        let mut last_id: Option<ItemId> = None;

        for record in records {
            // 1. Forward-fill ids
            let id = match (record.id, last_id) {
                (Some(id), _) => id,
                (None, Some(previous)) => {
                    report.filled_ids += 1;
                    previous
                }
                (None, None) => {
                    return Err(DataLoadError::MissingInitialId { line: record.line });
                }
            };
            last_id = Some(id);

            // 2. Placeholder title
            let title = record.title.unwrap_or_else(|| {
                report.filled_titles += 1;
                UNKNOWN_TITLE.to_string()
            });

            // 3. Sentinel tags
            let mut tags = record
                .tags
                .as_deref()
                .map(|raw| split_tags(raw, options.tag_delimiter))
                .unwrap_or_default();
            if tags.is_empty() {
                report.filled_tags += 1;
                tags.push(NO_TAGS.to_string());
            }

            // 4. Deduplicate by exact title
            if !seen_titles.insert(title.clone()) {
                report.duplicates_removed += 1;
                continue;
            }

            items.push(CatalogItem { id, title, tags });
        }

        // 5. Positions in `items` are already dense
        report.items = items.len();
        log_report(&report);

        Ok(Catalog { items, report })
    }

    /// Build a catalog from already-structured items.
    ///
    /// Items go through the same cleaning policy as file input, so duplicate
    /// titles are dropped and empty tag lists get the sentinel.
    pub fn from_items(items: Vec<CatalogItem>) -> Result<Self> {
        let options = CatalogOptions::default();
        let records = items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| RawRecord {
                line: idx as u64 + 2,
                id: Some(item.id),
                tags: Some(item.tags_joined(options.tag_delimiter)),
                title: Some(item.title).filter(|t| !t.trim().is_empty()),
            })
            .collect();
        Self::from_records(records, &options)
    }
}

/// Split a delimited tag field, dropping blank pieces
pub fn split_tags(raw: &str, delimiter: char) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn log_report(report: &LoadReport) {
    if report.filled_ids > 0 {
        warn!("{} records were missing ids, filled from the previous record", report.filled_ids);
    }
    if report.filled_titles > 0 {
        warn!("{} records had no title, filled with '{}'", report.filled_titles, UNKNOWN_TITLE);
    }
    if report.filled_tags > 0 {
        warn!("{} records had no tags, filled with '{}'", report.filled_tags, NO_TAGS);
    }
    if report.duplicates_removed > 0 {
        info!("Removed {} duplicate titles", report.duplicates_removed);
    }
    info!("Cleaned catalog: {} items from {} records", report.items, report.raw_records);
}
