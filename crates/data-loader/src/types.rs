//! Core domain types for the movie catalog.
//!
//! This module defines the fundamental data structures used throughout the system.
//! Key Rust concepts demonstrated here:
//! - Type aliases for domain clarity (ItemId)
//! - `Option<T>` for fields that may be missing in the raw input
//! - Private fields + getters so the Catalog cannot be mutated after loading

use serde::{Deserialize, Serialize};

// =============================================================================
// Type Aliases and Constants
// =============================================================================

/// Identifier of a catalog item (the `movieId` column in MovieLens)
pub type ItemId = u32;

/// Title used when a record has no title
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Tag used when a record has no tags
pub const NO_TAGS: &str = "(no tags listed)";

/// Default separator between tags in the tags column ("Animation|Comedy")
pub const DEFAULT_TAG_DELIMITER: char = '|';

// =============================================================================
// Raw Input
// =============================================================================

/// One row of the input file before cleaning.
///
/// Every field is optional because the cleaning policy decides what to do
/// with missing values, not the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line number in the source file (header is line 1)
    pub line: u64,
    pub id: Option<ItemId>,
    pub title: Option<String>,
    pub tags: Option<String>,
}

/// Names of the columns the loader needs.
///
/// Defaults to the MovieLens `movies.csv` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    pub id: String,
    pub title: String,
    pub tags: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            id: "movieId".to_string(),
            title: "title".to_string(),
            tags: "genres".to_string(),
        }
    }
}

/// Options controlling how a catalog file is read and cleaned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogOptions {
    pub columns: ColumnNames,
    pub tag_delimiter: char,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            tag_delimiter: DEFAULT_TAG_DELIMITER,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A single movie after cleaning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    /// Tags in their original order, never empty
    pub tags: Vec<String>,
}

impl CatalogItem {
    /// Tags joined back into the delimited form they were read from
    pub fn tags_joined(&self, delimiter: char) -> String {
        let mut buf = [0u8; 4];
        self.tags.join(delimiter.encode_utf8(&mut buf))
    }
}

/// Summary of what the cleaning pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub raw_records: usize,
    pub filled_ids: usize,
    pub filled_titles: usize,
    pub filled_tags: usize,
    pub duplicates_removed: usize,
    pub items: usize,
}

/// The cleaned, immutable movie table.
///
/// Items are stored in a `Vec`, so the position of an item is a dense
/// 0-based index. Titles are unique.
///
/// Rust concept: there are no `&mut self` methods. Once a Catalog exists
/// it can only be read, which is what makes sharing it through `Arc`
/// across request handlers safe without a lock.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub(crate) items: Vec<CatalogItem>,
    pub(crate) report: LoadReport,
}

impl Catalog {
    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get an item by position
    pub fn get(&self, position: usize) -> Option<&CatalogItem> {
        self.items.get(position)
    }

    /// All items in catalog order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter()
    }

    /// Position of the item with exactly this title (case-sensitive)
    pub fn position_of_title(&self, title: &str) -> Option<usize> {
        self.items.iter().position(|item| item.title == title)
    }

    /// What the cleaning pass did while building this catalog
    pub fn report(&self) -> &LoadReport {
        &self.report
    }
}
