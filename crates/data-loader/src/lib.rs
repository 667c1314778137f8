//! # Data Loader Crate
//!
//! This crate handles loading and cleaning the movie catalog.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (CatalogItem, Catalog, RawRecord)
//! - **parser**: Parse the catalog CSV into raw records
//! - **catalog**: Apply the cleaning policy and build the Catalog
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{Catalog, CatalogOptions};
//! use std::path::Path;
//!
//! let catalog = Catalog::load(Path::new("data/movies.csv"), &CatalogOptions::default())?;
//! let first = catalog.get(0).unwrap();
//!
//! println!("{} has tags {:?}", first.title, first.tags);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod catalog;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use catalog::split_tags;
pub use types::{
    // Type aliases and constants
    ItemId,
    DEFAULT_TAG_DELIMITER,
    NO_TAGS,
    UNKNOWN_TITLE,
    // Core types
    Catalog,
    CatalogItem,
    CatalogOptions,
    ColumnNames,
    LoadReport,
    RawRecord,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "movieId,title,genres").unwrap();
        writeln!(file, "1,Toy Story (1995),Animation|Comedy").unwrap();
        writeln!(file, ",Cars (2006),Animation|Comedy").unwrap();
        writeln!(file, "3,Saw (2004),").unwrap();
        writeln!(file, "4,Toy Story (1995),Horror").unwrap();
        file.flush().unwrap();

        let catalog = Catalog::load(file.path(), &CatalogOptions::default()).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(1).unwrap().id, 1);
        assert_eq!(catalog.get(2).unwrap().tags, vec![NO_TAGS.to_string()]);

        let report = catalog.report();
        assert_eq!(report.raw_records, 4);
        assert_eq!(report.filled_ids, 1);
        assert_eq!(report.filled_tags, 1);
        assert_eq!(report.duplicates_removed, 1);
    }

    #[test]
    fn test_load_row_without_tags_cell() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "movieId,title,genres").unwrap();
        writeln!(file, "1,Toy Story (1995),Animation|Comedy").unwrap();
        writeln!(file, "3,Saw (2004)").unwrap();
        file.flush().unwrap();

        let catalog = Catalog::load(file.path(), &CatalogOptions::default()).unwrap();

        assert_eq!(catalog.len(), 2);
        let saw = catalog.get(1).unwrap();
        assert_eq!(saw.id, 3);
        assert_eq!(saw.tags, vec![NO_TAGS.to_string()]);
        assert_eq!(catalog.report().filled_tags, 1);
    }

    #[test]
    fn test_load_reports_schema_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,name").unwrap();
        writeln!(file, "1,Toy Story").unwrap();
        file.flush().unwrap();

        let err = Catalog::load(file.path(), &CatalogOptions::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::SchemaError { .. }));
    }

    #[test]
    fn test_tags_joined() {
        let item = CatalogItem {
            id: 1,
            title: "Toy Story (1995)".to_string(),
            tags: vec!["Animation".to_string(), "Comedy".to_string()],
        };
        assert_eq!(item.tags_joined('|'), "Animation|Comedy");
    }
}
