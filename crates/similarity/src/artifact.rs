//! Persistence of the similarity model.
//!
//! A model directory holds two files:
//!
//! - `similarity_matrix.bin`: bincode-encoded scores plus row keys. This is
//!   the only file the server needs.
//! - `vocabulary.json`: encoder settings and vocabulary, for inspection and
//!   for re-encoding the catalog the same way.
//!
//! Both are written to a temporary sibling and renamed into place.

use crate::error::{ModelError, Result};
use crate::features::VocabularyState;
use crate::matrix::{RowIndex, RowKey, SimilarityMatrix};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const MATRIX_FILE: &str = "similarity_matrix.bin";
pub const VOCABULARY_FILE: &str = "vocabulary.json";

/// Bumped whenever the layout of [`MatrixArtifact`] changes
const FORMAT_VERSION: u32 = 1;

/// On-disk layout of the matrix file (write side, borrows the matrix)
#[derive(Serialize)]
struct MatrixArtifactRef<'a> {
    version: u32,
    row_keys: &'a [RowKey],
    data: &'a [f32],
}

/// On-disk layout of the matrix file (read side)
#[derive(Deserialize)]
struct MatrixArtifact {
    version: u32,
    row_keys: Vec<RowKey>,
    data: Vec<f32>,
}

/// Where the two artifact files were written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub matrix: PathBuf,
    pub vocabulary: PathBuf,
}

/// Reads and writes model artifacts in one directory
#[derive(Debug, Clone)]
pub struct ModelStore {
    model_dir: PathBuf,
}

impl ModelStore {
    pub fn new<P: AsRef<Path>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn matrix_path(&self) -> PathBuf {
        self.model_dir.join(MATRIX_FILE)
    }

    pub fn vocabulary_path(&self) -> PathBuf {
        self.model_dir.join(VOCABULARY_FILE)
    }

    /// Whether a matrix artifact is present
    pub fn exists(&self) -> bool {
        self.matrix_path().is_file()
    }

    /// Write both artifacts, creating the model directory if needed
    #[instrument(skip_all, fields(model_dir = %self.model_dir.display()))]
    pub fn save(&self, matrix: &SimilarityMatrix, vocabulary: &VocabularyState) -> Result<ArtifactPaths> {
        if !self.model_dir.exists() {
            std::fs::create_dir_all(&self.model_dir)?;
            info!("Created {} directory", self.model_dir.display());
        }

        let paths = ArtifactPaths {
            matrix: self.matrix_path(),
            vocabulary: self.vocabulary_path(),
        };

        let artifact = MatrixArtifactRef {
            version: FORMAT_VERSION,
            row_keys: matrix.row_index().keys(),
            data: matrix.as_slice(),
        };
        write_atomic(&paths.matrix, |writer| {
            bincode::serialize_into(writer, &artifact).map_err(ModelError::from)
        })?;
        info!("Saved similarity matrix to: {}", paths.matrix.display());

        write_atomic(&paths.vocabulary, |writer| {
            serde_json::to_writer_pretty(writer, vocabulary).map_err(ModelError::from)
        })?;
        info!("Saved vocabulary to: {}", paths.vocabulary.display());

        Ok(paths)
    }

    /// Load the similarity matrix.
    ///
    /// Fails with [`ModelError::ArtifactNotFound`] when the build step has not
    /// been run.
    #[instrument(skip_all, fields(model_dir = %self.model_dir.display()))]
    pub fn load_matrix(&self) -> Result<SimilarityMatrix> {
        let path = self.matrix_path();
        let file = open_artifact(&path)?;

        info!("Loading model from: {}", path.display());
        let artifact: MatrixArtifact = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| ModelError::Corrupt(format!("{}: {}", path.display(), e)))?;

        if artifact.version != FORMAT_VERSION {
            return Err(ModelError::Corrupt(format!(
                "{}: format version {} is not supported (expected {})",
                path.display(),
                artifact.version,
                FORMAT_VERSION
            )));
        }

        let rows = RowIndex::from_keys(artifact.row_keys)?;
        let matrix = SimilarityMatrix::from_parts(rows, artifact.data)?;
        info!("Model loaded: {} x {}", matrix.n(), matrix.n());
        Ok(matrix)
    }

    /// Load the encoder settings and vocabulary
    pub fn load_vocabulary(&self) -> Result<VocabularyState> {
        let file = open_artifact(&self.vocabulary_path())?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

fn open_artifact(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(ModelError::ArtifactNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(File::open(path)?)
}

/// Write to `<path>.tmp`, then rename over `path`
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let temp_path = path.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&temp_path)?);
    write(&mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);
    std::fs::rename(&temp_path, path)?;
    Ok(())
}
