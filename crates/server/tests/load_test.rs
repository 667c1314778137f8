//! Startup loading: catalog file plus a model directory on disk.

use std::io::Write;

use data_loader::{Catalog, CatalogOptions};
use server::{RecommendError, RecommendationService};
use similarity::{build_model, ModelError, ModelStore, TagEncoder};

const MOVIES_CSV: &str = "\
movieId,title,genres
1,Toy Story (1995),Animation|Comedy
2,Cars (2006),Animation|Comedy
3,Saw (2004),Horror
4,Tom and Huck (1995)
";

fn write_catalog(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn train(catalog_path: &std::path::Path, model_dir: &std::path::Path) {
    let catalog = Catalog::load(catalog_path, &CatalogOptions::default()).unwrap();
    let model = build_model(&catalog, TagEncoder::new()).unwrap();
    ModelStore::new(model_dir).save(&model.matrix, &model.vocabulary).unwrap();
}

#[test]
fn test_load_trained_model() {
    let file = write_catalog(MOVIES_CSV);
    let dir = tempfile::tempdir().unwrap();
    train(file.path(), dir.path());

    let service =
        RecommendationService::load(file.path(), &CatalogOptions::default(), dir.path()).unwrap();

    assert_eq!(service.len(), 4);
    let recommendations = service.recommend("Toy Story", 1).unwrap();
    assert_eq!(recommendations[0].title, "Cars (2006)");
    assert_eq!(recommendations[0].score, 1.0);
}

#[test]
fn test_load_without_model_fails() {
    let file = write_catalog(MOVIES_CSV);
    let dir = tempfile::tempdir().unwrap();

    let err = RecommendationService::load(file.path(), &CatalogOptions::default(), dir.path())
        .unwrap_err();
    assert!(matches!(
        err,
        RecommendError::Model(ModelError::ArtifactNotFound { .. })
    ));
}

#[test]
fn test_load_with_stale_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let old = write_catalog(MOVIES_CSV);
    train(old.path(), dir.path());

    // A catalog edited after training
    let new = write_catalog(&format!("{MOVIES_CSV}5,Heat (1995),Action|Crime\n"));
    let err = RecommendationService::load(new.path(), &CatalogOptions::default(), dir.path())
        .unwrap_err();
    assert!(matches!(err, RecommendError::ArtifactMismatch { title } if title == "Heat (1995)"));
}

#[test]
fn test_load_missing_catalog_fails() {
    let dir = tempfile::tempdir().unwrap();
    let err = RecommendationService::load(
        &dir.path().join("movies.csv"),
        &CatalogOptions::default(),
        dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, RecommendError::Data(_)));
}
